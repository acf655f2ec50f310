//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, benchmarks and the demo
//! (via the `test-utils` feature).

use std::collections::BTreeMap;

use crate::fixed::Fixed64;
use crate::id::{ItemTypeId, LiquidTypeId};
use crate::proximity::Proximity;
use crate::recipe::RecipeDef;
use crate::routing::Direction;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Substances
// ===========================================================================

pub fn iron() -> ItemTypeId {
    ItemTypeId(0)
}
pub fn copper() -> ItemTypeId {
    ItemTypeId(1)
}
pub fn gear() -> ItemTypeId {
    ItemTypeId(2)
}
pub fn silicon() -> ItemTypeId {
    ItemTypeId(3)
}

pub fn water() -> LiquidTypeId {
    LiquidTypeId(0)
}
pub fn steam() -> LiquidTypeId {
    LiquidTypeId(1)
}
pub fn slag() -> LiquidTypeId {
    LiquidTypeId(2)
}

// ===========================================================================
// Recipe helpers
// ===========================================================================

/// An item-only recipe taking `ticks` per cycle.
pub fn make_recipe(inputs: Vec<(ItemTypeId, u32)>, outputs: Vec<(ItemTypeId, u32)>, ticks: u32) -> RecipeDef {
    let mut b = RecipeDef::builder("test").craft_time_ticks(ticks);
    for (item, amount) in inputs {
        b = b.item_in(item, amount);
    }
    for (item, amount) in outputs {
        b = b.item_out(item, amount);
    }
    b.build()
}

// ===========================================================================
// Neighbors
// ===========================================================================

/// A scripted neighbor that records what it receives.
#[derive(Debug, Clone)]
pub struct TestNeighbor {
    pub side: Direction,
    /// Items this neighbor takes; `None` takes everything.
    pub accepts: Option<Vec<ItemTypeId>>,
    /// Units left before it refuses items; `None` is unlimited.
    pub item_room: Option<u32>,
    pub received: BTreeMap<ItemTypeId, u32>,
    /// `None` means the neighbor has no liquid buffer at all.
    pub liquid_capacity: Option<Fixed64>,
    pub liquids: BTreeMap<LiquidTypeId, Fixed64>,
}

impl TestNeighbor {
    /// Takes any item without limit and has a 100-unit liquid buffer.
    pub fn sink(side: Direction) -> Self {
        Self {
            side,
            accepts: None,
            item_room: None,
            received: BTreeMap::new(),
            liquid_capacity: Some(fixed(100.0)),
            liquids: BTreeMap::new(),
        }
    }

    /// Takes nothing.
    pub fn wall(side: Direction) -> Self {
        Self {
            side,
            accepts: Some(Vec::new()),
            item_room: Some(0),
            received: BTreeMap::new(),
            liquid_capacity: None,
            liquids: BTreeMap::new(),
        }
    }

    pub fn accepting(mut self, items: Vec<ItemTypeId>) -> Self {
        self.accepts = Some(items);
        self
    }

    pub fn with_item_room(mut self, room: u32) -> Self {
        self.item_room = Some(room);
        self
    }

    pub fn with_liquid(mut self, liquid: LiquidTypeId, amount: Fixed64) -> Self {
        self.liquids.insert(liquid, amount);
        self
    }

    pub fn received(&self, item: ItemTypeId) -> u32 {
        self.received.get(&item).copied().unwrap_or(0)
    }

    pub fn total_received(&self) -> u32 {
        self.received.values().sum()
    }

    pub fn liquid(&self, liquid: LiquidTypeId) -> Fixed64 {
        self.liquids.get(&liquid).copied().unwrap_or(Fixed64::ZERO)
    }
}

/// A neighbor list backed by [`TestNeighbor`]s.
#[derive(Debug, Clone, Default)]
pub struct TestProximity {
    pub neighbors: Vec<TestNeighbor>,
}

impl TestProximity {
    pub fn new(neighbors: Vec<TestNeighbor>) -> Self {
        Self { neighbors }
    }
}

impl Proximity for TestProximity {
    fn len(&self) -> usize {
        self.neighbors.len()
    }

    fn side(&self, index: usize) -> Direction {
        self.neighbors[index].side
    }

    fn accept_item(&self, index: usize, item: ItemTypeId) -> bool {
        let n = &self.neighbors[index];
        let wanted = n.accepts.as_ref().is_none_or(|list| list.contains(&item));
        let room = n.item_room.is_none_or(|room| room > 0);
        wanted && room
    }

    fn handle_item(&mut self, index: usize, item: ItemTypeId) {
        let n = &mut self.neighbors[index];
        *n.received.entry(item).or_insert(0) += 1;
        if let Some(room) = &mut n.item_room {
            *room = room.saturating_sub(1);
        }
    }

    fn liquid_fraction(&self, index: usize, liquid: LiquidTypeId) -> Option<Fixed64> {
        let n = &self.neighbors[index];
        let capacity = n.liquid_capacity?;
        Some(n.liquid(liquid) / capacity)
    }

    fn liquid_space(&self, index: usize, liquid: LiquidTypeId) -> Fixed64 {
        let n = &self.neighbors[index];
        n.liquid_capacity
            .map_or(Fixed64::ZERO, |cap| (cap - n.liquid(liquid)).max(Fixed64::ZERO))
    }

    fn accept_liquid(&self, index: usize, _liquid: LiquidTypeId) -> bool {
        self.neighbors[index].liquid_capacity.is_some()
    }

    fn handle_liquid(&mut self, index: usize, liquid: LiquidTypeId, amount: Fixed64) {
        *self.neighbors[index].liquids.entry(liquid).or_insert(Fixed64::ZERO) += amount;
    }
}
