//! Per-recipe output routing.
//!
//! Every output slot of every recipe owns a side (relative to the build's
//! own rotation) it is pushed toward. Routing only matters when a recipe has
//! more than one output of a kind; single-output recipes dump to all sides
//! and report `None` from [`OutputRouter::direction`].
//!
//! Tables are allocated from the catalog when the build is created and
//! survive recipe switches.

use crate::block::BlockType;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// A cardinal side, counter-clockwise from +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Right = 0,
    Up = 1,
    Left = 2,
    Down = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Right, Direction::Up, Direction::Left, Direction::Down];

    /// Any integer maps onto a side by its low two bits.
    pub fn from_bits(bits: i32) -> Self {
        Self::ALL[(bits & 0x3) as usize]
    }

    /// Decode the `-1..=3` convention used by config files: negative means
    /// omnidirectional.
    pub fn from_signed(value: i32) -> Option<Self> {
        if value < 0 { None } else { Some(Self::from_bits(value)) }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Turn this side by `rotation` quarter turns.
    pub fn rotated(self, rotation: Direction) -> Self {
        Self::from_bits(i32::from(self.index()) + i32::from(rotation.index()))
    }
}

/// Encode an optional side in the `-1..=3` convention.
pub fn signed_direction(dir: Option<Direction>) -> i32 {
    dir.map_or(-1, |d| i32::from(d.index()))
}

// ---------------------------------------------------------------------------
// Output kinds and packed routes
// ---------------------------------------------------------------------------

/// Which output table a slot index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    Item = 0,
    Liquid = 1,
}

/// One routing entry packed into a single scalar for the config channel:
/// `kind << 10 | slot << 2 | direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRoute {
    pub kind: OutputKind,
    pub slot: u8,
    pub direction: Direction,
}

impl PackedRoute {
    pub fn new(kind: OutputKind, slot: u8, direction: Direction) -> Self {
        Self { kind, slot, direction }
    }

    pub fn pack(self) -> u32 {
        ((self.kind as u32) << 10) | (u32::from(self.slot) << 2) | u32::from(self.direction.index())
    }

    /// Returns `None` for the two unused kind codes.
    pub fn unpack(packed: u32) -> Option<Self> {
        let kind = match (packed >> 10) & 0x3 {
            0 => OutputKind::Item,
            1 => OutputKind::Liquid,
            _ => return None,
        };
        Some(Self {
            kind,
            slot: ((packed >> 2) & 0xFF) as u8,
            direction: Direction::from_bits((packed & 0x3) as i32),
        })
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Per-recipe, per-slot output sides for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRouter {
    items: Vec<Vec<Direction>>,
    liquids: Vec<Vec<Direction>>,
}

fn default_direction(defaults: &[Option<Direction>], slot: usize) -> Direction {
    defaults.get(slot).copied().flatten().unwrap_or(Direction::Right)
}

fn reshape(
    tables: &mut Vec<Vec<Direction>>,
    lens: impl ExactSizeIterator<Item = usize>,
    defaults: &[Option<Direction>],
) -> bool {
    let mut changed = false;
    tables.resize_with(lens.len(), Vec::new);
    for (table, len) in tables.iter_mut().zip(lens) {
        if table.len() != len {
            *table = (0..len).map(|slot| default_direction(defaults, slot)).collect();
            changed = true;
        }
    }
    changed
}

impl OutputRouter {
    /// Tables shaped for every recipe of `block`, filled with the block's
    /// default directions.
    pub fn for_block(block: &BlockType) -> Self {
        let mut router = Self::default();
        router.ensure_routing(block);
        router
    }

    /// Reallocate any table whose shape no longer matches the catalog.
    /// Matching tables are kept as they are. Returns whether anything was
    /// reallocated.
    pub fn ensure_routing(&mut self, block: &BlockType) -> bool {
        let recipes = block.recipes();
        let config = block.config();
        let items = reshape(
            &mut self.items,
            recipes.iter().map(|r| r.item_outputs.len()),
            &config.item_output_directions,
        );
        let liquids = reshape(
            &mut self.liquids,
            recipes.iter().map(|r| r.liquid_outputs.len()),
            &config.liquid_output_directions,
        );
        items || liquids
    }

    fn tables(&self, kind: OutputKind) -> &[Vec<Direction>] {
        match kind {
            OutputKind::Item => &self.items,
            OutputKind::Liquid => &self.liquids,
        }
    }

    fn tables_mut(&mut self, kind: OutputKind) -> &mut [Vec<Direction>] {
        match kind {
            OutputKind::Item => &mut self.items,
            OutputKind::Liquid => &mut self.liquids,
        }
    }

    /// Raw table for one recipe; empty when the recipe is out of range.
    pub fn table(&self, recipe: usize, kind: OutputKind) -> &[Direction] {
        self.tables(kind).get(recipe).map_or(&[], Vec::as_slice)
    }

    pub fn recipe_count(&self) -> usize {
        self.items.len()
    }

    /// Side an output slot is pushed toward, or `None` when it dumps to all
    /// sides (one or zero slots of this kind, or indices out of range).
    pub fn direction(&self, recipe: usize, kind: OutputKind, slot: usize) -> Option<Direction> {
        let table = self.table(recipe, kind);
        if table.len() <= 1 {
            return None;
        }
        table.get(slot).copied()
    }

    /// Assign a side to one slot. Out-of-range recipe or slot indices are
    /// ignored; returns whether an entry was written.
    pub fn set_route(&mut self, recipe: usize, kind: OutputKind, slot: usize, direction: Direction) -> bool {
        match self.tables_mut(kind).get_mut(recipe).and_then(|t| t.get_mut(slot)) {
            Some(entry) => {
                *entry = direction;
                true
            }
            None => false,
        }
    }
}
