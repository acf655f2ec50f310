//! The neighbor acceptance protocol.
//!
//! A build sees its adjacent builds as an indexed list. Each call is a
//! synchronous hand-off: the neighbor either takes the unit in the same call
//! or it does not.

use crate::fixed::Fixed64;
use crate::id::{ItemTypeId, LiquidTypeId};
use crate::routing::Direction;

/// Adjacent builds of one crafter, in a stable order.
pub trait Proximity {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Absolute side of the crafter that neighbor `index` touches.
    fn side(&self, index: usize) -> Direction;

    fn accept_item(&self, index: usize, item: ItemTypeId) -> bool;

    fn handle_item(&mut self, index: usize, item: ItemTypeId);

    /// Guard against handing the same neighbor a unit it already received
    /// this tick. Always passes unless the host tracks deliveries.
    fn can_dump(&self, _index: usize, _item: ItemTypeId) -> bool {
        true
    }

    /// Fill fraction of `liquid` in neighbor `index`, or `None` when the
    /// neighbor holds no liquids at all.
    fn liquid_fraction(&self, index: usize, liquid: LiquidTypeId) -> Option<Fixed64>;

    /// Room left for `liquid` in neighbor `index`.
    fn liquid_space(&self, index: usize, liquid: LiquidTypeId) -> Fixed64;

    fn accept_liquid(&self, index: usize, liquid: LiquidTypeId) -> bool;

    fn handle_liquid(&mut self, index: usize, liquid: LiquidTypeId, amount: Fixed64);
}

/// No neighbors. Everything offloaded stays in the build's own buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Isolated;

impl Proximity for Isolated {
    fn len(&self) -> usize {
        0
    }

    fn side(&self, _index: usize) -> Direction {
        Direction::Right
    }

    fn accept_item(&self, _index: usize, _item: ItemTypeId) -> bool {
        false
    }

    fn handle_item(&mut self, _index: usize, _item: ItemTypeId) {}

    fn liquid_fraction(&self, _index: usize, _liquid: LiquidTypeId) -> Option<Fixed64> {
        None
    }

    fn liquid_space(&self, _index: usize, _liquid: LiquidTypeId) -> Fixed64 {
        Fixed64::ZERO
    }

    fn accept_liquid(&self, _index: usize, _liquid: LiquidTypeId) -> bool {
        false
    }

    fn handle_liquid(&mut self, _index: usize, _liquid: LiquidTypeId, _amount: Fixed64) {}
}
