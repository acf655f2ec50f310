//! Pushing outputs into neighbors.
//!
//! Two paths move product out of a build. [`offload`] places each freshly
//! crafted item, falling back to the build's own buffer so nothing is lost.
//! [`dump_outputs`] runs every tick to drain buffered items (on a timer) and
//! liquids (every tick).
//!
//! Every scan walks the neighbor list round-robin from the build's cursor
//! and advances the cursor once per neighbor visited, so repeated calls
//! spread output across neighbors.

use crate::block::BlockType;
use crate::fixed::Fixed64;
use crate::id::{ItemTypeId, LiquidTypeId};
use crate::proximity::Proximity;
use crate::routing::{Direction, OutputKind};
use crate::state::BuildState;
use crate::storage::Storage;

/// Liquid amounts at or below this are treated as empty (about 0.0001).
pub const LIQUID_EPSILON: Fixed64 = Fixed64::from_bits(429_497);
/// Tolerance for a liquid buffer counting as full (about 0.001).
pub const LIQUID_FULL_EPSILON: Fixed64 = Fixed64::from_bits(4_294_967);
/// Divides the fill-fraction gap when equalizing liquid with a neighbor.
pub const LIQUID_DUMP_SCALING: Fixed64 = Fixed64::from_bits(2 << 32);

/// Where an offloaded unit ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Neighbor(usize),
    Kept,
}

/// Whether neighbor `index` sits on the side `direction` points to once the
/// build's `rotation` is applied. `None` matches every side.
fn faces(proximity: &impl Proximity, index: usize, direction: Option<Direction>, rotation: Direction) -> bool {
    direction.is_none_or(|d| proximity.side(index) == d.rotated(rotation))
}

/// First neighbor on the routed side that takes `item`, handing it over.
fn hand_off(
    state: &mut BuildState,
    proximity: &mut impl Proximity,
    item: ItemTypeId,
    direction: Option<Direction>,
    rotation: Direction,
) -> Option<usize> {
    let len = proximity.len();
    let start = state.dump_cursor;
    for i in 0..len {
        state.increment_dump(len);
        let index = (i + start) % len;
        if !faces(proximity, index, direction, rotation) {
            continue;
        }
        if proximity.accept_item(index, item) && proximity.can_dump(index, item) {
            proximity.handle_item(index, item);
            return Some(index);
        }
    }
    None
}

/// Place one freshly produced `item`. A routed direction restricts the
/// candidates to the neighbor on that side; if nobody takes it, the unit
/// goes into the build's own buffer.
pub fn offload(
    state: &mut BuildState,
    storage: &mut impl Storage,
    proximity: &mut impl Proximity,
    item: ItemTypeId,
    direction: Option<Direction>,
    rotation: Direction,
) -> Delivery {
    match hand_off(state, proximity, item, direction, rotation) {
        Some(index) => Delivery::Neighbor(index),
        None => {
            storage.add_item(item, 1);
            Delivery::Kept
        }
    }
}

/// Move one buffered `item` to a neighbor. Returns false, touching nothing,
/// when the buffer lacks it or there are no neighbors.
pub fn dump_item(
    state: &mut BuildState,
    storage: &mut impl Storage,
    proximity: &mut impl Proximity,
    item: ItemTypeId,
    direction: Option<Direction>,
    rotation: Direction,
) -> bool {
    if proximity.is_empty() || storage.total_items() == 0 || !storage.has_item(item) {
        return false;
    }
    if hand_off(state, proximity, item, direction, rotation).is_some() {
        storage.remove_item(item, 1);
        return true;
    }
    false
}

/// Equalize `liquid` toward every neighbor on the routed side holding a
/// lower fill fraction. Each transfer moves half the fraction gap, limited
/// by the neighbor's free space. Returns the total moved.
pub fn dump_liquid(
    state: &mut BuildState,
    storage: &mut impl Storage,
    proximity: &mut impl Proximity,
    liquid: LiquidTypeId,
    capacity: Fixed64,
    direction: Option<Direction>,
    rotation: Direction,
) -> Fixed64 {
    let mut moved = Fixed64::ZERO;
    if storage.liquid(liquid) <= LIQUID_EPSILON || capacity <= Fixed64::ZERO {
        return moved;
    }

    let len = proximity.len();
    let start = state.dump_cursor;
    for i in 0..len {
        state.increment_dump(len);
        let index = (i + start) % len;
        if !faces(proximity, index, direction, rotation) {
            continue;
        }
        let Some(other) = proximity.liquid_fraction(index, liquid) else {
            continue;
        };
        let stored = storage.liquid(liquid);
        let fract = stored / capacity;
        if other >= fract {
            continue;
        }
        let flow = (fract.saturating_sub(other).saturating_mul(capacity) / LIQUID_DUMP_SCALING)
            .min(proximity.liquid_space(index, liquid))
            .min(stored);
        if flow > Fixed64::ZERO && proximity.accept_liquid(index, liquid) {
            proximity.handle_liquid(index, liquid, flow);
            moved += storage.remove_liquid(liquid, flow);
        }
    }
    moved
}

/// Per-tick drain of buffered output.
///
/// Items move on a timer of `dump_time / time_scale` ticks. When it fires,
/// an active recipe with item outputs dumps exactly those, along their
/// routes; otherwise every item any recipe can produce is dumped to all
/// sides, which clears stock left over from a previous recipe.
///
/// Liquids move every tick with the same split: the active recipe's own
/// liquid outputs along their routes, else the whole liquid union.
///
/// Returns the number of item units that left the buffer.
pub fn dump_outputs(
    state: &mut BuildState,
    block: &BlockType,
    storage: &mut impl Storage,
    proximity: &mut impl Proximity,
    delta: Fixed64,
    time_scale: Fixed64,
    rotation: Direction,
) -> u32 {
    let index = state.recipe_index;
    let recipe = block.recipe(index);
    let mut dumped = 0;

    let time_scale = if time_scale > Fixed64::ZERO { time_scale } else { Fixed64::ONE };
    state.dump_timer = state.dump_timer.saturating_add(delta);
    if state.dump_timer >= block.config().dump_time.saturating_div(time_scale) {
        state.dump_timer = Fixed64::ZERO;
        if !recipe.item_outputs.is_empty() {
            for (slot, stack) in recipe.item_outputs.iter().enumerate() {
                let direction = state.routing.direction(index, OutputKind::Item, slot);
                dumped += u32::from(dump_item(state, storage, proximity, stack.item, direction, rotation));
            }
        } else {
            for &item in &block.capabilities().all_output_items {
                dumped += u32::from(dump_item(state, storage, proximity, item, None, rotation));
            }
        }
    }

    let capacity = block.liquid_capacity();
    if !recipe.liquid_outputs.is_empty() {
        for (slot, stack) in recipe.liquid_outputs.iter().enumerate() {
            let direction = state.routing.direction(index, OutputKind::Liquid, slot);
            dump_liquid(state, storage, proximity, stack.liquid, capacity, direction, rotation);
        }
        return dumped;
    }
    for &liquid in &block.capabilities().all_output_liquids {
        dump_liquid(state, storage, proximity, liquid, capacity, None, rotation);
    }
    dumped
}
