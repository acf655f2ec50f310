use crate::block::BlockType;
use crate::fixed::Fixed64;
use crate::routing::OutputRouter;

/// Mutable state of one placed crafter.
///
/// `recipe_index` is always a valid index into the owning block's catalog;
/// it only changes through [`BuildState::set_recipe_index`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuildState {
    pub(crate) recipe_index: usize,
    /// Fraction of the current cycle done. Reaches 1 transiently.
    pub progress: Fixed64,
    /// Smoothed activity in `[0, 1]`.
    pub warmup: Fixed64,
    /// Warmup-weighted elapsed time. Never reset.
    pub total_progress: Fixed64,
    pub heat_in: Fixed64,
    pub heat_out: Fixed64,
    pub routing: OutputRouter,
    /// Round-robin start offset into the neighbor list.
    pub(crate) dump_cursor: usize,
    /// Ticks elapsed since the last periodic item dump.
    pub(crate) dump_timer: Fixed64,
    /// Efficiency seen by the most recent tick.
    pub(crate) last_efficiency: Fixed64,
}

impl BuildState {
    pub fn new(block: &BlockType) -> Self {
        Self {
            recipe_index: 0,
            progress: Fixed64::ZERO,
            warmup: Fixed64::ZERO,
            total_progress: Fixed64::ZERO,
            heat_in: Fixed64::ZERO,
            heat_out: Fixed64::ZERO,
            routing: OutputRouter::for_block(block),
            dump_cursor: 0,
            dump_timer: Fixed64::ZERO,
            last_efficiency: Fixed64::ZERO,
        }
    }

    pub fn recipe_index(&self) -> usize {
        self.recipe_index
    }

    /// Select a recipe, clamping `index` into the catalog.
    ///
    /// Progress and warmup restart when the selection actually changes.
    /// Total progress and routing are kept. Returns whether it changed.
    pub fn set_recipe_index(&mut self, block: &BlockType, index: i64) -> bool {
        let clamped = block.clamp_index(index);
        if clamped == self.recipe_index {
            return false;
        }
        log::debug!(
            "'{}': recipe {} -> {} ({})",
            block.name(),
            self.recipe_index,
            clamped,
            block.recipe(clamped).label(clamped),
        );
        self.recipe_index = clamped;
        self.progress = Fixed64::ZERO;
        self.warmup = Fixed64::ZERO;
        true
    }

    /// Advance the round-robin cursor over `len` neighbors.
    pub(crate) fn increment_dump(&mut self, len: usize) {
        if len > 0 {
            self.dump_cursor = (self.dump_cursor + 1) % len;
        }
    }
}
