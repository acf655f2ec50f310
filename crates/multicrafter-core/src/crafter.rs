//! The per-tick crafting state machine.
//!
//! A [`CrafterBuild`] is one placed instance of a [`BlockType`]. The host
//! drives it once per simulation tick with a [`TickContext`] and the build's
//! buffers and neighbors; the build advances progress, warmup and heat,
//! completes crafts, emits liquids and drains output.

use std::sync::Arc;

use crate::block::BlockType;
use crate::consumption;
use crate::dump::{self, LIQUID_EPSILON, LIQUID_FULL_EPSILON};
use crate::fixed::{approach, clamp01, div_ceil, Fixed64};
use crate::heat;
use crate::id::{EffectId, ItemTypeId, LiquidTypeId};
use crate::proximity::Proximity;
use crate::recipe::RecipeDef;
use crate::rng::SimRng;
use crate::routing::{Direction, OutputKind};
use crate::state::BuildState;
use crate::storage::Storage;

// ---------------------------------------------------------------------------
// Tick input and output
// ---------------------------------------------------------------------------

/// Everything the host supplies for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Resource and power sufficiency, already scaled by heat. Zero stops
    /// the recipe; above one runs it faster.
    pub efficiency: Fixed64,
    /// Elapsed time in ticks.
    pub delta: Fixed64,
    /// Overdrive multiplier from the host (boost projectors and the like).
    pub time_scale: Fixed64,
    /// Heat arriving on each side, indexed by absolute direction.
    pub side_heat: [Fixed64; 4],
    pub rotation: Direction,
    /// Whether anyone can see the build. Effects only fire when visible.
    pub visible: bool,
}

impl TickContext {
    /// One tick at `efficiency`, no heat, facing right, not visible.
    pub fn new(efficiency: Fixed64) -> Self {
        Self {
            efficiency,
            delta: Fixed64::ONE,
            time_scale: Fixed64::ONE,
            side_heat: [Fixed64::ZERO; 4],
            rotation: Direction::Right,
            visible: false,
        }
    }

    pub fn with_heat(mut self, side_heat: [Fixed64; 4]) -> Self {
        self.side_heat = side_heat;
        self
    }

    pub fn with_rotation(mut self, rotation: Direction) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn visible(mut self) -> Self {
        self.visible = true;
        self
    }
}

/// An effect the host should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTrigger {
    /// At the block centre.
    Craft(EffectId),
    /// Offset from the block centre, in world units.
    Update { effect: EffectId, dx: Fixed64, dy: Fixed64 },
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub crafted: bool,
    /// Item inputs removed by the craft, as actually removed.
    pub consumed: Vec<(ItemTypeId, u32)>,
    /// Item units produced by the craft, per output slot.
    pub offloaded: Vec<(ItemTypeId, u32)>,
    /// Of the offloaded units, how many no neighbor took.
    pub kept: u32,
    pub liquids_produced: Vec<(LiquidTypeId, Fixed64)>,
    /// Buffered item units drained by the periodic dump.
    pub dumped: u32,
    pub effects: Vec<EffectTrigger>,
}

/// Logic sensors the build answers itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Progress,
    /// Anything else; answered by the host.
    Other(u32),
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// One placed multi-recipe crafter.
#[derive(Debug, Clone)]
pub struct CrafterBuild {
    block: Arc<BlockType>,
    pub(crate) state: BuildState,
    rng: SimRng,
}

impl CrafterBuild {
    /// `seed` drives cosmetic rolls only.
    pub fn new(block: Arc<BlockType>, seed: u64) -> Self {
        let state = BuildState::new(&block);
        Self {
            block,
            state,
            rng: SimRng::new(seed),
        }
    }

    pub fn block(&self) -> &BlockType {
        &self.block
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut BuildState {
        &mut self.state
    }

    pub fn recipe_index(&self) -> usize {
        self.state.recipe_index
    }

    pub fn current_recipe(&self) -> &RecipeDef {
        self.block.recipe(self.state.recipe_index)
    }

    /// See [`BuildState::set_recipe_index`].
    pub fn set_recipe_index(&mut self, index: i64) -> bool {
        self.state.set_recipe_index(&self.block, index)
    }

    /// Side an output slot of a recipe is routed to; `None` when it dumps
    /// to all sides.
    pub fn output_direction(&self, recipe: usize, kind: OutputKind, slot: usize) -> Option<Direction> {
        self.state.routing.direction(recipe, kind, slot)
    }

    /// Out-of-range indices are ignored.
    pub fn set_route(&mut self, recipe: usize, kind: OutputKind, slot: usize, direction: Direction) -> bool {
        let written = self.state.routing.set_route(recipe, kind, slot, direction);
        if written {
            log::debug!(
                "'{}': route recipe {} {:?} slot {} -> {:?}",
                self.block.name(),
                recipe,
                kind,
                slot,
                direction,
            );
        }
        written
    }

    /// Reshape routing tables to the catalog. Only needed for state built
    /// outside [`CrafterBuild::new`].
    pub fn ensure_routing(&mut self) -> bool {
        self.state.routing.ensure_routing(&self.block)
    }

    // -----------------------------------------------------------------------
    // Efficiency
    // -----------------------------------------------------------------------

    /// Fraction of a cycle with length `base` ticks completed this tick.
    /// Rounded up, so an integer craft time completes in exactly that many
    /// ticks at efficiency 1.
    pub fn progress_increase(&self, ctx: &TickContext, base: Fixed64) -> Fixed64 {
        let work = ctx
            .efficiency
            .max(Fixed64::ZERO)
            .saturating_mul(ctx.delta.max(Fixed64::ZERO))
            .saturating_mul(ctx.time_scale.max(Fixed64::ZERO));
        div_ceil(work, base).unwrap_or(Fixed64::ZERO)
    }

    pub fn efficiency_scale(&self) -> Fixed64 {
        heat::efficiency_scale(self.current_recipe(), self.block.config(), self.state.heat_in)
    }

    pub fn warmup_target(&self) -> Fixed64 {
        heat::warmup_target(self.current_recipe(), self.state.heat_in)
    }

    /// Whether the build may take inputs and keep cycling: false while any
    /// item output would overflow, or while liquid outputs are full and
    /// the block does not spill extra liquid. Otherwise `enabled`.
    pub fn should_consume(&self, storage: &impl Storage, enabled: bool) -> bool {
        let recipe = self.current_recipe();
        let item_capacity = self.block.item_capacity();
        for stack in &recipe.item_outputs {
            if storage.item(stack.item).saturating_add(stack.amount) > item_capacity {
                return false;
            }
        }

        let config = self.block.config();
        if !recipe.liquid_outputs.is_empty() && !config.ignore_liquid_fullness {
            let full_at = self.block.liquid_capacity() - LIQUID_FULL_EPSILON;
            let mut all_full = true;
            for stack in &recipe.liquid_outputs {
                if storage.liquid(stack.liquid) >= full_at {
                    if !config.dump_extra_liquid {
                        return false;
                    }
                } else {
                    all_full = false;
                }
            }
            if all_full {
                return false;
            }
        }

        enabled
    }

    /// Efficiency for the coming tick from what the buffers and power grid
    /// can supply, gated by [`should_consume`](Self::should_consume) and
    /// scaled by heat.
    pub fn compute_efficiency(&self, storage: &impl Storage, power_satisfaction: Fixed64, enabled: bool) -> Fixed64 {
        let recipe = self.current_recipe();
        let available = consumption::availability(recipe, storage, power_satisfaction);
        consumption::effective_efficiency(available, self.should_consume(storage, enabled), self.efficiency_scale())
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance one tick.
    pub fn tick(
        &mut self,
        ctx: &TickContext,
        storage: &mut impl Storage,
        proximity: &mut impl Proximity,
    ) -> TickReport {
        let block = Arc::clone(&self.block);
        let index = self.state.recipe_index;
        let recipe = block.recipe(index);
        let delta = ctx.delta.max(Fixed64::ZERO);
        let mut report = TickReport::default();

        self.state.heat_in = if recipe.requires_heat() {
            heat::calculate_heat(&ctx.side_heat)
        } else {
            Fixed64::ZERO
        };
        self.state.last_efficiency = ctx.efficiency;

        if ctx.efficiency > Fixed64::ZERO {
            self.state.progress += self.progress_increase(ctx, recipe.craft_time);
            let target = heat::warmup_target(recipe, self.state.heat_in);
            self.state.warmup = approach(self.state.warmup, target, recipe.warmup_speed.saturating_mul(delta));

            if !recipe.liquid_outputs.is_empty() {
                let inc = self.progress_increase(ctx, Fixed64::ONE);
                let capacity = block.liquid_capacity();
                for stack in &recipe.liquid_outputs {
                    let space = capacity - storage.liquid(stack.liquid);
                    if space <= LIQUID_EPSILON {
                        continue;
                    }
                    let amount = stack.amount.saturating_mul(inc).min(space);
                    storage.add_liquid(stack.liquid, amount);
                    report.liquids_produced.push((stack.liquid, amount));
                }
            }

            if ctx.visible {
                if let Some(effect) = block.update_effect(recipe) {
                    if self.rng.chance(effect.chance.saturating_mul(delta)) {
                        let spread = Fixed64::saturating_from_num(block.config().size).saturating_mul(effect.spread);
                        let dx = self.rng.range(spread);
                        let dy = self.rng.range(spread);
                        report.effects.push(EffectTrigger::Update {
                            effect: effect.effect,
                            dx,
                            dy,
                        });
                    }
                }
            }
        } else {
            self.state.warmup = approach(self.state.warmup, Fixed64::ZERO, recipe.warmup_speed.saturating_mul(delta));
        }

        let heat_target = if recipe.produces_heat() {
            recipe.heat_output.saturating_mul(ctx.efficiency.max(Fixed64::ZERO))
        } else {
            Fixed64::ZERO
        };
        let heat_step = block.config().heat_output_warmup_rate.saturating_mul(delta);
        self.state.heat_out = approach(self.state.heat_out, heat_target, heat_step);

        self.state.total_progress = self.state.total_progress.saturating_add(self.state.warmup.saturating_mul(delta));

        if self.state.progress >= Fixed64::ONE {
            self.craft(ctx, storage, proximity, &mut report);
        }

        report.dumped = dump::dump_outputs(
            &mut self.state,
            &block,
            storage,
            proximity,
            delta,
            ctx.time_scale,
            ctx.rotation,
        );
        report
    }

    /// Complete one cycle: remove inputs, offload every output unit, keep
    /// the progress overshoot.
    pub fn craft(
        &mut self,
        ctx: &TickContext,
        storage: &mut impl Storage,
        proximity: &mut impl Proximity,
        report: &mut TickReport,
    ) {
        let block = Arc::clone(&self.block);
        let index = self.state.recipe_index;
        let recipe = block.recipe(index);

        for stack in &recipe.item_inputs {
            let removed = storage.remove_item(stack.item, stack.amount);
            report.consumed.push((stack.item, removed));
        }

        for (slot, stack) in recipe.item_outputs.iter().enumerate() {
            let direction = self.state.routing.direction(index, OutputKind::Item, slot);
            for _ in 0..stack.amount {
                let delivery = dump::offload(&mut self.state, storage, proximity, stack.item, direction, ctx.rotation);
                if delivery == dump::Delivery::Kept {
                    report.kept += 1;
                }
            }
            report.offloaded.push((stack.item, stack.amount));
        }

        if ctx.visible {
            if let Some(effect) = block.craft_effect(recipe) {
                report.effects.push(EffectTrigger::Craft(effect));
            }
        }

        self.state.progress %= Fixed64::ONE;
        report.crafted = true;
        log::trace!(
            "'{}': crafted {} (progress carried {})",
            block.name(),
            recipe.label(index),
            self.state.progress,
        );
    }

    // -----------------------------------------------------------------------
    // Acceptance and host queries
    // -----------------------------------------------------------------------

    /// Takes `item` only as an input of the active recipe, below capacity.
    pub fn accept_item(&self, storage: &impl Storage, item: ItemTypeId) -> bool {
        self.current_recipe().item_input(item).is_some() && storage.item(item) < self.block.item_capacity()
    }

    /// Takes `liquid` only as an input of the active recipe, below capacity.
    pub fn accept_liquid(&self, storage: &impl Storage, liquid: LiquidTypeId) -> bool {
        self.current_recipe().liquid_input(liquid).is_some()
            && storage.liquid(liquid) < self.block.liquid_capacity() - LIQUID_EPSILON
    }

    /// Power drawn per tick by the active recipe while running.
    pub fn power_use(&self) -> Fixed64 {
        self.current_recipe().power_use
    }

    pub fn power_production(&self) -> Fixed64 {
        self.current_recipe().power_produce
    }

    pub fn heat_requirement(&self) -> Fixed64 {
        self.current_recipe().heat_requirement
    }

    pub fn heat(&self) -> Fixed64 {
        self.state.heat_out
    }

    /// Heat output relative to the recipe's full output; zero when the
    /// recipe makes no heat.
    pub fn heat_frac(&self) -> Fixed64 {
        let recipe = self.current_recipe();
        if !recipe.produces_heat() {
            return Fixed64::ZERO;
        }
        self.state.heat_out.saturating_div(recipe.heat_output)
    }

    pub fn heat_in(&self) -> Fixed64 {
        self.state.heat_in
    }

    pub fn warmup(&self) -> Fixed64 {
        self.state.warmup
    }

    pub fn total_progress(&self) -> Fixed64 {
        self.state.total_progress
    }

    /// Cycle progress clamped to `[0, 1]`.
    pub fn progress(&self) -> Fixed64 {
        clamp01(self.state.progress)
    }

    pub fn sense(&self, sensor: Sensor) -> Option<Fixed64> {
        match sensor {
            Sensor::Progress => Some(self.progress()),
            Sensor::Other(_) => None,
        }
    }

    pub fn should_ambient_sound(&self) -> bool {
        self.state.last_efficiency > Fixed64::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockConfig;
    use crate::proximity::Isolated;
    use crate::storage::BuildStorage;
    use crate::test_utils::*;

    fn build(recipes: Vec<RecipeDef>) -> CrafterBuild {
        build_with(BlockConfig::default(), recipes)
    }

    fn build_with(config: BlockConfig, recipes: Vec<RecipeDef>) -> CrafterBuild {
        let block = BlockType::new("crafter", config, recipes).unwrap();
        CrafterBuild::new(Arc::new(block), 42)
    }

    // -----------------------------------------------------------------------
    // Test 1: Progress and warmup
    // -----------------------------------------------------------------------
    #[test]
    fn idle_tick_changes_nothing_but_dump_timer() {
        let mut b = build(vec![make_recipe(vec![(iron(), 1)], vec![(gear(), 1)], 10)]);
        let mut storage = BuildStorage::new();
        let report = b.tick(&TickContext::new(Fixed64::ZERO), &mut storage, &mut Isolated);
        assert!(!report.crafted);
        assert_eq!(b.state().progress, Fixed64::ZERO);
        assert_eq!(b.warmup(), Fixed64::ZERO);
        assert!(!b.should_ambient_sound());
    }

    #[test]
    fn warmup_rises_linearly_and_falls_back() {
        let r = RecipeDef::builder("w").warmup_speed(0.25).craft_time_ticks(100).build();
        let mut b = build(vec![r]);
        let mut storage = BuildStorage::new();
        for _ in 0..2 {
            b.tick(&TickContext::new(Fixed64::ONE), &mut storage, &mut Isolated);
        }
        assert_eq!(b.warmup(), fixed(0.5));
        assert!(b.should_ambient_sound());
        b.tick(&TickContext::new(Fixed64::ZERO), &mut storage, &mut Isolated);
        assert_eq!(b.warmup(), fixed(0.25));
        assert_eq!(b.total_progress(), fixed(1.0));
    }

    #[test]
    fn half_efficiency_takes_twice_as_long() {
        let mut b = build(vec![make_recipe(vec![], vec![(gear(), 1)], 10)]);
        let mut storage = BuildStorage::new();
        let mut crafts = 0;
        for _ in 0..20 {
            crafts += u32::from(b.tick(&TickContext::new(fixed(0.5)), &mut storage, &mut Isolated).crafted);
        }
        assert_eq!(crafts, 1);
    }

    // -----------------------------------------------------------------------
    // Test 2: Craft completion
    // -----------------------------------------------------------------------
    #[test]
    fn craft_keeps_overshoot() {
        let mut b = build(vec![make_recipe(vec![(iron(), 2)], vec![(gear(), 1)], 60)]);
        let mut storage = BuildStorage::with_items(&[(iron(), 2)]);
        b.state_mut().progress = fixed(1.25);
        let mut report = TickReport::default();
        b.craft(&TickContext::new(Fixed64::ONE), &mut storage, &mut Isolated, &mut report);
        assert_eq!(b.state().progress, fixed(0.25));
        assert_eq!(report.consumed, vec![(iron(), 2)]);
        assert_eq!(report.offloaded, vec![(gear(), 1)]);
        assert_eq!(report.kept, 1);
        assert_eq!(storage.item(gear()), 1);
    }

    #[test]
    fn multi_unit_outputs_offload_each_unit() {
        let mut b = build(vec![make_recipe(vec![], vec![(gear(), 3), (copper(), 2)], 1)]);
        let mut storage = BuildStorage::new();
        let mut near = TestProximity::new(vec![TestNeighbor::sink(Direction::Right)]);
        let report = b.tick(&TickContext::new(Fixed64::ONE), &mut storage, &mut near);
        assert!(report.crafted);
        assert_eq!(near.neighbors[0].received(gear()), 3);
        assert_eq!(near.neighbors[0].received(copper()), 2);
        assert_eq!(report.kept, 0);
    }

    #[test]
    fn craft_effect_only_when_visible() {
        let r = RecipeDef::builder("fx")
            .craft_time_ticks(1)
            .item_out(gear(), 1)
            .craft_effect(EffectId(3))
            .build();
        let mut b = build(vec![r]);
        let mut storage = BuildStorage::new();
        let hidden = b.tick(&TickContext::new(Fixed64::ONE), &mut storage, &mut Isolated);
        assert!(hidden.effects.is_empty());
        let shown = b.tick(&TickContext::new(Fixed64::ONE).visible(), &mut storage, &mut Isolated);
        assert!(shown.effects.contains(&EffectTrigger::Craft(EffectId(3))));
    }

    #[test]
    fn certain_update_effect_lands_within_spread() {
        let r = RecipeDef::builder("smoke")
            .craft_time_ticks(1000)
            .update_effect(EffectId(9), 1.0)
            .update_effect_spread(2.0)
            .build();
        let mut b = build(vec![r]);
        let mut storage = BuildStorage::new();
        let report = b.tick(&TickContext::new(Fixed64::ONE).visible(), &mut storage, &mut Isolated);
        let [EffectTrigger::Update { effect, dx, dy }] = report.effects.as_slice() else {
            panic!("expected one update effect, got {:?}", report.effects);
        };
        assert_eq!(*effect, EffectId(9));
        assert!(dx.abs() <= fixed(2.0) && dy.abs() <= fixed(2.0));
    }

    // -----------------------------------------------------------------------
    // Test 3: Consumption gating
    // -----------------------------------------------------------------------
    #[test]
    fn item_overflow_blocks_consumption() {
        let b = build(vec![make_recipe(vec![(iron(), 1)], vec![(gear(), 3)], 10)]);
        let cap = b.block().item_capacity();
        let room = BuildStorage::with_items(&[(gear(), cap - 3)]);
        let full = BuildStorage::with_items(&[(gear(), cap - 2)]);
        assert!(b.should_consume(&room, true));
        assert!(!b.should_consume(&room, false));
        assert!(!b.should_consume(&full, true));
    }

    fn two_liquid_outputs() -> RecipeDef {
        RecipeDef::builder("split")
            .liquid_out_per_second(water(), 60.0)
            .liquid_out_per_second(steam(), 60.0)
            .build()
    }

    #[test]
    fn one_free_liquid_slot_keeps_running() {
        let b = build(vec![two_liquid_outputs()]);
        let mut s = BuildStorage::new();
        s.add_liquid(water(), b.block().liquid_capacity());
        assert!(b.should_consume(&s, true));
        s.add_liquid(steam(), b.block().liquid_capacity());
        assert!(!b.should_consume(&s, true));
    }

    #[test]
    fn strict_liquid_block_stops_on_any_full_slot() {
        let config = BlockConfig {
            dump_extra_liquid: false,
            ..BlockConfig::default()
        };
        let b = build_with(config, vec![two_liquid_outputs()]);
        let mut s = BuildStorage::new();
        s.add_liquid(water(), b.block().liquid_capacity());
        assert!(!b.should_consume(&s, true));
    }

    #[test]
    fn ignoring_liquid_fullness_always_runs() {
        let config = BlockConfig {
            ignore_liquid_fullness: true,
            ..BlockConfig::default()
        };
        let b = build_with(config, vec![two_liquid_outputs()]);
        let mut s = BuildStorage::new();
        s.add_liquid(water(), b.block().liquid_capacity());
        s.add_liquid(steam(), b.block().liquid_capacity());
        assert!(b.should_consume(&s, true));
    }

    #[test]
    fn compute_efficiency_combines_gates() {
        let r = RecipeDef::builder("r")
            .item_in(iron(), 1)
            .item_out(gear(), 1)
            .power_use_per_second(60.0)
            .build();
        let b = build(vec![r]);
        let stocked = BuildStorage::with_items(&[(iron(), 1)]);
        assert_eq!(b.compute_efficiency(&stocked, fixed(0.5), true), fixed(0.5));
        assert_eq!(b.compute_efficiency(&stocked, fixed(0.5), false), Fixed64::ZERO);
        assert_eq!(b.compute_efficiency(&BuildStorage::new(), Fixed64::ONE, true), Fixed64::ZERO);
    }

    // -----------------------------------------------------------------------
    // Test 4: Heat
    // -----------------------------------------------------------------------
    #[test]
    fn heat_input_gates_warmup() {
        let r = RecipeDef::builder("hot")
            .heat_requirement(10.0)
            .warmup_speed(1.0)
            .craft_time_ticks(1000)
            .build();
        let mut b = build(vec![r]);
        let mut storage = BuildStorage::new();
        let ctx = TickContext::new(Fixed64::ONE).with_heat([fixed(2.5), fixed(2.5), Fixed64::ZERO, Fixed64::ZERO]);
        b.tick(&ctx, &mut storage, &mut Isolated);
        assert_eq!(b.heat_in(), fixed(5.0));
        assert_eq!(b.warmup(), fixed(0.5));
        assert_eq!(b.efficiency_scale(), fixed(0.5));
    }

    #[test]
    fn heat_output_ramps_toward_target() {
        let r = RecipeDef::builder("heater").heat_output(1.0).craft_time_ticks(1000).build();
        let mut b = build(vec![r]);
        let mut storage = BuildStorage::new();
        b.tick(&TickContext::new(Fixed64::ONE), &mut storage, &mut Isolated);
        assert_eq!(b.heat(), b.block().config().heat_output_warmup_rate);
        for _ in 0..20 {
            b.tick(&TickContext::new(Fixed64::ONE), &mut storage, &mut Isolated);
        }
        assert_eq!(b.heat(), Fixed64::ONE);
        assert_eq!(b.heat_frac(), Fixed64::ONE);
        for _ in 0..20 {
            b.tick(&TickContext::new(Fixed64::ZERO), &mut storage, &mut Isolated);
        }
        assert_eq!(b.heat(), Fixed64::ZERO);
    }

    #[test]
    fn heat_frac_is_zero_without_heat_output() {
        let b = build(vec![make_recipe(vec![], vec![(gear(), 1)], 10)]);
        assert_eq!(b.heat_frac(), Fixed64::ZERO);
    }

    #[test]
    fn extreme_side_heat_saturates_instead_of_overflowing() {
        let r = RecipeDef::builder("hot")
            .heat_requirement(0.001)
            .craft_time_ticks(1000)
            .build();
        let mut b = build(vec![r]);
        let mut storage = BuildStorage::new();
        let ctx = TickContext::new(Fixed64::ONE).with_heat([fixed(3_000_000.0), Fixed64::ZERO, Fixed64::ZERO, Fixed64::ZERO]);
        b.tick(&ctx, &mut storage, &mut Isolated);
        assert_eq!(b.heat_in(), fixed(3_000_000.0));
        assert_eq!(b.efficiency_scale(), b.block().config().max_heat_efficiency);
        assert_eq!(b.warmup_target(), Fixed64::ONE);
    }

    #[test]
    fn heat_frac_saturates_after_recipe_switch() {
        let mut b = build(vec![
            RecipeDef::builder("furnace").heat_output(3_000_000.0).build(),
            RecipeDef::builder("ember").heat_output(0.001).build(),
        ]);
        b.state_mut().heat_out = fixed(3_000_000.0);
        b.set_recipe_index(1);
        assert_eq!(b.heat_frac(), Fixed64::MAX);
    }

    #[test]
    fn heat_output_step_ignores_time_scale() {
        let r = RecipeDef::builder("heater").heat_output(1.0).craft_time_ticks(1000).build();
        let mut b = build(vec![r]);
        let mut storage = BuildStorage::new();
        let mut ctx = TickContext::new(Fixed64::ONE);
        ctx.time_scale = fixed(2.5);
        b.tick(&ctx, &mut storage, &mut Isolated);
        assert_eq!(b.heat(), b.block().config().heat_output_warmup_rate);
    }

    // -----------------------------------------------------------------------
    // Test 5: Acceptance and queries
    // -----------------------------------------------------------------------
    #[test]
    fn accepts_only_active_inputs() {
        let mut b = build(vec![
            make_recipe(vec![(iron(), 1)], vec![(gear(), 1)], 10),
            make_recipe(vec![(copper(), 1)], vec![(gear(), 1)], 10),
        ]);
        let storage = BuildStorage::new();
        assert!(b.accept_item(&storage, iron()));
        assert!(!b.accept_item(&storage, copper()));
        b.set_recipe_index(1);
        assert!(!b.accept_item(&storage, iron()));
        assert!(b.accept_item(&storage, copper()));

        let full = BuildStorage::with_items(&[(copper(), b.block().item_capacity())]);
        assert!(!b.accept_item(&full, copper()));
    }

    #[test]
    fn accepts_active_liquid_below_capacity() {
        let r = RecipeDef::builder("wet").liquid_in_per_second(water(), 60.0).build();
        let b = build(vec![r]);
        let mut s = BuildStorage::new();
        assert!(b.accept_liquid(&s, water()));
        assert!(!b.accept_liquid(&s, steam()));
        s.add_liquid(water(), b.block().liquid_capacity());
        assert!(!b.accept_liquid(&s, water()));
    }

    #[test]
    fn progress_sensor_is_clamped() {
        let mut b = build(vec![make_recipe(vec![], vec![(gear(), 1)], 10)]);
        b.state_mut().progress = fixed(1.5);
        assert_eq!(b.sense(Sensor::Progress), Some(Fixed64::ONE));
        assert_eq!(b.sense(Sensor::Other(4)), None);
    }

    #[test]
    fn power_follows_active_recipe() {
        let mut b = build(vec![
            RecipeDef::builder("burn").power_produce_per_second(120.0).build(),
            RecipeDef::builder("use").power_use_per_second(60.0).build(),
        ]);
        assert_eq!(b.power_production(), fixed(2.0));
        assert_eq!(b.power_use(), Fixed64::ZERO);
        b.set_recipe_index(1);
        assert_eq!(b.power_production(), Fixed64::ZERO);
        assert_eq!(b.power_use(), Fixed64::ONE);
    }
}
