//! Block types: an immutable recipe catalog plus the capabilities derived
//! from it.
//!
//! A [`BlockType`] is built once, validated, and then shared read-only by
//! every build of that type. Construction fails on an empty catalog or a
//! malformed recipe; nothing can be placed from a block that did not build.

use crate::fixed::{Fixed64, TICKS_PER_SECOND};
use crate::id::{EffectId, ItemTypeId, LiquidTypeId};
use crate::recipe::{
    RecipeDef, UpdateEffect, DEFAULT_UPDATE_EFFECT_CHANCE, DEFAULT_UPDATE_EFFECT_SPREAD,
};
use crate::routing::Direction;
use serde::{Deserialize, Serialize};

/// Smallest item buffer a block derives for itself.
pub const MIN_ITEM_CAPACITY: u32 = 10;
/// Smallest liquid buffer a block derives for itself.
pub const MIN_LIQUID_CAPACITY: u32 = 30;
/// Output slots addressable by a packed route.
pub const MAX_OUTPUT_SLOTS: usize = 256;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Block-wide tuning shared by every recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Item buffer before derivation. Derivation only ever grows it.
    pub item_capacity: u32,
    /// Liquid buffer before derivation.
    pub liquid_capacity: Fixed64,
    pub item_capacity_multiplier: Fixed64,
    pub liquid_capacity_multiplier: Fixed64,
    /// Efficiency gained per unit of heat above the requirement, relative to
    /// the requirement.
    pub overheat_scale: Fixed64,
    /// Cap on heat-driven efficiency.
    pub max_heat_efficiency: Fixed64,
    /// Per-tick step of the smoothed heat output.
    pub heat_output_warmup_rate: Fixed64,
    /// Ticks between periodic item dumps.
    pub dump_time: Fixed64,
    /// Keep running while at least one liquid output has space.
    pub dump_extra_liquid: bool,
    /// Keep running even when every liquid output is full.
    pub ignore_liquid_fullness: bool,
    /// Default side per item output slot; `None` means omnidirectional.
    pub item_output_directions: Vec<Option<Direction>>,
    /// Default side per liquid output slot; `None` means omnidirectional.
    pub liquid_output_directions: Vec<Option<Direction>>,
    pub default_craft_effect: Option<EffectId>,
    pub default_update_effect: Option<EffectId>,
    pub default_update_effect_chance: Fixed64,
    pub default_update_effect_spread: Fixed64,
    /// Edge length in tiles; scales update effect spread.
    pub size: u32,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            item_capacity: 10,
            liquid_capacity: Fixed64::from_num(10),
            item_capacity_multiplier: Fixed64::from_num(4),
            liquid_capacity_multiplier: Fixed64::from_num(2),
            overheat_scale: Fixed64::ONE,
            max_heat_efficiency: Fixed64::from_num(4),
            heat_output_warmup_rate: Fixed64::from_num(0.15),
            dump_time: Fixed64::from_num(5),
            dump_extra_liquid: true,
            ignore_liquid_fullness: false,
            item_output_directions: vec![None],
            liquid_output_directions: vec![None],
            default_craft_effect: None,
            default_update_effect: None,
            default_update_effect_chance: Fixed64::from_num(DEFAULT_UPDATE_EFFECT_CHANCE),
            default_update_effect_spread: Fixed64::from_num(DEFAULT_UPDATE_EFFECT_SPREAD),
            size: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived capabilities
// ---------------------------------------------------------------------------

/// What the catalog as a whole needs from the block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCapabilities {
    pub item_capacity: u32,
    pub liquid_capacity: Fixed64,
    /// Any recipe uses or produces power.
    pub has_power: bool,
    /// Any recipe produces power.
    pub outputs_power: bool,
    pub has_liquids: bool,
    pub consumes_heat: bool,
    pub outputs_heat: bool,
    /// Largest per-tick power draw of any recipe.
    pub max_power_use: Fixed64,
    /// Every item any recipe can produce, in first-seen order.
    pub all_output_items: Vec<ItemTypeId>,
    /// Every liquid any recipe can produce, in first-seen order.
    pub all_output_liquids: Vec<LiquidTypeId>,
}

impl BlockCapabilities {
    pub fn has_heat(&self) -> bool {
        self.consumes_heat || self.outputs_heat
    }
}

/// Errors raised while constructing a block type.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("block '{0}' has no recipes")]
    EmptyCatalog(String),
    #[error("block '{block}' recipe {index}: {reason}")]
    InvalidRecipe {
        block: String,
        index: usize,
        reason: String,
    },
    #[error("block '{block}' config: {reason}")]
    InvalidConfig { block: String, reason: String },
}

fn validate_config(block: &str, config: &BlockConfig) -> Result<(), BlockError> {
    let fields = [
        ("liquid capacity", config.liquid_capacity),
        ("item capacity multiplier", config.item_capacity_multiplier),
        ("liquid capacity multiplier", config.liquid_capacity_multiplier),
        ("overheat scale", config.overheat_scale),
        ("max heat efficiency", config.max_heat_efficiency),
        ("heat output warmup rate", config.heat_output_warmup_rate),
        ("dump time", config.dump_time),
    ];
    for (what, value) in fields {
        if value < Fixed64::ZERO {
            return Err(BlockError::InvalidConfig {
                block: block.to_string(),
                reason: format!("{what} must not be negative, got {value}"),
            });
        }
    }
    Ok(())
}

fn validate_recipe(block: &str, index: usize, recipe: &RecipeDef) -> Result<(), BlockError> {
    let invalid = |reason: String| BlockError::InvalidRecipe {
        block: block.to_string(),
        index,
        reason,
    };

    if recipe.craft_time <= Fixed64::ZERO {
        return Err(invalid(format!("craft time must be positive, got {}", recipe.craft_time)));
    }
    let rates = [
        ("power use", recipe.power_use),
        ("power production", recipe.power_produce),
        ("heat requirement", recipe.heat_requirement),
        ("heat output", recipe.heat_output),
        ("warmup speed", recipe.warmup_speed),
    ];
    for (what, value) in rates {
        if value < Fixed64::ZERO {
            return Err(invalid(format!("{what} must not be negative, got {value}")));
        }
    }
    for stack in recipe.liquid_inputs.iter().chain(&recipe.liquid_outputs) {
        if stack.amount < Fixed64::ZERO {
            return Err(invalid(format!("liquid {:?} has a negative rate", stack.liquid)));
        }
    }
    for (i, stack) in recipe.item_inputs.iter().enumerate() {
        if recipe.item_inputs[..i].iter().any(|s| s.item == stack.item) {
            return Err(invalid(format!("item {:?} listed twice in inputs", stack.item)));
        }
    }
    for (i, stack) in recipe.liquid_inputs.iter().enumerate() {
        if recipe.liquid_inputs[..i].iter().any(|s| s.liquid == stack.liquid) {
            return Err(invalid(format!("liquid {:?} listed twice in inputs", stack.liquid)));
        }
    }
    if recipe.item_outputs.len() > MAX_OUTPUT_SLOTS || recipe.liquid_outputs.len() > MAX_OUTPUT_SLOTS {
        return Err(invalid(format!("more than {MAX_OUTPUT_SLOTS} output slots")));
    }
    Ok(())
}

fn derive_capabilities(
    block: &str,
    config: &BlockConfig,
    recipes: &[RecipeDef],
) -> Result<BlockCapabilities, BlockError> {
    let mut max_item_stack = 0u32;
    let mut max_liquid_rate = Fixed64::ZERO;
    let mut max_power_use = Fixed64::ZERO;
    let mut any_power = false;
    let mut outputs_power = false;
    let mut any_liquids = false;
    let mut consumes_heat = false;
    let mut outputs_heat = false;
    let mut all_output_items: Vec<ItemTypeId> = Vec::new();
    let mut all_output_liquids: Vec<LiquidTypeId> = Vec::new();

    for r in recipes {
        for stack in &r.item_inputs {
            max_item_stack = max_item_stack.max(stack.amount);
        }
        for stack in &r.item_outputs {
            max_item_stack = max_item_stack.max(stack.amount);
            if !all_output_items.contains(&stack.item) {
                all_output_items.push(stack.item);
            }
        }
        for stack in &r.liquid_inputs {
            max_liquid_rate = max_liquid_rate.max(stack.amount);
            any_liquids = true;
        }
        for stack in &r.liquid_outputs {
            max_liquid_rate = max_liquid_rate.max(stack.amount);
            any_liquids = true;
            if !all_output_liquids.contains(&stack.liquid) {
                all_output_liquids.push(stack.liquid);
            }
        }

        max_power_use = max_power_use.max(r.power_use);
        any_power |= r.power_use > Fixed64::ZERO || r.power_produce > Fixed64::ZERO;
        outputs_power |= r.power_produce > Fixed64::ZERO;
        consumes_heat |= r.requires_heat();
        outputs_heat |= r.produces_heat();
    }

    let mut item_capacity = config.item_capacity;
    if max_item_stack > 0 {
        let scaled = Fixed64::checked_from_num(max_item_stack)
            .and_then(|stack| stack.checked_mul(config.item_capacity_multiplier))
            .and_then(|buffer| buffer.checked_ceil())
            .and_then(|buffer| buffer.checked_to_num::<u32>())
            .ok_or_else(|| BlockError::InvalidConfig {
                block: block.to_string(),
                reason: format!(
                    "item capacity for a stack of {max_item_stack} times {} is out of range",
                    config.item_capacity_multiplier
                ),
            })?;
        item_capacity = item_capacity.max(MIN_ITEM_CAPACITY.max(scaled));
    }

    let mut liquid_capacity = config.liquid_capacity;
    if any_liquids {
        // Rates are per tick; one second of flow, scaled.
        let buffer = max_liquid_rate
            .saturating_mul(Fixed64::from_num(TICKS_PER_SECOND))
            .saturating_mul(config.liquid_capacity_multiplier);
        liquid_capacity = liquid_capacity
            .max(buffer)
            .max(Fixed64::from_num(MIN_LIQUID_CAPACITY));
    }

    Ok(BlockCapabilities {
        item_capacity,
        liquid_capacity,
        has_power: any_power,
        outputs_power,
        has_liquids: any_liquids,
        consumes_heat,
        outputs_heat,
        max_power_use,
        all_output_items,
        all_output_liquids,
    })
}

// ---------------------------------------------------------------------------
// Block type
// ---------------------------------------------------------------------------

/// A multi-recipe crafter type. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockType {
    name: String,
    config: BlockConfig,
    recipes: Vec<RecipeDef>,
    capabilities: BlockCapabilities,
}

impl BlockType {
    /// Validate the catalog and derive capabilities.
    pub fn new(name: &str, config: BlockConfig, recipes: Vec<RecipeDef>) -> Result<Self, BlockError> {
        if recipes.is_empty() {
            return Err(BlockError::EmptyCatalog(name.to_string()));
        }
        for (index, recipe) in recipes.iter().enumerate() {
            validate_recipe(name, index, recipe)?;
        }

        validate_config(name, &config)?;
        let capabilities = derive_capabilities(name, &config, &recipes)?;
        log::info!(
            "block '{}': {} recipes, item capacity {}, liquid capacity {}, power {}, heat {}",
            name,
            recipes.len(),
            capabilities.item_capacity,
            capabilities.liquid_capacity,
            capabilities.has_power,
            capabilities.has_heat(),
        );

        Ok(Self {
            name: name.to_string(),
            config,
            recipes,
            capabilities,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BlockConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &BlockCapabilities {
        &self.capabilities
    }

    pub fn recipes(&self) -> &[RecipeDef] {
        &self.recipes
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Clamp any integer into a valid recipe index.
    pub fn clamp_index(&self, index: i64) -> usize {
        index.clamp(0, self.recipes.len() as i64 - 1) as usize
    }

    /// Recipe at `index`, clamped into range.
    pub fn recipe(&self, index: usize) -> &RecipeDef {
        &self.recipes[index.min(self.recipes.len() - 1)]
    }

    pub fn item_capacity(&self) -> u32 {
        self.capabilities.item_capacity
    }

    pub fn liquid_capacity(&self) -> Fixed64 {
        self.capabilities.liquid_capacity
    }

    pub fn max_heat_requirement(&self) -> Fixed64 {
        self.recipes
            .iter()
            .map(|r| r.heat_requirement)
            .fold(Fixed64::ZERO, Fixed64::max)
    }

    pub fn max_heat_output(&self) -> Fixed64 {
        self.recipes
            .iter()
            .map(|r| r.heat_output)
            .fold(Fixed64::ZERO, Fixed64::max)
    }

    /// Craft effect for `recipe`, falling back to the block default.
    pub fn craft_effect(&self, recipe: &RecipeDef) -> Option<EffectId> {
        recipe.craft_effect.or(self.config.default_craft_effect)
    }

    pub fn update_effect(&self, recipe: &RecipeDef) -> Option<UpdateEffect> {
        recipe.update_effect.or_else(|| {
            self.config.default_update_effect.map(|effect| UpdateEffect {
                effect,
                chance: self.config.default_update_effect_chance,
                spread: self.config.default_update_effect_spread,
            })
        })
    }

    /// Whether a conduit on `relative_side` (relative to the build's
    /// rotation) must be refused liquid from this block: true unless some
    /// configured liquid output direction is omnidirectional or matches.
    pub fn blocks_conduit_output(&self, relative_side: Direction) -> bool {
        !self
            .config
            .liquid_output_directions
            .iter()
            .any(|d| d.is_none_or(|d| d == relative_side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn block(recipes: Vec<RecipeDef>) -> BlockType {
        BlockType::new("test", BlockConfig::default(), recipes).unwrap()
    }

    // -----------------------------------------------------------------------
    // Test 1: Empty catalog is fatal
    // -----------------------------------------------------------------------
    #[test]
    fn empty_catalog_is_rejected() {
        let err = BlockType::new("empty", BlockConfig::default(), vec![]).unwrap_err();
        assert!(matches!(err, BlockError::EmptyCatalog(ref name) if name == "empty"));
    }

    // -----------------------------------------------------------------------
    // Test 2: Item capacity derived from the largest stack
    // -----------------------------------------------------------------------
    #[test]
    fn item_capacity_scales_largest_stack() {
        let b = block(vec![
            make_recipe(vec![(iron(), 2)], vec![(gear(), 1)], 60),
            make_recipe(vec![(copper(), 5)], vec![(gear(), 3)], 60),
        ]);
        // 5 * 4 = 20
        assert_eq!(b.item_capacity(), 20);
    }

    #[test]
    fn item_capacity_has_floor() {
        let b = block(vec![make_recipe(vec![(iron(), 1)], vec![(gear(), 1)], 60)]);
        assert_eq!(b.item_capacity(), MIN_ITEM_CAPACITY);
    }

    #[test]
    fn item_capacity_never_shrinks_configured_value() {
        let config = BlockConfig {
            item_capacity: 50,
            ..BlockConfig::default()
        };
        let b = BlockType::new(
            "big",
            config,
            vec![make_recipe(vec![(iron(), 2)], vec![(gear(), 1)], 60)],
        )
        .unwrap();
        assert_eq!(b.item_capacity(), 50);
    }

    // -----------------------------------------------------------------------
    // Test 3: Liquid capacity from the largest per-tick rate
    // -----------------------------------------------------------------------
    #[test]
    fn liquid_capacity_is_one_second_scaled() {
        let r = RecipeDef::builder("pump")
            .liquid_out_per_second(water(), 60.0)
            .build();
        let b = block(vec![r]);
        // 1/tick * 60 * 2 = 120
        assert_eq!(b.liquid_capacity(), fixed(120.0));
        assert!(b.capabilities().has_liquids);
    }

    #[test]
    fn liquid_capacity_has_floor() {
        let r = RecipeDef::builder("drip")
            .liquid_in_per_second(water(), 6.0)
            .build();
        let b = block(vec![r]);
        // 0.1 * 60 * 2 = 12 -> floor 30
        assert_eq!(b.liquid_capacity(), fixed(30.0));
    }

    #[test]
    fn liquid_capacity_untouched_without_liquids() {
        let b = block(vec![make_recipe(vec![(iron(), 1)], vec![(gear(), 1)], 60)]);
        assert_eq!(b.liquid_capacity(), fixed(10.0));
        assert!(!b.capabilities().has_liquids);
    }

    // -----------------------------------------------------------------------
    // Test 4: Capability flags and output unions
    // -----------------------------------------------------------------------
    #[test]
    fn flags_and_unions() {
        let a = RecipeDef::builder("a")
            .item_out(gear(), 1)
            .item_out(copper(), 1)
            .power_use_per_second(60.0)
            .heat_requirement(10.0)
            .build();
        let b = RecipeDef::builder("b")
            .item_out(gear(), 2)
            .liquid_out_per_second(steam(), 6.0)
            .heat_output(5.0)
            .power_produce_per_second(30.0)
            .build();
        let block = block(vec![a, b]);
        let caps = block.capabilities();
        assert!(caps.has_power);
        assert!(caps.outputs_power);
        assert!(caps.consumes_heat);
        assert!(caps.outputs_heat);
        assert_eq!(caps.max_power_use, fixed(1.0));
        assert_eq!(caps.all_output_items, vec![gear(), copper()]);
        assert_eq!(caps.all_output_liquids, vec![steam()]);
        assert_eq!(block.max_heat_requirement(), fixed(10.0));
        assert_eq!(block.max_heat_output(), fixed(5.0));
    }

    // -----------------------------------------------------------------------
    // Test 5: Validation
    // -----------------------------------------------------------------------
    #[test]
    fn zero_craft_time_is_rejected() {
        let mut r = make_recipe(vec![], vec![(gear(), 1)], 1);
        r.craft_time = Fixed64::ZERO;
        let err = BlockType::new("bad", BlockConfig::default(), vec![r]).unwrap_err();
        assert!(matches!(err, BlockError::InvalidRecipe { index: 0, .. }));
    }

    #[test]
    fn duplicate_input_is_rejected() {
        let r = make_recipe(vec![(iron(), 1), (iron(), 2)], vec![(gear(), 1)], 10);
        let ok = make_recipe(vec![(iron(), 1)], vec![(gear(), 1)], 10);
        let err = BlockType::new("bad", BlockConfig::default(), vec![ok, r]).unwrap_err();
        assert!(matches!(err, BlockError::InvalidRecipe { index: 1, .. }));
    }

    #[test]
    fn negative_multiplier_is_rejected() {
        let config = BlockConfig {
            item_capacity_multiplier: fixed(-1.0),
            ..BlockConfig::default()
        };
        let r = make_recipe(vec![(iron(), 2)], vec![(gear(), 1)], 10);
        let err = BlockType::new("bad", config, vec![r]).unwrap_err();
        assert!(matches!(err, BlockError::InvalidConfig { ref reason, .. } if reason.contains("item capacity multiplier")));
    }

    #[test]
    fn negative_dump_time_is_rejected() {
        let config = BlockConfig {
            dump_time: fixed(-5.0),
            ..BlockConfig::default()
        };
        let r = make_recipe(vec![], vec![(gear(), 1)], 10);
        let err = BlockType::new("bad", config, vec![r]).unwrap_err();
        assert!(matches!(err, BlockError::InvalidConfig { .. }));
    }

    #[test]
    fn oversized_stack_capacity_is_an_error() {
        let r = make_recipe(vec![(iron(), 1_000_000_000)], vec![(gear(), 1)], 10);
        let err = BlockType::new("bad", BlockConfig::default(), vec![r]).unwrap_err();
        assert!(matches!(err, BlockError::InvalidConfig { ref block, .. } if block == "bad"));
    }

    #[test]
    fn negative_power_is_rejected() {
        let mut r = make_recipe(vec![], vec![(gear(), 1)], 10);
        r.power_use = fixed(-1.0);
        assert!(BlockType::new("bad", BlockConfig::default(), vec![r]).is_err());
    }

    // -----------------------------------------------------------------------
    // Test 6: Index clamping
    // -----------------------------------------------------------------------
    #[test]
    fn clamp_index_bounds() {
        let b = block(vec![
            make_recipe(vec![], vec![(gear(), 1)], 10),
            make_recipe(vec![], vec![(iron(), 1)], 10),
        ]);
        assert_eq!(b.clamp_index(-3), 0);
        assert_eq!(b.clamp_index(1), 1);
        assert_eq!(b.clamp_index(99), 1);
        assert_eq!(b.recipe(7).item_outputs[0].item, iron());
    }

    // -----------------------------------------------------------------------
    // Test 7: Effect fallback
    // -----------------------------------------------------------------------
    #[test]
    fn effects_fall_back_to_block_defaults() {
        let config = BlockConfig {
            default_craft_effect: Some(EffectId(7)),
            default_update_effect: Some(EffectId(8)),
            ..BlockConfig::default()
        };
        let plain = make_recipe(vec![], vec![(gear(), 1)], 10);
        let own = RecipeDef::builder("own")
            .craft_effect(EffectId(1))
            .update_effect(EffectId(2), 0.5)
            .build();
        let b = BlockType::new("fx", config, vec![plain, own]).unwrap();

        assert_eq!(b.craft_effect(b.recipe(0)), Some(EffectId(7)));
        let fallback = b.update_effect(b.recipe(0)).unwrap();
        assert_eq!(fallback.effect, EffectId(8));
        assert_eq!(fallback.chance, fixed(DEFAULT_UPDATE_EFFECT_CHANCE));

        assert_eq!(b.craft_effect(b.recipe(1)), Some(EffectId(1)));
        assert_eq!(b.update_effect(b.recipe(1)).unwrap().effect, EffectId(2));
    }

    // -----------------------------------------------------------------------
    // Test 8: Conduit output gating
    // -----------------------------------------------------------------------
    #[test]
    fn conduit_output_gating() {
        let r = make_recipe(vec![], vec![(gear(), 1)], 10);
        let omni = block(vec![r.clone()]);
        assert!(!omni.blocks_conduit_output(Direction::Left));

        let config = BlockConfig {
            liquid_output_directions: vec![Some(Direction::Right), Some(Direction::Left)],
            ..BlockConfig::default()
        };
        let sided = BlockType::new("sided", config, vec![r]).unwrap();
        assert!(!sided.blocks_conduit_output(Direction::Left));
        assert!(sided.blocks_conduit_output(Direction::Up));
    }

    // -----------------------------------------------------------------------
    // Test 9: Partial config from JSON
    // -----------------------------------------------------------------------
    #[test]
    fn partial_config_keeps_defaults() {
        let config: BlockConfig =
            serde_json::from_str(r#"{"item_capacity": 24, "dump_extra_liquid": false}"#).unwrap();
        assert_eq!(config.item_capacity, 24);
        assert!(!config.dump_extra_liquid);
        assert_eq!(config.dump_time, Fixed64::from_num(5));
        assert_eq!(config.item_output_directions, vec![None]);
        assert_eq!(config.size, 1);
    }
}
