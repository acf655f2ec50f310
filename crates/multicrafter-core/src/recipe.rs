use crate::fixed::{per_second, seconds, Fixed64};
use crate::id::{EffectId, ItemTypeId, LiquidTypeId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Stacks
// ---------------------------------------------------------------------------

/// A whole-number amount of one item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAmount {
    pub item: ItemTypeId,
    pub amount: u32,
}

/// A liquid amount. For recipe inputs and outputs this is a per-tick rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidAmount {
    pub liquid: LiquidTypeId,
    pub amount: Fixed64,
}

impl ItemAmount {
    pub fn new(item: ItemTypeId, amount: u32) -> Self {
        Self { item, amount }
    }
}

impl LiquidAmount {
    pub fn new(liquid: LiquidTypeId, amount: Fixed64) -> Self {
        Self { liquid, amount }
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// A periodic effect rolled every running tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEffect {
    pub effect: EffectId,
    /// Probability per tick-equivalent of elapsed time.
    pub chance: Fixed64,
    /// Positional jitter per unit of block size.
    pub spread: Fixed64,
}

pub const DEFAULT_UPDATE_EFFECT_CHANCE: f64 = 0.04;
pub const DEFAULT_UPDATE_EFFECT_SPREAD: f64 = 4.0;
pub const DEFAULT_WARMUP_SPEED: f64 = 0.019;

// ---------------------------------------------------------------------------
// Recipe definition
// ---------------------------------------------------------------------------

/// One selectable recipe of a multi-recipe crafter.
///
/// Item inputs are removed on craft completion. Liquid inputs and outputs
/// are per-tick rates; outputs are produced continuously while running.
/// The position of an output in its list is its routing slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDef {
    /// Display key. Unnamed recipes are shown by index.
    pub name: Option<String>,
    /// Ticks per crafting cycle at efficiency 1.
    pub craft_time: Fixed64,
    pub item_inputs: Vec<ItemAmount>,
    pub liquid_inputs: Vec<LiquidAmount>,
    pub item_outputs: Vec<ItemAmount>,
    pub liquid_outputs: Vec<LiquidAmount>,
    /// Power drawn per tick while running.
    pub power_use: Fixed64,
    /// Power supplied per tick.
    pub power_produce: Fixed64,
    /// Heat needed for 100% efficiency. Zero disables heat input.
    pub heat_requirement: Fixed64,
    /// Heat produced at efficiency 1. Zero disables heat output.
    pub heat_output: Fixed64,
    /// Fired on craft completion. `None` uses the block default.
    pub craft_effect: Option<EffectId>,
    /// `None` uses the block default effect, chance and spread.
    pub update_effect: Option<UpdateEffect>,
    pub warmup_speed: Fixed64,
}

impl Default for RecipeDef {
    fn default() -> Self {
        Self {
            name: None,
            craft_time: seconds(Fixed64::ONE),
            item_inputs: Vec::new(),
            liquid_inputs: Vec::new(),
            item_outputs: Vec::new(),
            liquid_outputs: Vec::new(),
            power_use: Fixed64::ZERO,
            power_produce: Fixed64::ZERO,
            heat_requirement: Fixed64::ZERO,
            heat_output: Fixed64::ZERO,
            craft_effect: None,
            update_effect: None,
            warmup_speed: Fixed64::from_num(DEFAULT_WARMUP_SPEED),
        }
    }
}

impl RecipeDef {
    pub fn builder(name: &str) -> RecipeBuilder {
        RecipeBuilder::new(name)
    }

    pub fn requires_heat(&self) -> bool {
        self.heat_requirement > Fixed64::ZERO
    }

    pub fn produces_heat(&self) -> bool {
        self.heat_output > Fixed64::ZERO
    }

    /// The input stack for `item`, if the recipe takes it.
    pub fn item_input(&self, item: ItemTypeId) -> Option<&ItemAmount> {
        self.item_inputs.iter().find(|s| s.item == item)
    }

    pub fn liquid_input(&self, liquid: LiquidTypeId) -> Option<&LiquidAmount> {
        self.liquid_inputs.iter().find(|s| s.liquid == liquid)
    }

    /// Display label: the name if set, else `Recipe N` (1-based).
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Recipe {}", index + 1),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent construction of a [`RecipeDef`] using per-second units.
#[derive(Debug, Clone)]
pub struct RecipeBuilder {
    recipe: RecipeDef,
}

impl RecipeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            recipe: RecipeDef {
                name: Some(name.to_string()),
                ..RecipeDef::default()
            },
        }
    }

    pub fn craft_time_seconds(mut self, secs: f64) -> Self {
        self.recipe.craft_time = seconds(Fixed64::from_num(secs));
        self
    }

    pub fn craft_time_ticks(mut self, ticks: u32) -> Self {
        self.recipe.craft_time = Fixed64::from_num(ticks);
        self
    }

    pub fn item_in(mut self, item: ItemTypeId, amount: u32) -> Self {
        self.recipe.item_inputs.push(ItemAmount::new(item, amount));
        self
    }

    pub fn item_out(mut self, item: ItemTypeId, amount: u32) -> Self {
        self.recipe.item_outputs.push(ItemAmount::new(item, amount));
        self
    }

    pub fn liquid_in_per_second(mut self, liquid: LiquidTypeId, amount_per_second: f64) -> Self {
        let rate = per_second(Fixed64::from_num(amount_per_second));
        self.recipe.liquid_inputs.push(LiquidAmount::new(liquid, rate));
        self
    }

    pub fn liquid_out_per_second(mut self, liquid: LiquidTypeId, amount_per_second: f64) -> Self {
        let rate = per_second(Fixed64::from_num(amount_per_second));
        self.recipe.liquid_outputs.push(LiquidAmount::new(liquid, rate));
        self
    }

    /// Liquid output given directly as a per-tick rate.
    pub fn liquid_out_per_tick(mut self, liquid: LiquidTypeId, amount: Fixed64) -> Self {
        self.recipe.liquid_outputs.push(LiquidAmount::new(liquid, amount));
        self
    }

    pub fn power_use_per_second(mut self, power: f64) -> Self {
        self.recipe.power_use = per_second(Fixed64::from_num(power));
        self
    }

    pub fn power_produce_per_second(mut self, power: f64) -> Self {
        self.recipe.power_produce = per_second(Fixed64::from_num(power));
        self
    }

    pub fn heat_requirement(mut self, heat: f64) -> Self {
        self.recipe.heat_requirement = Fixed64::from_num(heat);
        self
    }

    pub fn heat_output(mut self, heat: f64) -> Self {
        self.recipe.heat_output = Fixed64::from_num(heat);
        self
    }

    pub fn craft_effect(mut self, effect: EffectId) -> Self {
        self.recipe.craft_effect = Some(effect);
        self
    }

    pub fn update_effect(mut self, effect: EffectId, chance: f64) -> Self {
        let spread = self
            .recipe
            .update_effect
            .map(|u| u.spread)
            .unwrap_or(Fixed64::from_num(DEFAULT_UPDATE_EFFECT_SPREAD));
        self.recipe.update_effect = Some(UpdateEffect {
            effect,
            chance: Fixed64::from_num(chance),
            spread,
        });
        self
    }

    /// Only meaningful after [`update_effect`](Self::update_effect).
    pub fn update_effect_spread(mut self, spread: f64) -> Self {
        if let Some(u) = &mut self.recipe.update_effect {
            u.spread = Fixed64::from_num(spread);
        }
        self
    }

    pub fn warmup_speed(mut self, speed: f64) -> Self {
        self.recipe.warmup_speed = Fixed64::from_num(speed);
        self
    }

    pub fn build(self) -> RecipeDef {
        self.recipe
    }
}
