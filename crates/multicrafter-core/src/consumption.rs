//! Recipe-driven consumption.
//!
//! The active recipe decides what the build draws each tick. Nothing here is
//! stateful: the host evaluates these functions against the recipe the
//! build currently has selected and feeds the resulting efficiency back
//! into the tick.

use crate::fixed::{clamp01, Fixed64};
use crate::recipe::{ItemAmount, LiquidAmount, RecipeDef};
use crate::storage::Storage;

/// What one recipe draws while it runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceRequirements<'a> {
    /// Removed once per completed craft.
    pub items: &'a [ItemAmount],
    /// Drawn every running tick, per tick.
    pub liquids: &'a [LiquidAmount],
    /// Drawn every running tick, per tick.
    pub power: Fixed64,
}

impl ResourceRequirements<'_> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.liquids.is_empty() && self.power == Fixed64::ZERO
    }
}

pub fn required_resources(recipe: &RecipeDef) -> ResourceRequirements<'_> {
    ResourceRequirements {
        items: &recipe.item_inputs,
        liquids: &recipe.liquid_inputs,
        power: recipe.power_use,
    }
}

/// Fraction of the recipe's needs `storage` and the power grid can cover
/// this tick, in `[0, 1]`.
///
/// Items are all-or-nothing: a single short input stops the recipe. Liquids
/// and power scale it down proportionally.
pub fn availability(recipe: &RecipeDef, storage: &impl Storage, power_satisfaction: Fixed64) -> Fixed64 {
    let needs = required_resources(recipe);
    if needs.items.iter().any(|s| storage.item(s.item) < s.amount) {
        return Fixed64::ZERO;
    }

    let mut available = Fixed64::ONE;
    if needs.power > Fixed64::ZERO {
        available = available.min(clamp01(power_satisfaction));
    }
    for stack in needs.liquids {
        if stack.amount <= Fixed64::ZERO {
            continue;
        }
        let ratio = storage
            .liquid(stack.liquid)
            .checked_div(stack.amount)
            .unwrap_or(Fixed64::ONE);
        available = available.min(clamp01(ratio));
    }
    available
}

/// Efficiency handed to the tick: zero while consumption is blocked,
/// otherwise availability scaled by heat.
pub fn effective_efficiency(availability: Fixed64, should_consume: bool, efficiency_scale: Fixed64) -> Fixed64 {
    if !should_consume {
        return Fixed64::ZERO;
    }
    availability.saturating_mul(efficiency_scale)
}

/// Draw the recipe's liquid inputs for one tick at `efficiency`.
pub fn consume_continuous(recipe: &RecipeDef, storage: &mut impl Storage, efficiency: Fixed64, delta: Fixed64) {
    if efficiency <= Fixed64::ZERO {
        return;
    }
    for stack in &recipe.liquid_inputs {
        let amount = stack.amount.saturating_mul(efficiency).saturating_mul(delta);
        storage.remove_liquid(stack.liquid, amount);
    }
}
