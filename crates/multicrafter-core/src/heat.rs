//! Heat input and output math.
//!
//! Heat requirement scales efficiency and gates warmup. Heat above the
//! requirement overdrives the block up to a configured cap.

use crate::block::BlockConfig;
use crate::fixed::{clamp01, Fixed64};
use crate::recipe::RecipeDef;

/// Total heat arriving from the four sides. Negative samples count as zero.
pub fn calculate_heat(side_heat: &[Fixed64; 4]) -> Fixed64 {
    side_heat
        .iter()
        .copied()
        .map(|h| h.max(Fixed64::ZERO))
        .fold(Fixed64::ZERO, Fixed64::saturating_add)
}

/// Efficiency multiplier from heat. `1` for recipes without a heat
/// requirement; otherwise the satisfied fraction plus the overheat bonus,
/// capped at `max_heat_efficiency`.
pub fn efficiency_scale(recipe: &RecipeDef, config: &BlockConfig, heat_in: Fixed64) -> Fixed64 {
    if !recipe.requires_heat() {
        return Fixed64::ONE;
    }
    let req = recipe.heat_requirement;
    let over = (heat_in - req).max(Fixed64::ZERO);
    let bonus = over.saturating_div(req).saturating_mul(config.overheat_scale);
    let scale = clamp01(heat_in.saturating_div(req)).saturating_add(bonus);
    scale.min(config.max_heat_efficiency)
}

/// Level warmup settles at while running: the satisfied heat fraction, or
/// `1` without a heat requirement.
pub fn warmup_target(recipe: &RecipeDef, heat_in: Fixed64) -> Fixed64 {
    if !recipe.requires_heat() {
        return Fixed64::ONE;
    }
    clamp01(heat_in.saturating_div(recipe.heat_requirement))
}
