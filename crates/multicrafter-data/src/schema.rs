//! Serde data file structs for crafter block definitions.
//!
//! Everything on disk uses human units: craft time in seconds, liquid and
//! power rates per second, directions as `-1..=3`, and items, liquids and
//! effects by name. The loader converts these into core types.

use serde::Deserialize;

// ===========================================================================
// Names
// ===========================================================================

/// An entry in the `items`, `liquids` or `effects` file.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedData {
    pub name: String,
}

// ===========================================================================
// Block
// ===========================================================================

/// A multi-recipe crafter block definition.
///
/// Every tuning field is optional; an absent field keeps the core default.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockData {
    pub name: String,
    #[serde(default)]
    pub item_capacity: Option<u32>,
    #[serde(default)]
    pub liquid_capacity: Option<f64>,
    #[serde(default)]
    pub item_capacity_multiplier: Option<f64>,
    #[serde(default)]
    pub liquid_capacity_multiplier: Option<f64>,
    #[serde(default)]
    pub overheat_scale: Option<f64>,
    #[serde(default)]
    pub max_heat_efficiency: Option<f64>,
    #[serde(default)]
    pub heat_output_warmup_rate: Option<f64>,
    /// Ticks between item dumps.
    #[serde(default)]
    pub dump_time: Option<f64>,
    #[serde(default)]
    pub dump_extra_liquid: Option<bool>,
    #[serde(default)]
    pub ignore_liquid_fullness: Option<bool>,
    /// Default side per item output slot; `-1` is omnidirectional.
    #[serde(default)]
    pub item_output_directions: Option<Vec<i32>>,
    #[serde(default)]
    pub liquid_output_directions: Option<Vec<i32>>,
    #[serde(default)]
    pub craft_effect: Option<String>,
    #[serde(default)]
    pub update_effect: Option<String>,
    #[serde(default)]
    pub update_effect_chance: Option<f64>,
    #[serde(default)]
    pub update_effect_spread: Option<f64>,
    #[serde(default)]
    pub size: Option<u32>,
    pub recipes: Vec<RecipeData>,
}

/// One recipe in a block's catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    #[serde(default)]
    pub name: Option<String>,
    /// Seconds per craft.
    #[serde(default = "default_craft_time")]
    pub craft_time: f64,
    #[serde(default)]
    pub inputs: Vec<(String, u32)>,
    #[serde(default)]
    pub outputs: Vec<(String, u32)>,
    /// Liquid consumed per second.
    #[serde(default)]
    pub liquid_inputs: Vec<(String, f64)>,
    /// Liquid produced per second.
    #[serde(default)]
    pub liquid_outputs: Vec<(String, f64)>,
    #[serde(default)]
    pub power_use: f64,
    #[serde(default)]
    pub power_produce: f64,
    #[serde(default)]
    pub heat_requirement: f64,
    #[serde(default)]
    pub heat_output: f64,
    #[serde(default)]
    pub craft_effect: Option<String>,
    #[serde(default)]
    pub update_effect: Option<String>,
    #[serde(default)]
    pub update_effect_chance: Option<f64>,
    #[serde(default)]
    pub update_effect_spread: Option<f64>,
    #[serde(default)]
    pub warmup_speed: Option<f64>,
}

fn default_craft_time() -> f64 {
    1.0
}

// ===========================================================================
// TOML wrappers (TOML does not support top-level arrays)
// ===========================================================================

/// Wrapper for a TOML block file, which keeps the definition under `[block]`.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlBlock {
    pub block: BlockData,
}

// ===========================================================================
// Tests
// ===========================================================================
