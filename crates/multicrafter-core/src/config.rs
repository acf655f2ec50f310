//! Runtime configuration of a placed build.
//!
//! The host forwards player or logic commands as [`ConfigValue`]s. Every
//! value is tolerated: indices are clamped or ignored, never rejected.

use serde::{Deserialize, Serialize};

use crate::crafter::CrafterBuild;
use crate::routing::PackedRoute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigValue {
    /// Select a recipe; clamped into the catalog.
    Recipe(i32),
    /// Set one routing entry. `packed` is a [`PackedRoute`].
    Route { recipe: i32, packed: u32 },
    /// Back to the first recipe.
    Clear,
}

impl CrafterBuild {
    /// Apply a configuration value. Returns whether anything changed.
    pub fn configure(&mut self, value: ConfigValue) -> bool {
        match value {
            ConfigValue::Recipe(index) => self.set_recipe_index(i64::from(index)),
            ConfigValue::Route { recipe, packed } => {
                let Some(route) = PackedRoute::unpack(packed) else {
                    log::debug!("'{}': ignoring route with unknown kind {packed:#x}", self.block().name());
                    return false;
                };
                let recipe = self.block().clamp_index(i64::from(recipe));
                self.set_route(recipe, route.kind, usize::from(route.slot), route.direction)
            }
            ConfigValue::Clear => self.set_recipe_index(0),
        }
    }

    /// The value that reproduces this build's recipe selection.
    pub fn config_value(&self) -> ConfigValue {
        ConfigValue::Recipe(self.recipe_index() as i32)
    }
}
