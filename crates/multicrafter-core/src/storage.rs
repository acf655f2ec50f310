//! Resource buffers a build crafts from and into.
//!
//! The core talks to buffers only through [`Storage`]; hosts with their own
//! inventory layout implement it directly. [`BuildStorage`] is a plain
//! map-backed implementation for hosts without one.
//!
//! Buffers do not enforce capacity. Capacity is the block's concern:
//! acceptance checks and consumption gating keep buffers in bounds, and a
//! produced item that nobody accepts is forced in regardless.

use crate::fixed::Fixed64;
use crate::id::{ItemTypeId, LiquidTypeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Item and liquid buffers of one build.
pub trait Storage {
    fn item(&self, item: ItemTypeId) -> u32;

    fn total_items(&self) -> u32;

    fn add_item(&mut self, item: ItemTypeId, amount: u32);

    /// Returns the amount actually removed.
    fn remove_item(&mut self, item: ItemTypeId, amount: u32) -> u32;

    fn liquid(&self, liquid: LiquidTypeId) -> Fixed64;

    fn add_liquid(&mut self, liquid: LiquidTypeId, amount: Fixed64);

    /// Returns the amount actually removed.
    fn remove_liquid(&mut self, liquid: LiquidTypeId, amount: Fixed64) -> Fixed64;

    fn has_item(&self, item: ItemTypeId) -> bool {
        self.item(item) > 0
    }
}

/// Map-backed [`Storage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStorage {
    items: BTreeMap<ItemTypeId, u32>,
    liquids: BTreeMap<LiquidTypeId, Fixed64>,
}

impl BuildStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: &[(ItemTypeId, u32)]) -> Self {
        let mut storage = Self::new();
        for &(item, amount) in items {
            storage.add_item(item, amount);
        }
        storage
    }
}

impl Storage for BuildStorage {
    fn item(&self, item: ItemTypeId) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    fn total_items(&self) -> u32 {
        self.items.values().sum()
    }

    fn add_item(&mut self, item: ItemTypeId, amount: u32) {
        if amount > 0 {
            *self.items.entry(item).or_insert(0) += amount;
        }
    }

    fn remove_item(&mut self, item: ItemTypeId, amount: u32) -> u32 {
        let Some(stored) = self.items.get_mut(&item) else {
            return 0;
        };
        let removed = amount.min(*stored);
        *stored -= removed;
        if *stored == 0 {
            self.items.remove(&item);
        }
        removed
    }

    fn liquid(&self, liquid: LiquidTypeId) -> Fixed64 {
        self.liquids.get(&liquid).copied().unwrap_or(Fixed64::ZERO)
    }

    fn add_liquid(&mut self, liquid: LiquidTypeId, amount: Fixed64) {
        if amount > Fixed64::ZERO {
            let stored = self.liquids.entry(liquid).or_insert(Fixed64::ZERO);
            *stored = stored.saturating_add(amount);
        }
    }

    fn remove_liquid(&mut self, liquid: LiquidTypeId, amount: Fixed64) -> Fixed64 {
        let Some(stored) = self.liquids.get_mut(&liquid) else {
            return Fixed64::ZERO;
        };
        let removed = amount.max(Fixed64::ZERO).min(*stored);
        *stored -= removed;
        removed
    }
}
