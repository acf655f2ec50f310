//! Data-driven block definitions for the multi-recipe crafter.
//!
//! A block directory holds item, liquid and effect name lists plus one
//! block file, each in RON, JSON or TOML. [`load_block`] reads them,
//! resolves names to ids and returns a validated
//! [`BlockType`](multicrafter_core::block::BlockType).

pub mod loader;
pub mod schema;

pub use loader::{load_block, DataLoadError, LoadedBlock};
