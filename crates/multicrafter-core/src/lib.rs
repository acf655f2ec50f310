//! MultiCrafter Core -- a multi-recipe crafting block for tick-driven
//! factory simulations.
//!
//! One block type carries a catalog of recipes; each placed build selects
//! one at a time and keeps its own progress, warmup, heat and per-recipe
//! output routing. The host engine owns buffers, neighbors and power and
//! calls into this crate once per tick.
//!
//! # Tick
//!
//! Each call to [`crafter::CrafterBuild::tick`]:
//!
//! 1. **Heat** -- Sum side heat when the recipe needs it.
//! 2. **Advance** -- With positive efficiency, add progress, approach the
//!    warmup target, emit continuous liquid output and roll the update
//!    effect. Otherwise warmup decays.
//! 3. **Heat output** -- Approach the recipe's heat output times efficiency.
//! 4. **Accumulate** -- Add warmup-weighted time to total progress.
//! 5. **Craft** -- At progress 1, remove inputs and offload every output
//!    unit along its route.
//! 6. **Dump** -- Drain buffered items (on a timer) and liquids.
//!
//! # Key Types
//!
//! - [`block::BlockType`] -- Validated recipe catalog plus derived
//!   capabilities, shared by every build of the type.
//! - [`recipe::RecipeDef`] -- One recipe; built with [`recipe::RecipeBuilder`].
//! - [`crafter::CrafterBuild`] -- A placed build and its tick.
//! - [`routing::OutputRouter`] -- Per-recipe, per-slot output sides.
//! - [`storage::Storage`] / [`proximity::Proximity`] -- Host-side buffers and
//!   neighbors.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`serialize`] -- Versioned save records via bitcode.

pub mod block;
pub mod config;
pub mod consumption;
pub mod crafter;
pub mod dump;
pub mod fixed;
pub mod heat;
pub mod id;
pub mod proximity;
pub mod recipe;
pub mod rng;
pub mod routing;
pub mod serialize;
pub mod state;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
