//! Versioned save records for a single build.
//!
//! A record is one format-version byte followed by a `bitcode` body. The
//! body layout depends on the version; writers always emit
//! [`BUILD_FORMAT_VERSION`], readers accept every version up to it.

use serde::{Deserialize, Serialize};

use crate::block::BlockType;
use crate::crafter::CrafterBuild;
use crate::fixed::Fixed64;
use crate::routing::{Direction, OutputKind};
use crate::state::BuildState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current record version. Version 1 added the routing block.
pub const BUILD_FORMAT_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("empty build record")]
    Empty,
    #[error("build record from future version {0} (this build supports up to {BUILD_FORMAT_VERSION})")]
    FutureVersion(u8),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Record layouts
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct RecordV0 {
    recipe_index: i32,
    progress: Fixed64,
    warmup: Fixed64,
    total_progress: Fixed64,
    heat_out: Fixed64,
}

/// Directions of one recipe's output slots, as raw integers.
#[derive(Debug, Serialize, Deserialize)]
struct RecipeRoutes {
    items: Vec<i32>,
    liquids: Vec<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordV1 {
    recipe_index: i32,
    progress: Fixed64,
    warmup: Fixed64,
    total_progress: Fixed64,
    heat_out: Fixed64,
    routes: Vec<RecipeRoutes>,
}

fn encode<T: Serialize>(version: u8, record: &T) -> Result<Vec<u8>, SerializeError> {
    let body = bitcode::serialize(record).map_err(|e| SerializeError::Encode(e.to_string()))?;
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(version);
    out.extend_from_slice(&body);
    Ok(out)
}

fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, DeserializeError> {
    bitcode::deserialize(body).map_err(|e| DeserializeError::Decode(e.to_string()))
}

fn raw_directions(directions: &[Direction]) -> Vec<i32> {
    directions.iter().map(|d| i32::from(d.index())).collect()
}

// ---------------------------------------------------------------------------
// Write / read
// ---------------------------------------------------------------------------

/// Encode `state` at the current version.
pub fn write_build(state: &BuildState) -> Result<Vec<u8>, SerializeError> {
    let routing = &state.routing;
    let routes = (0..routing.recipe_count())
        .map(|recipe| RecipeRoutes {
            items: raw_directions(routing.table(recipe, OutputKind::Item)),
            liquids: raw_directions(routing.table(recipe, OutputKind::Liquid)),
        })
        .collect();
    let record = RecordV1 {
        recipe_index: state.recipe_index as i32,
        progress: state.progress,
        warmup: state.warmup,
        total_progress: state.total_progress,
        heat_out: state.heat_out,
        routes,
    };
    encode(BUILD_FORMAT_VERSION, &record)
}

/// Decode a record written for a build of `block`.
///
/// The stored recipe index is clamped into the catalog. Stored directions
/// keep only their low two bits; entries for recipes or slots the catalog
/// no longer has are dropped, and slots with no stored entry keep their
/// defaults.
pub fn read_build(block: &BlockType, data: &[u8]) -> Result<BuildState, DeserializeError> {
    let (&version, body) = data.split_first().ok_or(DeserializeError::Empty)?;

    let (base, routes) = match version {
        0 => (decode::<RecordV0>(body)?, Vec::new()),
        1 => {
            let r: RecordV1 = decode(body)?;
            let base = RecordV0 {
                recipe_index: r.recipe_index,
                progress: r.progress,
                warmup: r.warmup,
                total_progress: r.total_progress,
                heat_out: r.heat_out,
            };
            (base, r.routes)
        }
        v => return Err(DeserializeError::FutureVersion(v)),
    };

    let mut state = BuildState::new(block);
    let index = block.clamp_index(i64::from(base.recipe_index));
    if index as i64 != i64::from(base.recipe_index) {
        log::warn!(
            "'{}': stored recipe index {} out of range, using {}",
            block.name(),
            base.recipe_index,
            index,
        );
    }
    state.recipe_index = index;
    state.progress = base.progress;
    state.warmup = base.warmup;
    state.total_progress = base.total_progress;
    state.heat_out = base.heat_out;

    for (recipe, stored) in routes.iter().enumerate() {
        for (slot, &raw) in stored.items.iter().enumerate() {
            state.routing.set_route(recipe, OutputKind::Item, slot, Direction::from_bits(raw));
        }
        for (slot, &raw) in stored.liquids.iter().enumerate() {
            state.routing.set_route(recipe, OutputKind::Liquid, slot, Direction::from_bits(raw));
        }
    }

    Ok(state)
}

impl CrafterBuild {
    pub fn save(&self) -> Result<Vec<u8>, SerializeError> {
        write_build(&self.state)
    }

    /// Replace this build's state from a saved record.
    pub fn restore(&mut self, data: &[u8]) -> Result<(), DeserializeError> {
        self.state = read_build(self.block(), data)?;
        Ok(())
    }
}
