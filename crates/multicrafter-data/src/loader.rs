//! Resolution pipeline: reads a block directory, resolves names and builds a
//! validated [`BlockType`].
//!
//! A block directory holds up to four data files, each in RON, JSON or TOML:
//!
//! - `items` (required) -- item names, numbered in file order
//! - `liquids` -- liquid names, numbered in file order
//! - `effects` -- effect names, numbered in file order
//! - `block` (required) -- the block definition and its recipes

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use multicrafter_core::block::{BlockConfig, BlockError, BlockType};
use multicrafter_core::fixed::{per_second, Fixed64, TICKS_PER_SECOND};
use multicrafter_core::id::{EffectId, ItemTypeId, LiquidTypeId};
use multicrafter_core::recipe::{
    ItemAmount, LiquidAmount, RecipeDef, UpdateEffect, DEFAULT_UPDATE_EFFECT_CHANCE,
    DEFAULT_UPDATE_EFFECT_SPREAD,
};
use multicrafter_core::routing::Direction;
use serde::de::DeserializeOwned;

use crate::schema::{BlockData, NamedData, RecipeData, TomlBlock};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a block definition.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files share a base name but differ in format.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A number that has no fixed-point representation (NaN, infinite or
    /// out of range).
    #[error("invalid value {value} for '{field}' in {file}")]
    InvalidValue {
        file: PathBuf,
        field: String,
        value: f64,
    },

    #[error("invalid direction {value} in {file}: expected -1..=3")]
    InvalidDirection { file: PathBuf, value: i32 },

    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file from its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Find `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// More than one match is a [`DataLoadError::ConflictingFormats`].
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list. TOML files keep the array under `toml_key`; RON and
/// JSON files are the array itself.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

fn deserialize_block(path: &Path) -> Result<BlockData, DataLoadError> {
    if detect_format(path)? == Format::Toml {
        let wrapper: TomlBlock = deserialize_file(path)?;
        return Ok(wrapper.block);
    }
    deserialize_file(path)
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name, returning an `UnresolvedRef` error if it is missing.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Number a list of names in file order, rejecting duplicates.
fn number_names<V>(
    names: Vec<NamedData>,
    file: &Path,
    make_id: impl Fn(u32) -> V,
) -> Result<HashMap<String, V>, DataLoadError> {
    let mut map = HashMap::with_capacity(names.len());
    for (i, entry) in names.into_iter().enumerate() {
        if map.contains_key(&entry.name) {
            return Err(DataLoadError::DuplicateName {
                file: file.to_path_buf(),
                name: entry.name,
            });
        }
        map.insert(entry.name, make_id(i as u32));
    }
    Ok(map)
}

fn load_names<V>(
    dir: &Path,
    base_name: &str,
    required: bool,
    make_id: impl Fn(u32) -> V,
) -> Result<HashMap<String, V>, DataLoadError> {
    let path = if required {
        require_data_file(dir, base_name)?
    } else {
        match find_data_file(dir, base_name)? {
            Some(path) => path,
            None => return Ok(HashMap::new()),
        }
    };
    let names: Vec<NamedData> = deserialize_list(&path, base_name)?;
    debug!("{}: {} {base_name}", path.display(), names.len());
    number_names(names, &path, make_id)
}

// ===========================================================================
// Conversion
// ===========================================================================

/// Item, liquid and effect names in scope for one block file.
struct Names<'a> {
    file: &'a Path,
    items: &'a HashMap<String, ItemTypeId>,
    liquids: &'a HashMap<String, LiquidTypeId>,
    effects: &'a HashMap<String, EffectId>,
}

impl Names<'_> {
    fn item(&self, name: &str) -> Result<ItemTypeId, DataLoadError> {
        resolve_name(self.items, name, self.file, "item").copied()
    }

    fn liquid(&self, name: &str) -> Result<LiquidTypeId, DataLoadError> {
        resolve_name(self.liquids, name, self.file, "liquid").copied()
    }

    fn effect(&self, name: &str) -> Result<EffectId, DataLoadError> {
        resolve_name(self.effects, name, self.file, "effect").copied()
    }

    fn fixed(&self, field: &str, value: f64) -> Result<Fixed64, DataLoadError> {
        Fixed64::checked_from_num(value).ok_or_else(|| DataLoadError::InvalidValue {
            file: self.file.to_path_buf(),
            field: field.to_string(),
            value,
        })
    }

    fn ticks(&self, field: &str, secs: f64) -> Result<Fixed64, DataLoadError> {
        self.fixed(field, secs)?
            .checked_mul(Fixed64::from_num(TICKS_PER_SECOND))
            .ok_or_else(|| DataLoadError::InvalidValue {
                file: self.file.to_path_buf(),
                field: field.to_string(),
                value: secs,
            })
    }

    fn rate(&self, field: &str, amount_per_second: f64) -> Result<Fixed64, DataLoadError> {
        Ok(per_second(self.fixed(field, amount_per_second)?))
    }

    fn directions(&self, values: &[i32]) -> Result<Vec<Option<Direction>>, DataLoadError> {
        values
            .iter()
            .map(|&value| {
                if (-1..=3).contains(&value) {
                    Ok(Direction::from_signed(value))
                } else {
                    Err(DataLoadError::InvalidDirection {
                        file: self.file.to_path_buf(),
                        value,
                    })
                }
            })
            .collect()
    }
}

fn convert_config(data: &BlockData, names: &Names) -> Result<BlockConfig, DataLoadError> {
    let mut config = BlockConfig::default();

    if let Some(v) = data.item_capacity {
        config.item_capacity = v;
    }
    if let Some(size) = data.size {
        config.size = size;
    }
    let fixed_fields = [
        ("liquid_capacity", data.liquid_capacity, &mut config.liquid_capacity),
        (
            "item_capacity_multiplier",
            data.item_capacity_multiplier,
            &mut config.item_capacity_multiplier,
        ),
        (
            "liquid_capacity_multiplier",
            data.liquid_capacity_multiplier,
            &mut config.liquid_capacity_multiplier,
        ),
        ("overheat_scale", data.overheat_scale, &mut config.overheat_scale),
        ("max_heat_efficiency", data.max_heat_efficiency, &mut config.max_heat_efficiency),
        (
            "heat_output_warmup_rate",
            data.heat_output_warmup_rate,
            &mut config.heat_output_warmup_rate,
        ),
        ("dump_time", data.dump_time, &mut config.dump_time),
        (
            "update_effect_chance",
            data.update_effect_chance,
            &mut config.default_update_effect_chance,
        ),
        (
            "update_effect_spread",
            data.update_effect_spread,
            &mut config.default_update_effect_spread,
        ),
    ];
    for (field, value, slot) in fixed_fields {
        if let Some(v) = value {
            *slot = names.fixed(field, v)?;
        }
    }

    if let Some(v) = data.dump_extra_liquid {
        config.dump_extra_liquid = v;
    }
    if let Some(v) = data.ignore_liquid_fullness {
        config.ignore_liquid_fullness = v;
    }
    if let Some(dirs) = &data.item_output_directions {
        config.item_output_directions = names.directions(dirs)?;
    }
    if let Some(dirs) = &data.liquid_output_directions {
        config.liquid_output_directions = names.directions(dirs)?;
    }
    config.default_craft_effect = data.craft_effect.as_deref().map(|n| names.effect(n)).transpose()?;
    config.default_update_effect = data.update_effect.as_deref().map(|n| names.effect(n)).transpose()?;

    Ok(config)
}

fn convert_recipe(data: &RecipeData, names: &Names) -> Result<RecipeDef, DataLoadError> {
    let item_stacks = |stacks: &[(String, u32)]| -> Result<Vec<ItemAmount>, DataLoadError> {
        stacks
            .iter()
            .map(|(name, amount)| Ok(ItemAmount::new(names.item(name)?, *amount)))
            .collect()
    };
    let liquid_stacks = |field: &str, stacks: &[(String, f64)]| -> Result<Vec<LiquidAmount>, DataLoadError> {
        stacks
            .iter()
            .map(|(name, rate)| Ok(LiquidAmount::new(names.liquid(name)?, names.rate(field, *rate)?)))
            .collect()
    };

    let update_effect = match &data.update_effect {
        Some(name) => Some(UpdateEffect {
            effect: names.effect(name)?,
            chance: names.fixed(
                "update_effect_chance",
                data.update_effect_chance.unwrap_or(DEFAULT_UPDATE_EFFECT_CHANCE),
            )?,
            spread: names.fixed(
                "update_effect_spread",
                data.update_effect_spread.unwrap_or(DEFAULT_UPDATE_EFFECT_SPREAD),
            )?,
        }),
        None => None,
    };

    let mut recipe = RecipeDef {
        name: data.name.clone(),
        craft_time: names.ticks("craft_time", data.craft_time)?,
        item_inputs: item_stacks(&data.inputs)?,
        liquid_inputs: liquid_stacks("liquid_inputs", &data.liquid_inputs)?,
        item_outputs: item_stacks(&data.outputs)?,
        liquid_outputs: liquid_stacks("liquid_outputs", &data.liquid_outputs)?,
        power_use: names.rate("power_use", data.power_use)?,
        power_produce: names.rate("power_produce", data.power_produce)?,
        heat_requirement: names.fixed("heat_requirement", data.heat_requirement)?,
        heat_output: names.fixed("heat_output", data.heat_output)?,
        craft_effect: data.craft_effect.as_deref().map(|n| names.effect(n)).transpose()?,
        update_effect,
        ..RecipeDef::default()
    };
    if let Some(speed) = data.warmup_speed {
        recipe.warmup_speed = names.fixed("warmup_speed", speed)?;
    }
    Ok(recipe)
}

// ===========================================================================
// Loading pipeline
// ===========================================================================

/// A block type together with the name tables used to build it.
#[derive(Debug)]
pub struct LoadedBlock {
    pub block: BlockType,
    pub items: HashMap<String, ItemTypeId>,
    pub liquids: HashMap<String, LiquidTypeId>,
    pub effects: HashMap<String, EffectId>,
}

impl LoadedBlock {
    pub fn item(&self, name: &str) -> Option<ItemTypeId> {
        self.items.get(name).copied()
    }

    pub fn liquid(&self, name: &str) -> Option<LiquidTypeId> {
        self.liquids.get(name).copied()
    }

    pub fn effect(&self, name: &str) -> Option<EffectId> {
        self.effects.get(name).copied()
    }
}

/// Load and validate the block defined in `dir`.
pub fn load_block(dir: &Path) -> Result<LoadedBlock, DataLoadError> {
    let items = load_names(dir, "items", true, ItemTypeId)?;
    let liquids = load_names(dir, "liquids", false, LiquidTypeId)?;
    let effects = load_names(dir, "effects", false, EffectId)?;

    let block_path = require_data_file(dir, "block")?;
    let data = deserialize_block(&block_path)?;
    let names = Names {
        file: &block_path,
        items: &items,
        liquids: &liquids,
        effects: &effects,
    };

    let config = convert_config(&data, &names)?;
    let recipes = data
        .recipes
        .iter()
        .map(|r| convert_recipe(r, &names))
        .collect::<Result<Vec<_>, _>>()?;
    let block = BlockType::new(&data.name, config, recipes)?;

    info!(
        "loaded block '{}' from {}: {} recipes",
        block.name(),
        block_path.display(),
        block.recipe_count()
    );
    Ok(LoadedBlock {
        block,
        items,
        liquids,
        effects,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
