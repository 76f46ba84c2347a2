//! Reference data loaders from TOML
//!
//! The truck catalog, legal threshold table and fee schedules are read-only
//! inputs to planning. Each has a `load_*` (file) and `parse_*` (string)
//! entry point.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use haulplan_domain::model::{
    FeeSchedule, StateThresholdOverride, StateThresholds, ThresholdTable, TruckCatalog, TruckType,
};
use haulplan_types::{ConfigError, Error, Result};
use serde::Deserialize;
use tracing::debug;

fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to read {} file {}: {}",
            what,
            path.display(),
            e
        )))
    })
}

fn parse_error(what: &str, detail: impl std::fmt::Display) -> Error {
    Error::Config(ConfigError::ParseError(format!(
        "Failed to parse {} TOML: {}",
        what, detail
    )))
}

/// Container for parsing catalog files
#[derive(Debug, Deserialize)]
struct CatalogFile {
    trucks: Vec<TruckType>,
}

/// Load a truck catalog from a TOML file
pub fn load_catalog(path: &Path) -> Result<TruckCatalog> {
    let catalog = parse_catalog(&read(path, "truck catalog")?)?;
    debug!(path = %path.display(), trucks = catalog.len(), "loaded truck catalog");
    Ok(catalog)
}

/// Parse `[[trucks]]` rows, rejecting duplicate ids and empty decks
pub fn parse_catalog(toml_content: &str) -> Result<TruckCatalog> {
    let file: CatalogFile =
        toml::from_str(toml_content).map_err(|e| parse_error("truck catalog", e))?;

    let mut seen = HashSet::new();
    for truck in &file.trucks {
        if !seen.insert(truck.id.as_str()) {
            return Err(parse_error(
                "truck catalog",
                format!("duplicate truck id '{}'", truck.id),
            ));
        }
        if !truck.deck_length.is_positive()
            || !truck.deck_width.is_positive()
            || !truck.max_cargo_weight.is_positive()
        {
            return Err(parse_error(
                "truck catalog",
                format!("truck '{}' needs a positive deck size and capacity", truck.id),
            ));
        }
    }
    Ok(TruckCatalog::new(file.trucks))
}

#[derive(Debug, Deserialize)]
struct StateOverrideRow {
    state: String,
    #[serde(flatten)]
    thresholds: StateThresholdOverride,
}

#[derive(Debug, Default, Deserialize)]
struct ThresholdFile {
    /// Deviations from the built-in federal defaults
    #[serde(default)]
    federal: StateThresholdOverride,
    #[serde(default)]
    states: Vec<StateOverrideRow>,
}

/// Load a legal threshold table from a TOML file
pub fn load_thresholds(path: &Path) -> Result<ThresholdTable> {
    let table = parse_thresholds(&read(path, "threshold")?)?;
    debug!(path = %path.display(), states = table.states.len(), "loaded threshold table");
    Ok(table)
}

/// Parse a `[federal]` section and `[[states]]` overrides
pub fn parse_thresholds(toml_content: &str) -> Result<ThresholdTable> {
    let file: ThresholdFile =
        toml::from_str(toml_content).map_err(|e| parse_error("threshold", e))?;
    let states: BTreeMap<String, StateThresholdOverride> = file
        .states
        .into_iter()
        .map(|row| (row.state.trim().to_uppercase(), row.thresholds))
        .collect();
    Ok(ThresholdTable {
        federal: file.federal.apply(StateThresholds::federal()),
        states,
    })
}

/// Load a tenant fee schedule from a TOML file
pub fn load_fee_schedule(path: &Path) -> Result<FeeSchedule> {
    let schedule = parse_fee_schedule(&read(path, "fee schedule")?)?;
    debug!(
        path = %path.display(),
        tenant = %schedule.tenant_id,
        states = schedule.states.len(),
        "loaded fee schedule"
    );
    Ok(schedule)
}

/// Parse a fee schedule; state keys are normalized to upper case
pub fn parse_fee_schedule(toml_content: &str) -> Result<FeeSchedule> {
    let mut schedule: FeeSchedule =
        toml::from_str(toml_content).map_err(|e| parse_error("fee schedule", e))?;
    schedule.states = schedule
        .states
        .into_iter()
        .map(|(state, rates)| (state.trim().to_uppercase(), rates))
        .collect();
    Ok(schedule)
}
