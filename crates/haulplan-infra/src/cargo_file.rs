//! Cargo and route file loaders
//!
//! Cargo lists are CSV with a header row, or a JSON array of raw cargo
//! lines. Routes are JSON documents produced by the mapping service.

use std::fs;
use std::path::Path;

use haulplan_domain::model::Route;
use haulplan_domain::service::{LengthUnit, RawCargoItem, RawNumber, WeightUnit};
use haulplan_types::{Error, PlanError};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CargoFileError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid value in row {row}, column {column}: {value}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error(transparent)]
    Invalid(#[from] PlanError),
}

impl From<CargoFileError> for Error {
    fn from(e: CargoFileError) -> Self {
        match e {
            CargoFileError::IoError(io) => Error::Io(io),
            CargoFileError::Invalid(plan) => Error::Plan(plan),
            other => Error::CsvLoader(other.to_string()),
        }
    }
}

const REQUIRED_COLUMNS: [&str; 5] = ["description", "length", "width", "height", "weight"];

/// One CSV row. Numbers stay as text until normalization.
#[derive(Debug, Deserialize)]
struct CargoRow {
    #[serde(default)]
    id: Option<String>,
    description: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    quantity: Option<String>,
    length: String,
    width: String,
    height: String,
    weight: String,
    #[serde(default)]
    length_unit: Option<LengthUnit>,
    #[serde(default)]
    weight_unit: Option<WeightUnit>,
    #[serde(default)]
    stackable: Option<String>,
    #[serde(default)]
    bottom_only: Option<String>,
    #[serde(default)]
    max_stack_layers: Option<String>,
    #[serde(default)]
    fragile: Option<String>,
    #[serde(default)]
    hazmat: Option<String>,
    #[serde(default)]
    fixed_orientation: Option<String>,
}

fn parse_flag(value: Option<&str>, row: usize, column: &str) -> Result<bool, CargoFileError> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(false),
        Some("true" | "yes" | "y" | "1" | "x") => Ok(true),
        Some("false" | "no" | "n" | "0") => Ok(false),
        Some(other) => Err(CargoFileError::InvalidValue {
            row,
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_optional<T: std::str::FromStr>(
    value: Option<&str>,
    row: usize,
    column: &str,
) -> Result<Option<T>, CargoFileError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| CargoFileError::InvalidValue {
            row,
            column: column.to_string(),
            value: v.to_string(),
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CargoRow {
    fn into_raw(self, row: usize, source: &str) -> Result<RawCargoItem, CargoFileError> {
        Ok(RawCargoItem {
            stackable: parse_flag(self.stackable.as_deref(), row, "stackable")?,
            bottom_only: parse_flag(self.bottom_only.as_deref(), row, "bottom_only")?,
            fragile: parse_flag(self.fragile.as_deref(), row, "fragile")?,
            hazmat: parse_flag(self.hazmat.as_deref(), row, "hazmat")?,
            max_stack_layers: parse_optional(self.max_stack_layers.as_deref(), row, "max_stack_layers")?,
            fixed_orientation: parse_optional(
                self.fixed_orientation.as_deref(),
                row,
                "fixed_orientation",
            )?,
            id: non_empty(self.id),
            description: self.description,
            sku: non_empty(self.sku),
            quantity: non_empty(self.quantity).map(RawNumber::Text),
            length: RawNumber::Text(self.length),
            width: RawNumber::Text(self.width),
            height: RawNumber::Text(self.height),
            weight: RawNumber::Text(self.weight),
            length_unit: self.length_unit.unwrap_or_default(),
            weight_unit: self.weight_unit.unwrap_or_default(),
            geometry: None,
            source: Some(source.to_string()),
        })
    }
}

/// Parse cargo CSV text. `source` is recorded on every line.
pub fn parse_cargo_csv(content: &str, source: &str) -> Result<Vec<RawCargoItem>, CargoFileError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.eq_ignore_ascii_case(column)) {
            return Err(CargoFileError::MissingColumn(column.to_string()));
        }
    }
    let lowered: csv::StringRecord = headers.iter().map(|h| h.to_lowercase()).collect();
    reader.set_headers(lowered);

    let mut items = Vec::new();
    for (row_idx, result) in reader.deserialize::<CargoRow>().enumerate() {
        // +2: 0-based index plus the header row
        let row = row_idx + 2;
        items.push(result?.into_raw(row, source)?);
    }
    Ok(items)
}

/// Load raw cargo lines from a `.json` array or a CSV file
pub fn load_cargo(path: &Path) -> Result<Vec<RawCargoItem>, CargoFileError> {
    let content = fs::read_to_string(path)?;
    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let mut items: Vec<RawCargoItem> = serde_json::from_str(&content)?;
        for item in &mut items {
            item.source.get_or_insert_with(|| source.clone());
        }
        Ok(items)
    } else {
        parse_cargo_csv(&content, &source)
    }
}

/// Load a route with its per-state mileage
pub fn load_route(path: &Path) -> Result<Route, CargoFileError> {
    let content = fs::read_to_string(path)?;
    let mut route: Route = serde_json::from_str(&content)?;
    for entry in &mut route.state_mileage {
        entry.state = entry.state.trim().to_uppercase();
    }
    route.validate()?;
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Write;

    const CSV: &str = "\
ID,Description,Quantity,Length,Width,Height,Weight,Length_Unit,Weight_Unit,Stackable,Max_Stack_Layers
xfmr,Transformer,1,12,8.5,10,42000,ft,lb,,
crate,Crate,4,120,100,80,300,cm,kg,yes,2
";

    #[test]
    fn test_parse_cargo_csv() {
        let items = parse_cargo_csv(CSV, "manifest.csv").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id.as_deref(), Some("xfmr"));
        assert_eq!(items[0].length, RawNumber::Text("12".to_string()));
        assert_eq!(items[0].length_unit, LengthUnit::Ft);
        assert!(!items[0].stackable);
        assert_eq!(items[1].quantity, Some(RawNumber::Text("4".to_string())));
        assert_eq!(items[1].weight_unit, WeightUnit::Kg);
        assert!(items[1].stackable);
        assert_eq!(items[1].max_stack_layers, Some(2));
        assert_eq!(items[1].source.as_deref(), Some("manifest.csv"));
    }

    #[test]
    fn test_missing_column() {
        let err = parse_cargo_csv("description,length,width,height\nx,1,1,1\n", "f").unwrap_err();
        assert!(matches!(err, CargoFileError::MissingColumn(ref c) if c == "weight"));
    }

    #[test]
    fn test_bad_flag_names_row() {
        let csv = "description,length,width,height,weight,fragile\nx,1,1,1,1,maybe\n";
        let err = parse_cargo_csv(csv, "f").unwrap_err();
        assert!(matches!(err, CargoFileError::InvalidValue { row: 2, .. }));
    }

    #[test]
    fn test_load_json_cargo() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"description": "Beam", "length": 480, "width": "24", "height": 24, "weight": 3000}}]"#
        )
        .unwrap();
        let items = load_cargo(file.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].length, RawNumber::Number(480.0));
        assert_eq!(items[0].width, RawNumber::Text("24".to_string()));
        assert!(items[0].source.is_some());
    }

    #[test]
    fn test_load_route() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "pickup": {{"lat": 29.76, "lng": -95.36}},
                "dropoff": {{"lat": 35.47, "lng": -97.52}},
                "distance_miles": "450.5",
                "state_mileage": [
                    {{"state": "tx", "miles": 300}},
                    {{"state": "OK", "state_name": "Oklahoma", "miles": "150.5"}}
                ]
            }}"#
        )
        .unwrap();
        let route = load_route(file.path()).unwrap();
        assert_eq!(route.states(), vec!["TX", "OK"]);
        assert_eq!(route.state_mileage[1].miles, Decimal::new(1505, 1));
    }

    #[test]
    fn test_route_with_negative_miles_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "pickup": {{"lat": 29.76, "lng": -95.36}},
                "dropoff": {{"lat": 35.47, "lng": -97.52}},
                "distance_miles": 100,
                "state_mileage": [{{"state": "tx", "miles": -100}}]
            }}"#
        )
        .unwrap();
        let err = load_route(file.path()).unwrap_err();
        assert!(matches!(
            err,
            CargoFileError::Invalid(PlanError::InvalidNumber { ref field, .. }) if field == "miles in TX"
        ));
    }
}
