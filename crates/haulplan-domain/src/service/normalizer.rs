//! Boundary normalization of cargo input
//!
//! Raw values arrive as JSON numbers or text in assorted units. They are
//! converted to fixed-point inches, pounds and cents, rounding half-up.

use std::str::FromStr;

use haulplan_types::{Cents, Inches, PlanError, Pounds};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{CargoItem, Rotation, MAX_UNITS};

/// A numeric field as received at the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    pub fn to_decimal(&self, field: &str) -> Result<Decimal, PlanError> {
        let invalid = || PlanError::InvalidNumber {
            field: field.to_string(),
            value: self.to_string(),
        };
        match self {
            RawNumber::Number(n) => Decimal::from_f64(*n).ok_or_else(invalid),
            RawNumber::Text(s) => {
                let cleaned = s.trim();
                Decimal::from_str(cleaned)
                    .or_else(|_| Decimal::from_scientific(cleaned))
                    .map_err(|_| invalid())
            }
        }
    }
}

impl std::fmt::Display for RawNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawNumber::Number(n) => write!(f, "{}", n),
            RawNumber::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for RawNumber {
    fn from(n: f64) -> Self {
        RawNumber::Number(n)
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        RawNumber::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    #[serde(alias = "inches")]
    In,
    #[serde(alias = "feet")]
    Ft,
    Cm,
    Mm,
    M,
}

impl LengthUnit {
    /// `None` when the converted value overflows
    pub fn to_inches(self, value: Decimal) -> Option<Decimal> {
        let scaled = |num: i64, den: i64| {
            value
                .checked_mul(Decimal::from(num))
                .and_then(|v| v.checked_div(Decimal::from(den)))
        };
        match self {
            LengthUnit::In => Some(value),
            LengthUnit::Ft => scaled(12, 1),
            LengthUnit::Cm => scaled(100, 254),
            LengthUnit::Mm => scaled(10, 254),
            LengthUnit::M => scaled(10_000, 254),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    #[serde(alias = "pounds")]
    Lb,
    Kg,
    /// Short ton (2,000 lb)
    Ton,
    /// Metric tonne
    #[serde(rename = "t")]
    Tonne,
}

impl WeightUnit {
    /// `None` when the converted value overflows
    pub fn to_pounds(self, value: Decimal) -> Option<Decimal> {
        // 1 kg = 2.20462262185 lb
        let lb_per_kg = Decimal::new(220_462_262_185, 11);
        match self {
            WeightUnit::Lb => Some(value),
            WeightUnit::Kg => value.checked_mul(lb_per_kg),
            WeightUnit::Ton => value.checked_mul(Decimal::from(2_000)),
            WeightUnit::Tonne => value
                .checked_mul(lb_per_kg)
                .and_then(|v| v.checked_mul(Decimal::from(1_000))),
        }
    }
}

/// Cargo line as submitted by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCargoItem {
    #[serde(default)]
    pub id: Option<String>,
    pub description: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub quantity: Option<RawNumber>,
    pub length: RawNumber,
    pub width: RawNumber,
    pub height: RawNumber,
    pub weight: RawNumber,
    #[serde(default)]
    pub length_unit: LengthUnit,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub bottom_only: bool,
    #[serde(default)]
    pub max_stack_layers: Option<u32>,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub hazmat: bool,
    #[serde(default)]
    pub fixed_orientation: Option<u16>,
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
    #[serde(default)]
    pub source: Option<String>,
}

pub fn normalize_length(raw: &RawNumber, unit: LengthUnit, field: &str) -> Result<Inches, PlanError> {
    let inches = unit
        .to_inches(raw.to_decimal(field)?)
        .and_then(Inches::from_decimal)
        .ok_or_else(|| PlanError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        })?;
    if !inches.is_positive() {
        return Err(PlanError::InvalidDimension {
            field: field.to_string(),
            value: raw.to_string(),
        });
    }
    Ok(inches)
}

pub fn normalize_weight(raw: &RawNumber, unit: WeightUnit) -> Result<Pounds, PlanError> {
    let pounds = unit
        .to_pounds(raw.to_decimal("weight")?)
        .and_then(Pounds::from_decimal)
        .ok_or_else(|| PlanError::InvalidNumber {
            field: "weight".to_string(),
            value: raw.to_string(),
        })?;
    if !pounds.is_positive() {
        return Err(PlanError::InvalidDimension {
            field: "weight".to_string(),
            value: raw.to_string(),
        });
    }
    Ok(pounds)
}

/// Whole quantity between one and `MAX_UNITS`; missing means one
pub fn normalize_quantity(raw: Option<&RawNumber>) -> Result<u32, PlanError> {
    let Some(raw) = raw else {
        return Ok(1);
    };
    let invalid = || PlanError::InvalidQuantity {
        value: raw.to_string(),
    };
    let value = raw.to_decimal("quantity").map_err(|_| invalid())?;
    if value < Decimal::ONE || !value.fract().is_zero() {
        return Err(invalid());
    }
    value
        .to_u32()
        .filter(|q| *q <= MAX_UNITS)
        .ok_or_else(invalid)
}

/// Dollar amount such as `"$1,250.505"` or `1250.5` to cents
pub fn parse_currency(raw: &RawNumber, field: &str) -> Result<Cents, PlanError> {
    let decimal = match raw {
        RawNumber::Text(s) => {
            let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
            RawNumber::Text(cleaned).to_decimal(field)?
        }
        RawNumber::Number(_) => raw.to_decimal(field)?,
    };
    Cents::from_decimal_dollars(decimal).ok_or_else(|| PlanError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

pub fn normalize_item(raw: &RawCargoItem) -> Result<CargoItem, PlanError> {
    let quantity = normalize_quantity(raw.quantity.as_ref())?;
    let length = normalize_length(&raw.length, raw.length_unit, "length")?;
    let width = normalize_length(&raw.width, raw.length_unit, "width")?;
    let height = normalize_length(&raw.height, raw.length_unit, "height")?;
    let weight = normalize_weight(&raw.weight, raw.weight_unit)?;

    let fixed_orientation = raw
        .fixed_orientation
        .map(Rotation::try_from)
        .transpose()
        .map_err(|_| PlanError::InvalidNumber {
            field: "fixed_orientation".to_string(),
            value: raw.fixed_orientation.map(|d| d.to_string()).unwrap_or_default(),
        })?;

    let max_stack_layers = if raw.stackable {
        raw.max_stack_layers.unwrap_or(1)
    } else {
        0
    };

    Ok(CargoItem {
        id: raw
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        description: raw.description.trim().to_string(),
        sku: raw.sku.clone().filter(|s| !s.trim().is_empty()),
        quantity,
        length,
        width,
        height,
        weight,
        stackable: raw.stackable,
        bottom_only: raw.bottom_only,
        max_stack_layers,
        fragile: raw.fragile,
        hazmat: raw.hazmat,
        fixed_orientation,
        geometry: raw.geometry.clone(),
        source: raw.source.clone(),
    })
}

/// Normalize all lines, failing on the first invalid one
pub fn normalize_items(raw: &[RawCargoItem]) -> Result<Vec<CargoItem>, PlanError> {
    raw.iter().map(normalize_item).collect()
}

#[cfg(test)]
pub(crate) fn raw_item(length: f64, width: f64, height: f64, weight: f64) -> RawCargoItem {
    RawCargoItem {
        id: None,
        description: "Crate".to_string(),
        sku: None,
        quantity: None,
        length: length.into(),
        width: width.into(),
        height: height.into(),
        weight: weight.into(),
        length_unit: LengthUnit::In,
        weight_unit: WeightUnit::Lb,
        stackable: false,
        bottom_only: false,
        max_stack_layers: None,
        fragile: false,
        hazmat: false,
        fixed_orientation: None,
        geometry: None,
        source: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic_item() {
        let item = normalize_item(&raw_item(48.0, 40.0, 36.5, 1200.0)).unwrap();
        assert_eq!(item.length, Inches::from_whole(48));
        assert_eq!(item.height.hundredths(), 3650);
        assert_eq!(item.weight, Pounds::from_whole(1200));
        assert_eq!(item.quantity, 1);
        assert!(!item.id.is_empty());
    }

    #[test]
    fn test_text_values_round_half_up() {
        let mut raw = raw_item(1.0, 1.0, 1.0, 1.0);
        raw.length = "96.125".into();
        raw.weight = " 2500.005 ".into();
        let item = normalize_item(&raw).unwrap();
        assert_eq!(item.length.hundredths(), 9613);
        assert_eq!(item.weight.hundredths(), 250_001);
    }

    #[test]
    fn test_unit_conversion() {
        let mut raw = raw_item(10.0, 2.54, 1.0, 1000.0);
        raw.length_unit = LengthUnit::Cm;
        raw.weight_unit = WeightUnit::Kg;
        let item = normalize_item(&raw).unwrap();
        assert_eq!(item.width, Inches::from_whole(1));
        assert_eq!(item.length.hundredths(), 394);
        assert_eq!(item.weight.hundredths(), 220_462);

        let ft = normalize_length(&RawNumber::Number(8.5), LengthUnit::Ft, "width").unwrap();
        assert_eq!(ft, Inches::from_whole(102));
        let tons = normalize_weight(&RawNumber::Number(2.5), WeightUnit::Ton).unwrap();
        assert_eq!(tons, Pounds::from_whole(5000));
    }

    #[test]
    fn test_zero_or_negative_dimension_rejected() {
        let err = normalize_item(&raw_item(0.0, 10.0, 10.0, 10.0)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidDimension { ref field, .. } if field == "length"));

        let err = normalize_item(&raw_item(10.0, 10.0, -3.0, 10.0)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidDimension { ref field, .. } if field == "height"));

        let err = normalize_item(&raw_item(10.0, 10.0, 10.0, 0.0)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidDimension { ref field, .. } if field == "weight"));

        // rounds to 0.00
        let err = normalize_item(&raw_item(0.001, 10.0, 10.0, 10.0)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidDimension { .. }));
    }

    #[test]
    fn test_quantity_validation() {
        assert_eq!(normalize_quantity(None).unwrap(), 1);
        assert_eq!(normalize_quantity(Some(&"3".into())).unwrap(), 3);
        assert_eq!(normalize_quantity(Some(&RawNumber::Number(4.0))).unwrap(), 4);
        for bad in [RawNumber::Number(0.0), RawNumber::Number(-1.0), RawNumber::Number(1.5)] {
            assert!(matches!(
                normalize_quantity(Some(&bad)),
                Err(PlanError::InvalidQuantity { .. })
            ));
        }
    }

    #[test]
    fn test_huge_values_are_errors() {
        let max = RawNumber::Text("79228162514264337593543950335".to_string());
        assert!(matches!(
            normalize_weight(&max, WeightUnit::Ton),
            Err(PlanError::InvalidNumber { .. })
        ));
        assert!(matches!(
            normalize_weight(&max, WeightUnit::Tonne),
            Err(PlanError::InvalidNumber { .. })
        ));
        assert!(matches!(
            normalize_length(&max, LengthUnit::M, "length"),
            Err(PlanError::InvalidNumber { .. })
        ));
        // Fits a Decimal but not i64 hundredths
        assert!(matches!(
            normalize_length(&"1e20".into(), LengthUnit::In, "length"),
            Err(PlanError::InvalidNumber { .. })
        ));

        assert_eq!(normalize_quantity(Some(&RawNumber::Number(10_000.0))).unwrap(), 10_000);
        for bad in ["10001", "4294967295", "1e12"] {
            assert!(matches!(
                normalize_quantity(Some(&bad.into())),
                Err(PlanError::InvalidQuantity { .. })
            ));
        }
    }

    #[test]
    fn test_garbage_text_is_invalid_number() {
        let mut raw = raw_item(1.0, 1.0, 1.0, 1.0);
        raw.width = "wide".into();
        assert!(matches!(
            normalize_item(&raw),
            Err(PlanError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_stacking_defaults() {
        let mut raw = raw_item(10.0, 10.0, 10.0, 10.0);
        raw.stackable = true;
        assert_eq!(normalize_item(&raw).unwrap().max_stack_layers, 1);
        raw.stackable = false;
        raw.max_stack_layers = Some(3);
        assert_eq!(normalize_item(&raw).unwrap().max_stack_layers, 0);
    }

    #[test]
    fn test_invalid_orientation() {
        let mut raw = raw_item(10.0, 10.0, 10.0, 10.0);
        raw.fixed_orientation = Some(45);
        assert!(normalize_item(&raw).is_err());
        raw.fixed_orientation = Some(90);
        assert_eq!(
            normalize_item(&raw).unwrap().fixed_orientation,
            Some(Rotation::Deg90)
        );
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency(&"$1,250.505".into(), "fee").unwrap(), Cents::new(125_051));
        assert_eq!(parse_currency(&RawNumber::Number(99.99), "fee").unwrap(), Cents::new(9_999));
    }

    #[test]
    fn test_raw_item_from_json() {
        let json = r#"{"description":"Press","length":"10","width":8,"height":7.5,
                       "weight":"12","length_unit":"ft","weight_unit":"ton","quantity":"2"}"#;
        let raw: RawCargoItem = serde_json::from_str(json).unwrap();
        let item = normalize_item(&raw).unwrap();
        assert_eq!(item.length, Inches::from_whole(120));
        assert_eq!(item.height, Inches::from_whole(90));
        assert_eq!(item.weight, Pounds::from_whole(24_000));
        assert_eq!(item.quantity, 2);
    }
}
