//! Cargo item definitions

use haulplan_types::{Inches, Pounds};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rotation about the vertical axis, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Fixed try order used by the placement engine
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Quarter turns swap the item's length and width on the deck
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(format!("unsupported rotation {} (expected 0, 90, 180 or 270)", other)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> u16 {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A normalized cargo line
///
/// Dimensions are per unit; `quantity` identical units are planned
/// individually (see [`CargoItem::units`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoItem {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    /// Extent along the truck at rotation 0
    pub length: Inches,
    /// Extent across the truck at rotation 0
    pub width: Inches,
    pub height: Inches,
    /// Weight of one unit
    pub weight: Pounds,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub bottom_only: bool,
    /// Number of layers that may rest above this item when stackable
    #[serde(default)]
    pub max_stack_layers: u32,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub hazmat: bool,
    #[serde(default)]
    pub fixed_orientation: Option<Rotation>,
    /// Shape data for non-box cargo. Planning always uses the bounding box.
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
    /// Where the line came from (manual entry, import file, ...)
    #[serde(default)]
    pub source: Option<String>,
}

impl CargoItem {
    /// Weight of all units on this line
    pub fn total_weight(&self) -> Pounds {
        self.weight * i64::from(self.quantity)
    }

    /// (along, across) extents on the deck for a rotation
    pub fn footprint(&self, rotation: Rotation) -> (Inches, Inches) {
        if rotation.is_quarter_turn() {
            (self.width, self.length)
        } else {
            (self.length, self.width)
        }
    }

    pub fn footprint_area(&self) -> i128 {
        self.length.area(self.width)
    }

    /// Rotations the item may be placed in, in try order
    pub fn allowed_rotations(&self) -> Vec<Rotation> {
        match self.fixed_orientation {
            Some(rotation) => vec![rotation],
            None => Rotation::ALL.to_vec(),
        }
    }

    /// Whether other items may rest on top of this one
    pub fn supports_stacking(&self) -> bool {
        self.stackable && !self.fragile && self.max_stack_layers > 0
    }

    /// Split the line into single units.
    ///
    /// A line with quantity 1 keeps its id; larger lines produce
    /// `<id>#1`, `<id>#2`, ...
    pub fn units(&self) -> Vec<CargoItem> {
        if self.quantity <= 1 {
            let mut unit = self.clone();
            unit.quantity = 1;
            return vec![unit];
        }
        (1..=self.quantity)
            .map(|n| {
                let mut unit = self.clone();
                unit.id = format!("{}#{}", self.id, n);
                unit.quantity = 1;
                unit
            })
            .collect()
    }
}

/// Most units a single plan may expand into
pub const MAX_UNITS: u32 = 10_000;

/// Expand every line into single units, preserving input order
pub fn expand_units(items: &[CargoItem]) -> Vec<CargoItem> {
    items.iter().flat_map(CargoItem::units).collect()
}

/// Aggregate weight of a set of lines, saturating at the `Pounds` bound
pub fn aggregate_weight(items: &[CargoItem]) -> Pounds {
    items.iter().map(CargoItem::total_weight).sum()
}

/// Aggregate weight, or `None` if it does not fit a `Pounds`
pub fn checked_aggregate_weight(items: &[CargoItem]) -> Option<Pounds> {
    items.iter().try_fold(Pounds::ZERO, |total, item| {
        item.weight
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| total.checked_add(line))
    })
}

/// Number of units the lines expand into
pub fn unit_count(items: &[CargoItem]) -> u64 {
    items.iter().map(|i| u64::from(i.quantity.max(1))).sum()
}

#[cfg(test)]
pub(crate) fn test_item(id: &str, length: i64, width: i64, height: i64, weight: i64) -> CargoItem {
    CargoItem {
        id: id.to_string(),
        description: format!("item {}", id),
        sku: None,
        quantity: 1,
        length: Inches::from_whole(length),
        width: Inches::from_whole(width),
        height: Inches::from_whole(height),
        weight: Pounds::from_whole(weight),
        stackable: false,
        bottom_only: false,
        max_stack_layers: 0,
        fragile: false,
        hazmat: false,
        fixed_orientation: None,
        geometry: None,
        source: None,
    }
}
