//! Placement results

use haulplan_types::{Inches, Pounds};
use serde::{Deserialize, Serialize};

use super::{CargoItem, DeckRegion, Rotation, TruckType};

/// A cargo unit bound to a truck position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub item: CargoItem,
    pub truck_index: usize,
    /// Distance from the front of the deck
    pub x: Inches,
    /// Distance from the left edge of the deck
    pub y: Inches,
    /// Height above the deck surface the item rests on
    pub z: Inches,
    pub rotation: Rotation,
    pub region: DeckRegion,
    /// Surface height above ground of the region
    pub surface_height: Inches,
    /// Index (within the truck) of the item this one rests on
    #[serde(default)]
    pub supported_by: Option<usize>,
}

impl PlacedItem {
    /// (along, across) extents after rotation
    pub fn footprint(&self) -> (Inches, Inches) {
        self.item.footprint(self.rotation)
    }

    pub fn top(&self) -> Inches {
        self.z + self.item.height
    }

    /// Height of the item's top above ground
    pub fn ground_height(&self) -> Inches {
        self.surface_height + self.top()
    }

    /// Whether the footprints of two items intersect with positive area
    pub fn footprint_overlaps(&self, other: &PlacedItem) -> bool {
        let (a_len, a_wid) = self.footprint();
        let (b_len, b_wid) = other.footprint();
        self.x < other.x + b_len
            && other.x < self.x + a_len
            && self.y < other.y + b_wid
            && other.y < self.y + a_wid
    }

    /// Whether the vertical extents of two items, measured from the
    /// ground, intersect
    pub fn height_band_overlaps(&self, other: &PlacedItem) -> bool {
        let a_bottom = self.surface_height + self.z;
        let b_bottom = other.surface_height + other.z;
        a_bottom < other.ground_height() && b_bottom < self.ground_height()
    }
}

/// Overall loaded dimensions of a truck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadDimensions {
    pub width: Inches,
    pub height: Inches,
    pub length: Inches,
    pub gross_weight: Pounds,
}

/// A truck configuration with its assigned cargo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedTruck {
    pub truck_index: usize,
    pub truck: TruckType,
    pub items: Vec<PlacedItem>,
    pub total_weight: Pounds,
    pub item_count: usize,
    pub dimensions: LoadDimensions,
    pub is_legal: bool,
    /// States along the route whose thresholds this load exceeds
    #[serde(default)]
    pub permits_required: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub score: f64,
}

impl PlacedTruck {
    /// Re-bind the truck (and its items) to a new position in a plan
    pub fn with_index(mut self, truck_index: usize) -> Self {
        self.truck_index = truck_index;
        for item in &mut self.items {
            item.truck_index = truck_index;
        }
        self
    }

    /// Footprint area of floor-level items in square hundredths
    pub fn floor_area_used(&self) -> i128 {
        self.items
            .iter()
            .filter(|p| p.supported_by.is_none())
            .map(|p| {
                let (along, across) = p.footprint();
                along.min(self.truck.deck_length).area(across.min(self.truck.deck_width))
            })
            .sum()
    }
}
