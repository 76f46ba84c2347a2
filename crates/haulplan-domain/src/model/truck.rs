//! Truck and trailer reference data

use haulplan_types::{Inches, Pounds};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trailer category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TruckCategory {
    Flatbed,
    StepDeck,
    DoubleDrop,
    Rgn,
    Lowboy,
    Conestoga,
}

impl TruckCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TruckCategory::Flatbed => "Flatbed",
            TruckCategory::StepDeck => "Step Deck",
            TruckCategory::DoubleDrop => "Double Drop",
            TruckCategory::Rgn => "RGN",
            TruckCategory::Lowboy => "Lowboy",
            TruckCategory::Conestoga => "Conestoga",
        }
    }

    /// Base preference when several categories can carry a load.
    /// Simpler equipment is cheaper to book.
    pub fn base_preference(&self) -> u8 {
        match self {
            TruckCategory::Flatbed => 6,
            TruckCategory::StepDeck => 5,
            TruckCategory::Conestoga => 4,
            TruckCategory::DoubleDrop => 3,
            TruckCategory::Rgn => 2,
            TruckCategory::Lowboy => 1,
        }
    }
}

impl fmt::Display for TruckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TruckCategory {
    type Err = String;

    /// Accepts the kebab-case names used in catalog files (`step-deck`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "flatbed" => Ok(TruckCategory::Flatbed),
            "step-deck" => Ok(TruckCategory::StepDeck),
            "double-drop" => Ok(TruckCategory::DoubleDrop),
            "rgn" => Ok(TruckCategory::Rgn),
            "lowboy" => Ok(TruckCategory::Lowboy),
            "conestoga" => Ok(TruckCategory::Conestoga),
            other => Err(format!("unknown truck category '{}'", other)),
        }
    }
}

/// Recessed deck section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Well {
    /// Distance from the front of the deck to the start of the well
    pub offset: Inches,
    pub length: Inches,
    /// Well surface height above ground
    pub height: Inches,
}

/// Legal dimension and weight ceilings for a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalCeilings {
    /// Overall height above ground
    pub height: Inches,
    pub width: Inches,
    /// Overall length including power unit
    pub length: Inches,
    /// Gross vehicle weight (tare + cargo)
    pub gross_weight: Pounds,
}

impl Default for LegalCeilings {
    fn default() -> Self {
        Self {
            height: Inches::from_whole(162),
            width: Inches::from_whole(102),
            length: Inches::from_feet(75),
            gross_weight: Pounds::from_whole(80_000),
        }
    }
}

/// Which deck surface an item sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckRegion {
    Main,
    Well,
}

/// A rectangular floor section of a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRect {
    pub region: DeckRegion,
    pub x: Inches,
    pub length: Inches,
    pub width: Inches,
    pub surface_height: Inches,
    /// Section ends at the rear of the trailer, so cargo may overhang it
    pub rear_open: bool,
}

/// A truck/trailer configuration from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckType {
    pub id: String,
    pub name: String,
    pub category: TruckCategory,
    pub deck_length: Inches,
    pub deck_width: Inches,
    /// Main deck surface height above ground
    pub deck_height: Inches,
    #[serde(default)]
    pub well: Option<Well>,
    pub max_cargo_weight: Pounds,
    pub tare_weight: Pounds,
    /// Tractor and gooseneck length ahead of the deck
    #[serde(default)]
    pub power_unit_length: Inches,
    /// Total extra width cargo may add beyond the deck
    #[serde(default)]
    pub max_side_overhang: Inches,
    #[serde(default)]
    pub max_rear_overhang: Inches,
    #[serde(default)]
    pub legal: LegalCeilings,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TruckType {
    pub fn deck_area(&self) -> i128 {
        self.deck_length.area(self.deck_width)
    }

    pub fn well_length(&self) -> Inches {
        self.well.map(|w| w.length).unwrap_or(Inches::ZERO)
    }

    /// Well surface height, zero if the trailer has no well
    pub fn well_height(&self) -> Inches {
        self.well.map(|w| w.height).unwrap_or(Inches::ZERO)
    }

    /// Floor sections: the main deck around the well, then the well itself
    pub fn regions(&self) -> Vec<RegionRect> {
        let Some(well) = self.well else {
            return vec![RegionRect {
                region: DeckRegion::Main,
                x: Inches::ZERO,
                length: self.deck_length,
                width: self.deck_width,
                surface_height: self.deck_height,
                rear_open: true,
            }];
        };

        let well_end = (well.offset + well.length).min(self.deck_length);
        let mut regions = Vec::with_capacity(3);
        if well.offset.is_positive() {
            regions.push(RegionRect {
                region: DeckRegion::Main,
                x: Inches::ZERO,
                length: well.offset,
                width: self.deck_width,
                surface_height: self.deck_height,
                rear_open: false,
            });
        }
        if well_end < self.deck_length {
            regions.push(RegionRect {
                region: DeckRegion::Main,
                x: well_end,
                length: self.deck_length - well_end,
                width: self.deck_width,
                surface_height: self.deck_height,
                rear_open: true,
            });
        }
        regions.push(RegionRect {
            region: DeckRegion::Well,
            x: well.offset,
            length: well_end - well.offset,
            width: self.deck_width,
            surface_height: well.height,
            rear_open: well_end == self.deck_length,
        });
        regions
    }

    /// Whether a footprint fits a free space, allowing side overhang on
    /// full-width spaces and rear overhang on spaces open at the rear
    pub fn fits(
        &self,
        along: Inches,
        across: Inches,
        space_length: Inches,
        space_width: Inches,
        rear_open: bool,
        full_width: bool,
    ) -> bool {
        let along_ok =
            along <= space_length || (rear_open && along <= space_length + self.max_rear_overhang);
        let across_ok =
            across <= space_width || (full_width && across <= space_width + self.max_side_overhang);
        along_ok && across_ok
    }

    /// Whether an item fits some floor section in some allowed rotation
    pub fn can_hold(&self, item: &super::CargoItem) -> bool {
        let regions = self.regions();
        item.allowed_rotations().into_iter().any(|rotation| {
            let (along, across) = item.footprint(rotation);
            regions
                .iter()
                .any(|r| self.fits(along, across, r.length, r.width, r.rear_open, true))
        })
    }

    /// Overall length with the given rear overhang
    pub fn overall_length(&self, rear_overhang: Inches) -> Inches {
        self.power_unit_length + self.deck_length + rear_overhang
    }
}

/// Read-only catalog of truck configurations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TruckCatalog {
    pub trucks: Vec<TruckType>,
}

impl TruckCatalog {
    pub fn new(trucks: Vec<TruckType>) -> Self {
        Self { trucks }
    }

    pub fn get(&self, id: &str) -> Option<&TruckType> {
        self.trucks.iter().find(|t| t.id == id)
    }

    pub fn active(&self) -> impl Iterator<Item = &TruckType> {
        self.trucks.iter().filter(|t| t.active)
    }

    pub fn len(&self) -> usize {
        self.trucks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trucks.is_empty()
    }

    /// Built-in North American equipment table
    pub fn standard() -> Self {
        let flatbed = |id: &str, name: &str, feet: i64, max: i64, tare: i64| TruckType {
            id: id.to_string(),
            name: name.to_string(),
            category: TruckCategory::Flatbed,
            deck_length: Inches::from_feet(feet),
            deck_width: Inches::from_whole(102),
            deck_height: Inches::from_whole(60),
            well: None,
            max_cargo_weight: Pounds::from_whole(max),
            tare_weight: Pounds::from_whole(tare),
            power_unit_length: Inches::from_feet(20),
            max_side_overhang: Inches::from_whole(48),
            max_rear_overhang: Inches::from_feet(10),
            legal: LegalCeilings::default(),
            active: true,
        };

        let mut trucks = vec![
            flatbed("flatbed-20", "20ft Hotshot Flatbed", 20, 16_000, 14_000),
            flatbed("flatbed-40", "40ft Flatbed", 40, 40_000, 30_000),
            flatbed("flatbed-48", "48ft Flatbed", 48, 48_000, 35_000),
            flatbed("flatbed-53", "53ft Flatbed", 53, 48_000, 36_000),
        ];

        trucks.push(TruckType {
            id: "step-deck-48".to_string(),
            name: "48ft Step Deck".to_string(),
            category: TruckCategory::StepDeck,
            well: Some(Well {
                offset: Inches::from_feet(11),
                length: Inches::from_feet(37),
                height: Inches::from_whole(40),
            }),
            max_cargo_weight: Pounds::from_whole(48_000),
            tare_weight: Pounds::from_whole(36_000),
            ..flatbed("step-deck-48", "", 48, 48_000, 36_000)
        });
        trucks.push(TruckType {
            id: "step-deck-53".to_string(),
            name: "53ft Step Deck".to_string(),
            category: TruckCategory::StepDeck,
            well: Some(Well {
                offset: Inches::from_feet(11),
                length: Inches::from_feet(42),
                height: Inches::from_whole(40),
            }),
            ..flatbed("step-deck-53", "", 53, 48_000, 37_000)
        });
        trucks.push(TruckType {
            id: "double-drop-48".to_string(),
            name: "48ft Double Drop".to_string(),
            category: TruckCategory::DoubleDrop,
            deck_height: Inches::from_whole(48),
            well: Some(Well {
                offset: Inches::from_feet(10),
                length: Inches::from_feet(29),
                height: Inches::from_whole(24),
            }),
            max_rear_overhang: Inches::ZERO,
            ..flatbed("double-drop-48", "", 48, 45_000, 40_000)
        });
        trucks.push(TruckType {
            id: "rgn-48".to_string(),
            name: "48ft Removable Gooseneck".to_string(),
            category: TruckCategory::Rgn,
            deck_height: Inches::from_whole(48),
            well: Some(Well {
                offset: Inches::from_feet(10),
                length: Inches::from_feet(29),
                height: Inches::from_whole(22),
            }),
            max_side_overhang: Inches::from_whole(90),
            max_rear_overhang: Inches::ZERO,
            ..flatbed("rgn-48", "", 48, 42_000, 40_000)
        });
        trucks.push(TruckType {
            id: "lowboy-3axle".to_string(),
            name: "3-Axle Lowboy".to_string(),
            category: TruckCategory::Lowboy,
            deck_height: Inches::from_whole(42),
            well: Some(Well {
                offset: Inches::from_feet(9),
                length: Inches::from_feet(25),
                height: Inches::from_whole(18),
            }),
            max_side_overhang: Inches::from_whole(90),
            max_rear_overhang: Inches::ZERO,
            ..flatbed("lowboy-3axle", "", 45, 80_000, 52_000)
        });
        trucks.push(TruckType {
            id: "conestoga-48".to_string(),
            name: "48ft Conestoga".to_string(),
            category: TruckCategory::Conestoga,
            deck_width: Inches::from_whole(100),
            max_side_overhang: Inches::ZERO,
            max_rear_overhang: Inches::ZERO,
            ..flatbed("conestoga-48", "", 48, 44_000, 36_000)
        });

        Self { trucks }
    }
}

/// Optional restriction of which catalog entries may be considered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFilter {
    /// Only these truck types (empty = any)
    #[serde(default)]
    pub truck_type_ids: Vec<String>,
    /// Only these categories (empty = any)
    #[serde(default)]
    pub categories: Vec<TruckCategory>,
}

impl CandidateFilter {
    pub fn trucks(ids: &[&str]) -> Self {
        Self {
            truck_type_ids: ids.iter().map(|s| s.to_string()).collect(),
            categories: Vec::new(),
        }
    }

    pub fn allows(&self, truck: &TruckType) -> bool {
        (self.truck_type_ids.is_empty() || self.truck_type_ids.iter().any(|id| *id == truck.id))
            && (self.categories.is_empty() || self.categories.contains(&truck.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cargo::test_item;

    #[test]
    fn test_standard_catalog_ids_unique() {
        let catalog = TruckCatalog::standard();
        let mut ids: Vec<_> = catalog.trucks.iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
        assert!(catalog.get("flatbed-48").is_some());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("step-deck".parse(), Ok(TruckCategory::StepDeck));
        assert_eq!("Double_Drop".parse(), Ok(TruckCategory::DoubleDrop));
        assert!("tanker".parse::<TruckCategory>().is_err());
    }

    #[test]
    fn test_flatbed_single_region() {
        let catalog = TruckCatalog::standard();
        let regions = catalog.get("flatbed-48").unwrap().regions();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].length, Inches::from_feet(48));
        assert!(regions[0].rear_open);
    }

    #[test]
    fn test_rgn_regions_split_around_well() {
        let catalog = TruckCatalog::standard();
        let rgn = catalog.get("rgn-48").unwrap();
        let regions = rgn.regions();
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].region, DeckRegion::Main);
        assert_eq!(regions[0].length, Inches::from_feet(10));
        assert!(!regions[0].rear_open);
        assert_eq!(regions[1].x, Inches::from_feet(39));
        assert_eq!(regions[2].region, DeckRegion::Well);
        assert_eq!(regions[2].surface_height, Inches::from_whole(22));
    }

    #[test]
    fn test_step_deck_well_is_rear_open() {
        let catalog = TruckCatalog::standard();
        let regions = catalog.get("step-deck-48").unwrap().regions();
        assert_eq!(regions.len(), 2);
        let well = regions.iter().find(|r| r.region == DeckRegion::Well).unwrap();
        assert!(well.rear_open);
    }

    #[test]
    fn test_can_hold_with_side_overhang() {
        let catalog = TruckCatalog::standard();
        let flatbed = catalog.get("flatbed-48").unwrap();
        assert!(flatbed.can_hold(&test_item("wide", 200, 140, 60, 5000)));
        assert!(!flatbed.can_hold(&test_item("too-wide", 200, 160, 60, 5000)));
        let conestoga = catalog.get("conestoga-48").unwrap();
        assert!(!conestoga.can_hold(&test_item("wide", 200, 140, 60, 5000)));
    }

    #[test]
    fn test_filter() {
        let catalog = TruckCatalog::standard();
        let filter = CandidateFilter {
            truck_type_ids: vec![],
            categories: vec![TruckCategory::Rgn],
        };
        let allowed: Vec<_> = catalog.trucks.iter().filter(|t| filter.allows(t)).collect();
        assert_eq!(allowed.len(), 1);
        assert_eq!(allowed[0].id, "rgn-48");
    }
}
