//! Domain model types

pub mod cargo;
pub mod permit;
pub mod placement;
pub mod quote;
pub mod route;
pub mod truck;

pub use cargo::{
    aggregate_weight, checked_aggregate_weight, expand_units, unit_count, CargoItem, Rotation,
    MAX_UNITS,
};
pub use permit::{
    permit_total, FeeComponent, FeeRates, FeeSchedule, PermitComponent, PermitLineItem,
    StateThresholdOverride, StateThresholds, ThresholdTable,
};
pub use placement::{LoadDimensions, PlacedItem, PlacedTruck};
pub use quote::{LineItem, Quote};
pub use route::{Coordinates, Route, StateMileage};
pub use truck::{
    CandidateFilter, DeckRegion, LegalCeilings, RegionRect, TruckCatalog, TruckCategory,
    TruckType, Well,
};
