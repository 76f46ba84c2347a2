//! Infrastructure layer
//!
//! Concrete implementations of domain interfaces: reference data loaders
//! (truck catalog, legal thresholds, fee schedules), cargo and route file
//! loaders, and quote repositories.

pub mod cargo_file;
pub mod persistence;
pub mod reference_data;

pub use cargo_file::{load_cargo, load_route, parse_cargo_csv, CargoFileError};
pub use persistence::{FileQuoteRepository, MemoryQuoteRepository};
pub use reference_data::{
    load_catalog, load_fee_schedule, load_thresholds, parse_catalog, parse_fee_schedule,
    parse_thresholds,
};
