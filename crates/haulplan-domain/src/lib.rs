//! Load planning, permit evaluation and quote lifecycle rules for
//! oversize and heavy-haul freight.
//!
//! Everything here is pure: reference data (truck catalog, thresholds,
//! fee schedules) is passed in explicitly and nothing touches storage
//! except through the [`repository`] traits.

pub mod model;
pub mod repository;
pub mod service;
