//! Application service layer - config, planning context, quote use cases

pub mod app;
pub mod config;
pub mod planning;
pub mod repository;
