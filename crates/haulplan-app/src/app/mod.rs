//! Application use cases

pub mod quote_service;

pub use quote_service::{LineItemInput, QuoteInput, QuoteService};
