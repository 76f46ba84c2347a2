//! Error types for haulplan

use thiserror::Error;

use crate::QuoteStatus;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

/// Errors raised by load planning, permit evaluation and the quote lifecycle.
///
/// Every variant names the offending input so a caller can act on it
/// (override a truck selection, fix a fee schedule, reload the quote).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid dimension: {field} must be greater than zero (got {value})")]
    InvalidDimension { field: String, value: String },

    #[error("invalid quantity: must be a whole number from 1 to 10000 (got {value})")]
    InvalidQuantity { value: String },

    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("item(s) {} do not fit on truck {truck}", item_ids.join(", "))]
    ItemDoesNotFit { item_ids: Vec<String>, truck: String },

    #[error("no truck configuration can carry item(s) {}", item_ids.join(", "))]
    NoFeasibleTruck { item_ids: Vec<String> },

    #[error("no fee schedule configured for oversize load in state {state}")]
    MissingFeeSchedule { state: String },

    #[error("invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: QuoteStatus, to: QuoteStatus },

    #[error("quote is locked in status {status}: {reason}")]
    QuoteLocked { status: QuoteStatus, reason: String },

    #[error("quote not found: {id}")]
    QuoteNotFound { id: String },

    #[error("quote {id} was changed by another writer, reload and retry")]
    QuoteConflict { id: String },

    #[error("quote has no permit line for state {state}")]
    PermitNotFound { state: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("CSV loader error: {0}")]
    CsvLoader(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// The planning error behind this error, if any
    pub fn as_plan_error(&self) -> Option<&PlanError> {
        match self {
            Error::Plan(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
