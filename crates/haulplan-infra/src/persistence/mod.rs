//! Persistence implementations
//!
//! Implementations of [`QuoteRepository`](haulplan_domain::repository::QuoteRepository):
//! a JSON-file store for the CLI and an in-memory store for tests and
//! embedding.

mod file_quote_repo;
mod memory_quote_repo;

pub use file_quote_repo::FileQuoteRepository;
pub use memory_quote_repo::MemoryQuoteRepository;

#[cfg(test)]
pub(crate) fn sample_quote() -> haulplan_domain::model::Quote {
    let now = chrono::Utc::now();
    let json = serde_json::json!({
        "id": uuid::Uuid::new_v4(),
        "tenant_id": "t1",
        "lineage_id": uuid::Uuid::new_v4(),
        "version": 1,
        "status": "DRAFT",
        "route": {
            "pickup": {"lat": 29.76, "lng": -95.36},
            "dropoff": {"lat": 35.47, "lng": -97.52},
            "distance_miles": "450.5"
        },
        "cargo_items": [],
        "trucks": [],
        "is_fully_legal": true,
        "service_items": [],
        "accessorials": [],
        "permits": [],
        "subtotal": 0,
        "total": 0,
        "created_at": now,
        "updated_at": now
    });
    serde_json::from_value(json).unwrap()
}
