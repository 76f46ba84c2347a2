//! In-memory quote repository

use std::collections::HashMap;
use std::sync::RwLock;

use haulplan_domain::model::Quote;
use haulplan_domain::repository::{check_insert, check_replace, QuoteRepository, VersionCheck};
use haulplan_types::{Error, PlanError};
use uuid::Uuid;

/// Quotes held in memory behind a lock. Every write swaps a whole
/// aggregate under the write lock.
#[derive(Debug, Default)]
pub struct MemoryQuoteRepository {
    quotes: RwLock<HashMap<Uuid, Quote>>,
}

impl MemoryQuoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> Error {
    Error::Store("quote store lock poisoned".to_string())
}

impl QuoteRepository for MemoryQuoteRepository {
    fn insert(&self, quote: &Quote) -> Result<(), Error> {
        let mut quotes = self.quotes.write().map_err(|_| poisoned())?;
        if quotes.contains_key(&quote.id) {
            return Err(Error::Store(format!("quote {} already exists", quote.id)));
        }
        check_insert(quote, quotes.values().filter(|q| q.lineage_id == quote.lineage_id))?;
        quotes.insert(quote.id, quote.clone());
        Ok(())
    }

    fn replace(&self, quote: &Quote, check: VersionCheck) -> Result<(), Error> {
        let mut quotes = self.quotes.write().map_err(|_| poisoned())?;
        let stored = quotes.get(&quote.id).ok_or_else(|| PlanError::QuoteNotFound {
            id: quote.id.to_string(),
        })?;
        check_replace(
            quote,
            stored,
            quotes.values().filter(|q| q.lineage_id == quote.lineage_id),
            check,
        )?;
        quotes.insert(quote.id, quote.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Quote>, Error> {
        let quotes = self.quotes.read().map_err(|_| poisoned())?;
        Ok(quotes.get(&id).cloned())
    }

    fn find_all(&self) -> Result<Vec<Quote>, Error> {
        let quotes = self.quotes.read().map_err(|_| poisoned())?;
        let mut all: Vec<Quote> = quotes.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}
