//! Repository trait definitions for data persistence

use haulplan_types::{Error, PlanError};
use uuid::Uuid;

use crate::model::Quote;

/// Which versions of a lineage a `replace` may write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    /// Only the highest version in the lineage
    Latest,
    /// Any version, superseded ones included
    Any,
}

/// Storage for quote aggregates.
///
/// A quote is always written whole: `replace` swaps the stored aggregate
/// (cargo, trucks, permits and line items together) in one step, so a
/// reader never sees a partially updated quote. Both writes are
/// conditional and run their checks under the same lock as the write.
pub trait QuoteRepository: Send + Sync {
    /// Store a new quote.
    ///
    /// Fails if the id already exists, and with `QuoteConflict` if its
    /// lineage already holds this version or a later one.
    fn insert(&self, quote: &Quote) -> Result<(), Error>;

    /// Replace an existing quote.
    ///
    /// `quote.revision` must be the stored revision plus one (see
    /// [`Quote::touch`]); otherwise another writer got there first and this
    /// fails with `QuoteConflict`. Under [`VersionCheck::Latest`] it also
    /// fails with `QuoteLocked` once the lineage has a later version.
    fn replace(&self, quote: &Quote, check: VersionCheck) -> Result<(), Error>;

    /// Find a quote by id, including soft-deleted ones
    fn find_by_id(&self, id: Uuid) -> Result<Option<Quote>, Error>;

    /// All quotes, oldest first
    fn find_all(&self) -> Result<Vec<Quote>, Error>;

    /// Every version sharing a lineage, ordered by version
    fn find_by_lineage(&self, lineage_id: Uuid) -> Result<Vec<Quote>, Error> {
        let mut versions: Vec<Quote> = self
            .find_all()?
            .into_iter()
            .filter(|q| q.lineage_id == lineage_id)
            .collect();
        versions.sort_by_key(|q| q.version);
        Ok(versions)
    }
}

fn latest_version<'a>(lineage: impl IntoIterator<Item = &'a Quote>) -> Option<u32> {
    lineage.into_iter().map(|q| q.version).max()
}

/// Insert precondition against the stored members of `quote`'s lineage
pub fn check_insert<'a>(
    quote: &Quote,
    lineage: impl IntoIterator<Item = &'a Quote>,
) -> Result<(), PlanError> {
    match latest_version(lineage) {
        Some(latest) if latest >= quote.version => Err(PlanError::QuoteConflict {
            id: quote.id.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Replace precondition against the stored record and its lineage
pub fn check_replace<'a>(
    quote: &Quote,
    stored: &Quote,
    lineage: impl IntoIterator<Item = &'a Quote>,
    check: VersionCheck,
) -> Result<(), PlanError> {
    if quote.revision != stored.revision + 1 {
        return Err(PlanError::QuoteConflict {
            id: quote.id.to_string(),
        });
    }
    if check == VersionCheck::Latest {
        if let Some(latest) = latest_version(lineage).filter(|v| *v > quote.version) {
            return Err(PlanError::QuoteLocked {
                status: stored.status,
                reason: format!("superseded by version {}", latest),
            });
        }
    }
    Ok(())
}
