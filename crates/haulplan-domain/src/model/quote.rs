//! Quote aggregate and its lifecycle rules

use chrono::{DateTime, Utc};
use haulplan_types::{Cents, PlanError, QuoteStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permit::permit_total;
use super::{CandidateFilter, CargoItem, PermitLineItem, PlacedTruck, Route};

/// A priced service or accessorial charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Cents,
    pub total: Cents,
}

impl LineItem {
    /// Build a line, rounding `quantity x unit_price` half-up to the cent
    pub fn new(description: &str, quantity: Decimal, unit_price: Cents) -> Result<Self, PlanError> {
        let total = quantity
            .checked_mul(unit_price.to_decimal())
            .and_then(Cents::from_decimal_cents)
            .ok_or_else(|| PlanError::InvalidNumber {
                field: format!("line item '{}' total", description),
                value: quantity.to_string(),
            })?;
        Ok(Self {
            description: description.to_string(),
            quantity,
            unit_price,
            total,
        })
    }
}

/// The quote aggregate. Cargo, trucks, permits and line items are owned
/// by the quote and always replaced together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub tenant_id: String,
    /// Shared by every version of the same quote
    pub lineage_id: Uuid,
    pub version: u32,
    /// Incremented by every stored change to this record
    #[serde(default)]
    pub revision: u64,
    pub status: QuoteStatus,
    pub route: Route,
    pub cargo_items: Vec<CargoItem>,
    /// Truck selection restriction the plan was computed with
    #[serde(default)]
    pub truck_filter: CandidateFilter,
    pub trucks: Vec<PlacedTruck>,
    pub is_fully_legal: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub service_items: Vec<LineItem>,
    pub accessorials: Vec<LineItem>,
    pub permits: Vec<PermitLineItem>,
    pub subtotal: Cents,
    pub total: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub viewed_at: Option<DateTime<Utc>>,
    /// When the quote was accepted or rejected
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Quote {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Mark as the next revision of the stored record
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.revision += 1;
    }

    /// subtotal = services + accessorials; total = subtotal + permits
    pub fn recompute_totals(&mut self) {
        self.subtotal = self
            .service_items
            .iter()
            .chain(self.accessorials.iter())
            .map(|l| l.total)
            .sum();
        self.total = self.subtotal + permit_total(&self.permits);
    }

    /// Edits are only accepted while the quote is a draft
    pub fn ensure_editable(&self) -> Result<(), PlanError> {
        if self.status != QuoteStatus::Draft {
            return Err(PlanError::QuoteLocked {
                status: self.status,
                reason: "only DRAFT quotes can be edited".to_string(),
            });
        }
        Ok(())
    }

    /// Move to `next`, stamping the matching timestamp
    pub fn transition(&mut self, next: QuoteStatus, now: DateTime<Utc>) -> Result<(), PlanError> {
        if !self.status.can_transition_to(next) {
            return Err(PlanError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        match next {
            QuoteStatus::Sent => self.sent_at = Some(now),
            QuoteStatus::Viewed => self.viewed_at = Some(now),
            QuoteStatus::Accepted | QuoteStatus::Rejected => self.decided_at = Some(now),
            QuoteStatus::Draft => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Independent DRAFT copy with a new lineage
    pub fn duplicate(&self, now: DateTime<Utc>) -> Quote {
        let id = Uuid::new_v4();
        self.fresh_copy(id, id, 1, now)
    }

    /// DRAFT copy in the same lineage with the next version number
    pub fn next_version(&self, version: u32, now: DateTime<Utc>) -> Quote {
        self.fresh_copy(Uuid::new_v4(), self.lineage_id, version, now)
    }

    fn fresh_copy(&self, id: Uuid, lineage_id: Uuid, version: u32, now: DateTime<Utc>) -> Quote {
        Quote {
            id,
            lineage_id,
            version,
            revision: 0,
            status: QuoteStatus::Draft,
            created_at: now,
            updated_at: now,
            sent_at: None,
            viewed_at: None,
            decided_at: None,
            deleted_at: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) fn test_quote() -> Quote {
    let now = Utc::now();
    let id = Uuid::new_v4();
    Quote {
        id,
        tenant_id: "tenant-1".to_string(),
        lineage_id: id,
        version: 1,
        revision: 0,
        status: QuoteStatus::Draft,
        route: Route::default(),
        cargo_items: vec![],
        truck_filter: CandidateFilter::default(),
        trucks: vec![],
        is_fully_legal: true,
        warnings: vec![],
        service_items: vec![],
        accessorials: vec![],
        permits: vec![],
        subtotal: Cents::ZERO,
        total: Cents::ZERO,
        created_at: now,
        updated_at: now,
        sent_at: None,
        viewed_at: None,
        decided_at: None,
        deleted_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_line_item_rounding() {
        let line = LineItem::new("Detention", Decimal::from_str("2.5").unwrap(), Cents::new(7_501)).unwrap();
        // 2.5 x 7501 = 18752.5 -> 18753
        assert_eq!(line.total, Cents::new(18_753));
    }

    #[test]
    fn test_totals() {
        let mut quote = test_quote();
        quote.service_items = vec![LineItem::new("Linehaul", Decimal::ONE, Cents::from_dollars(3_000)).unwrap()];
        quote.accessorials = vec![LineItem::new("Tarping", Decimal::ONE, Cents::from_dollars(150)).unwrap()];
        quote.recompute_totals();
        assert_eq!(quote.subtotal, Cents::from_dollars(3_150));
        assert_eq!(quote.total, Cents::from_dollars(3_150));
    }

    #[test]
    fn test_transition_stamps_timestamps() {
        let mut quote = test_quote();
        let now = Utc::now();
        quote.transition(QuoteStatus::Sent, now).unwrap();
        assert_eq!(quote.sent_at, Some(now));
        quote.transition(QuoteStatus::Viewed, now).unwrap();
        assert_eq!(quote.viewed_at, Some(now));
        quote.transition(QuoteStatus::Accepted, now).unwrap();
        assert_eq!(quote.decided_at, Some(now));
        assert!(quote.ensure_editable().is_err());
    }

    #[test]
    fn test_draft_to_accepted_rejected() {
        let mut quote = test_quote();
        let err = quote.transition(QuoteStatus::Accepted, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidStatusTransition {
                from: QuoteStatus::Draft,
                to: QuoteStatus::Accepted
            }
        );
        assert_eq!(quote.status, QuoteStatus::Draft);
    }

    #[test]
    fn test_duplicate_is_new_lineage_draft() {
        let mut quote = test_quote();
        quote.transition(QuoteStatus::Sent, Utc::now()).unwrap();
        let copy = quote.duplicate(Utc::now());
        assert_ne!(copy.id, quote.id);
        assert_ne!(copy.lineage_id, quote.lineage_id);
        assert_eq!(copy.status, QuoteStatus::Draft);
        assert!(copy.sent_at.is_none());
    }

    #[test]
    fn test_next_version_shares_lineage() {
        let quote = test_quote();
        let v2 = quote.next_version(2, Utc::now());
        assert_eq!(v2.lineage_id, quote.lineage_id);
        assert_eq!(v2.version, 2);
        assert_ne!(v2.id, quote.id);
    }

    #[test]
    fn test_touch_bumps_revision_and_copies_restart() {
        let mut quote = test_quote();
        let later = quote.updated_at + chrono::Duration::seconds(5);
        quote.touch(later);
        quote.touch(later);
        assert_eq!(quote.revision, 2);
        assert_eq!(quote.updated_at, later);
        assert_eq!(quote.next_version(2, Utc::now()).revision, 0);
        assert_eq!(quote.duplicate(Utc::now()).revision, 0);
    }
}
