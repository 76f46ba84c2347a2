//! Quote Service - lifecycle use cases over a quote repository
//!
//! Every operation loads the stored aggregate, builds the complete next
//! state in memory and hands it to the repository in one `insert` or
//! `replace`. A failure anywhere before that call leaves the stored quote
//! untouched. Writes carry the next revision of what was read, so a
//! writer that loses a race gets `QuoteConflict` instead of overwriting.
//!
//! Recomputation on edit runs the whole pipeline again:
//! 1. Normalize the raw cargo lines
//! 2. Plan the load against the catalog (candidates, placement, scoring)
//! 3. Evaluate permits per transited state with the tenant's fee schedule
//! 4. Price service and accessorial lines, then total

use chrono::{DateTime, Utc};
use haulplan_domain::model::{
    CandidateFilter, CargoItem, LineItem, PermitComponent, PermitLineItem, Quote, Route,
};
use haulplan_domain::repository::{QuoteRepository, VersionCheck};
use haulplan_domain::service::{
    evaluate_permits, normalize_items, parse_currency, plan_load, LoadPlan, RawCargoItem,
    RawNumber,
};
use haulplan_types::{Cents, PlanError, QuoteStatus, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::planning::PlanningContext;

fn default_quantity() -> Decimal {
    Decimal::ONE
}

/// A priced line as entered by an operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: Decimal,
    /// Dollars, e.g. `"$1,250.00"` or `1250`
    pub unit_price: RawNumber,
}

impl LineItemInput {
    pub fn new(description: &str, quantity: Decimal, unit_price: impl Into<RawNumber>) -> Self {
        Self {
            description: description.to_string(),
            quantity,
            unit_price: unit_price.into(),
        }
    }

    fn price(&self) -> std::result::Result<LineItem, PlanError> {
        let field = format!("unit price of '{}'", self.description);
        let unit_price = parse_currency(&self.unit_price, &field)?;
        LineItem::new(&self.description, self.quantity, unit_price)
    }
}

/// Everything an operator edits on a draft quote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteInput {
    pub route: Route,
    pub cargo: Vec<RawCargoItem>,
    #[serde(default)]
    pub truck_filter: CandidateFilter,
    #[serde(default)]
    pub service_items: Vec<LineItemInput>,
    #[serde(default)]
    pub accessorials: Vec<LineItemInput>,
}

/// Fully recomputed quote content, not yet bound to a record
struct Recomputed {
    plan: LoadPlan,
    cargo_items: Vec<CargoItem>,
    permits: Vec<PermitLineItem>,
    service_items: Vec<LineItem>,
    accessorials: Vec<LineItem>,
}

impl Recomputed {
    /// Replace every derived part of `quote` at once
    fn apply_to(self, quote: &mut Quote, input: &QuoteInput) {
        quote.route = input.route.clone();
        quote.truck_filter = input.truck_filter.clone();
        quote.cargo_items = self.cargo_items;
        quote.trucks = self.plan.trucks;
        quote.is_fully_legal = self.plan.is_fully_legal;
        quote.warnings = self.plan.warnings;
        quote.permits = self.permits;
        quote.service_items = self.service_items;
        quote.accessorials = self.accessorials;
        quote.recompute_totals();
    }
}

/// Manual permit fees survive a recompute when the state still needs a permit
fn carry_overrides(previous: &[PermitLineItem], permits: &mut [PermitLineItem]) {
    for line in permits.iter_mut() {
        let Some(old) = previous.iter().find(|p| p.state == line.state) else {
            continue;
        };
        line.permit_fee.manual = old.permit_fee.manual;
        line.escort_fee.manual = old.escort_fee.manual;
        line.pole_car_fee.manual = old.pole_car_fee.manual;
        line.superload_fee.manual = old.superload_fee.manual;
        line.recompute_total();
    }
}

fn not_found(id: Uuid) -> PlanError {
    PlanError::QuoteNotFound { id: id.to_string() }
}

/// Quote lifecycle over a repository and a planning context
pub struct QuoteService<R: QuoteRepository> {
    repo: R,
    context: PlanningContext,
}

impl<R: QuoteRepository> QuoteService<R> {
    pub fn new(repo: R, context: PlanningContext) -> Self {
        Self { repo, context }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn context(&self) -> &PlanningContext {
        &self.context
    }

    fn recompute(
        &self,
        tenant_id: &str,
        input: &QuoteInput,
    ) -> std::result::Result<Recomputed, PlanError> {
        let cargo_items = normalize_items(&input.cargo)?;
        let options = self
            .context
            .plan_options(input.truck_filter.clone(), input.route.states());
        let plan = plan_load(&cargo_items, &self.context.catalog, &options)?;
        let permits = evaluate_permits(
            &plan.trucks,
            &input.route.state_mileage,
            self.context.fees_for(tenant_id),
            &self.context.thresholds,
        )?;
        let service_items = input
            .service_items
            .iter()
            .map(LineItemInput::price)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let accessorials = input
            .accessorials
            .iter()
            .map(LineItemInput::price)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Recomputed {
            plan,
            cargo_items,
            permits,
            service_items,
            accessorials,
        })
    }

    /// Load a live (not deleted) quote
    pub fn get(&self, id: Uuid) -> Result<Quote> {
        match self.repo.find_by_id(id)? {
            Some(quote) if !quote.is_deleted() => Ok(quote),
            _ => Err(not_found(id).into()),
        }
    }

    /// Live quotes, optionally for one tenant, oldest first
    pub fn list(&self, tenant_id: Option<&str>) -> Result<Vec<Quote>> {
        Ok(self
            .repo
            .find_all()?
            .into_iter()
            .filter(|q| !q.is_deleted())
            .filter(|q| tenant_id.map_or(true, |t| q.tenant_id == t))
            .collect())
    }

    /// Highest version in the quote's lineage, deleted versions included
    fn latest_version(&self, quote: &Quote) -> Result<u32> {
        Ok(self
            .repo
            .find_by_lineage(quote.lineage_id)?
            .iter()
            .map(|q| q.version)
            .max()
            .unwrap_or(quote.version)
            .max(quote.version))
    }

    /// Superseded versions are frozen
    fn ensure_current(&self, quote: &Quote) -> Result<()> {
        let latest = self.latest_version(quote)?;
        if latest > quote.version {
            return Err(PlanError::QuoteLocked {
                status: quote.status,
                reason: format!("superseded by version {}", latest),
            }
            .into());
        }
        Ok(())
    }

    fn ensure_editable(&self, quote: &Quote) -> Result<()> {
        quote.ensure_editable()?;
        self.ensure_current(quote)
    }

    /// Plan and price a new DRAFT quote
    pub fn create(&self, tenant_id: &str, input: &QuoteInput) -> Result<Quote> {
        let computed = self.recompute(tenant_id, input)?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut quote = Quote {
            id,
            tenant_id: tenant_id.to_string(),
            lineage_id: id,
            version: 1,
            revision: 0,
            status: QuoteStatus::Draft,
            route: Route::default(),
            cargo_items: Vec::new(),
            truck_filter: CandidateFilter::default(),
            trucks: Vec::new(),
            is_fully_legal: true,
            warnings: Vec::new(),
            service_items: Vec::new(),
            accessorials: Vec::new(),
            permits: Vec::new(),
            subtotal: Cents::ZERO,
            total: Cents::ZERO,
            created_at: now,
            updated_at: now,
            sent_at: None,
            viewed_at: None,
            decided_at: None,
            deleted_at: None,
        };
        computed.apply_to(&mut quote, input);
        self.repo.insert(&quote)?;

        info!(
            quote = %quote.id,
            tenant = %quote.tenant_id,
            trucks = quote.trucks.len(),
            legal = quote.is_fully_legal,
            total = %quote.total,
            "quote created"
        );
        Ok(quote)
    }

    /// Replace cargo, route, truck selection and lines of a DRAFT quote
    pub fn update(&self, id: Uuid, input: &QuoteInput) -> Result<Quote> {
        let current = self.get(id)?;
        self.ensure_editable(&current)?;

        let computed = self.recompute(&current.tenant_id, input).inspect_err(|e| {
            warn!(quote = %id, error = %e, "recompute failed, stored quote unchanged");
        })?;

        let mut next = current.clone();
        computed.apply_to(&mut next, input);
        carry_overrides(&current.permits, &mut next.permits);
        next.recompute_totals();
        next.touch(Utc::now());
        self.repo.replace(&next, VersionCheck::Latest)?;

        info!(
            quote = %id,
            trucks = next.trucks.len(),
            permits = next.permits.len(),
            total = %next.total,
            "quote recomputed"
        );
        Ok(next)
    }

    /// Independent DRAFT copy with its own lineage
    pub fn duplicate(&self, id: Uuid) -> Result<Quote> {
        let source = self.get(id)?;
        let copy = source.duplicate(Utc::now());
        self.repo.insert(&copy)?;
        info!(source = %id, quote = %copy.id, "quote duplicated");
        Ok(copy)
    }

    /// New DRAFT in the same lineage; earlier versions become read-only
    pub fn new_version(&self, id: Uuid) -> Result<Quote> {
        let source = self.get(id)?;
        let version = self.latest_version(&source)? + 1;
        let next = source.next_version(version, Utc::now());
        self.repo.insert(&next)?;
        info!(
            source = %id,
            quote = %next.id,
            lineage = %next.lineage_id,
            version,
            "quote versioned"
        );
        Ok(next)
    }

    /// Move along DRAFT -> SENT -> VIEWED -> ACCEPTED/REJECTED
    pub fn transition_status(&self, id: Uuid, next: QuoteStatus) -> Result<Quote> {
        self.transition_status_at(id, next, Utc::now())
    }

    pub fn transition_status_at(
        &self,
        id: Uuid,
        next: QuoteStatus,
        now: DateTime<Utc>,
    ) -> Result<Quote> {
        let mut quote = self.get(id)?;
        self.ensure_current(&quote)?;
        let from = quote.status;
        quote.transition(next, now)?;
        quote.touch(now);
        self.repo.replace(&quote, VersionCheck::Latest)?;
        info!(quote = %id, %from, to = %next, "quote status changed");
        Ok(quote)
    }

    /// Set or clear a manual fee on one state's permit line
    pub fn set_permit_override(
        &self,
        id: Uuid,
        state: &str,
        component: PermitComponent,
        manual: Option<Cents>,
    ) -> Result<Quote> {
        let mut quote = self.get(id)?;
        self.ensure_editable(&quote)?;

        let state = state.trim().to_uppercase();
        let line = quote
            .permits
            .iter_mut()
            .find(|p| p.state == state)
            .ok_or_else(|| PlanError::PermitNotFound {
                state: state.clone(),
            })?;
        line.set_override(component, manual);
        quote.recompute_totals();
        quote.touch(Utc::now());
        self.repo.replace(&quote, VersionCheck::Latest)?;

        debug!(quote = %id, %state, ?component, ?manual, "permit override set");
        Ok(quote)
    }

    /// Soft delete; the record stays for lineage and audit
    pub fn delete(&self, id: Uuid) -> Result<Quote> {
        let mut quote = self.get(id)?;
        let now = Utc::now();
        quote.deleted_at = Some(now);
        quote.touch(now);
        self.repo.replace(&quote, VersionCheck::Any)?;
        info!(quote = %id, "quote deleted");
        Ok(quote)
    }
}
