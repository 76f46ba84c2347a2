//! Load planning: candidate selection, placement and scoring
//!
//! Candidates are placed independently, so they are evaluated on worker
//! threads pulling from a shared index. When no single truck can carry the
//! whole set the items are split across several trucks.

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use haulplan_types::{PlanError, Pounds};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::candidate_selector::{largest_candidate_for, select_candidates};
use super::permit_evaluator::states_requiring_permit;
use super::placement_engine::place_items;
use super::truck_scorer::apply_score;
use crate::model::{
    checked_aggregate_weight, expand_units, unit_count, CandidateFilter, CargoItem, PlacedTruck,
    ThresholdTable, TruckCatalog, TruckType, MAX_UNITS,
};

pub const DEFAULT_MAX_CANDIDATES: usize = 8;

/// Inputs that shape a planning pass besides the cargo itself
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub filter: CandidateFilter,
    /// Candidates placed per window (0 = all at once). The next window is
    /// only tried when nothing in the current one holds the load.
    pub max_candidates: usize,
    pub parallel: bool,
    /// States the route transits, used to fill `permits_required`
    pub route_states: Vec<String>,
    pub thresholds: ThresholdTable,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            filter: CandidateFilter::default(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
            parallel: true,
            route_states: Vec::new(),
            thresholds: ThresholdTable::default(),
        }
    }
}

impl PlanOptions {
    pub fn with_filter(mut self, filter: CandidateFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_route_states(mut self, states: Vec<String>) -> Self {
        self.route_states = states;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Outcome of placing the whole set on one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub truck_id: String,
    pub truck_name: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub is_legal: Option<bool>,
    #[serde(default)]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPlan {
    pub trucks: Vec<PlacedTruck>,
    pub is_fully_legal: bool,
    pub warnings: Vec<String>,
    /// Single-truck candidates, best first
    pub shortlist: Vec<CandidateSummary>,
    /// Whether the items were split across trucks
    pub split: bool,
}

impl LoadPlan {
    fn from_trucks(trucks: Vec<PlacedTruck>, shortlist: Vec<CandidateSummary>, split: bool) -> Self {
        let trucks: Vec<PlacedTruck> = trucks
            .into_iter()
            .enumerate()
            .map(|(i, t)| t.with_index(i))
            .collect();
        let is_fully_legal = trucks.iter().all(|t| t.is_legal);
        let warnings = trucks
            .iter()
            .flat_map(|t| {
                t.warnings
                    .iter()
                    .map(move |w| format!("truck {} ({}): {}", t.truck_index + 1, t.truck.id, w))
            })
            .collect();
        Self {
            trucks,
            is_fully_legal,
            warnings,
            shortlist,
            split,
        }
    }

    pub fn total_weight(&self) -> Pounds {
        self.trucks.iter().map(|t| t.total_weight).sum()
    }
}

fn evaluate(
    truck: &TruckType,
    items: &[CargoItem],
    options: &PlanOptions,
) -> Result<PlacedTruck, PlanError> {
    let mut placed = place_items(truck, 0, items)?;
    placed.permits_required =
        states_requiring_permit(&placed, &options.route_states, &options.thresholds);
    Ok(apply_score(placed))
}

/// Evaluate every candidate, keeping candidate order in the result
fn evaluate_all(
    candidates: &[&TruckType],
    items: &[CargoItem],
    options: &PlanOptions,
) -> Vec<Result<PlacedTruck, PlanError>> {
    let workers = num_cpus::get().min(candidates.len());
    if !options.parallel || workers <= 1 {
        return candidates.iter().map(|t| evaluate(t, items, options)).collect();
    }

    let next_index = AtomicUsize::new(0);
    let results: Mutex<Vec<(usize, Result<PlacedTruck, PlanError>)>> =
        Mutex::new(Vec::with_capacity(candidates.len()));

    let next = &next_index;
    let collected = &results;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(scope.spawn(move || loop {
                let idx = next.fetch_add(1, Ordering::SeqCst);
                let Some(truck) = candidates.get(idx) else {
                    break;
                };
                let result = evaluate(truck, items, options);
                collected
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((idx, result));
            }));
        }
        for handle in handles {
            if let Err(payload) = handle.join() {
                panic::resume_unwind(payload);
            }
        }
    });

    let mut results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, r)| r).collect()
}

/// Place on successive windows of `max_candidates` candidates, stopping
/// after the first window where some candidate holds every unit
fn evaluate_windows<'a>(
    candidates: &[&'a TruckType],
    items: &[CargoItem],
    options: &PlanOptions,
) -> Vec<(&'a TruckType, Result<PlacedTruck, PlanError>)> {
    let window = match options.max_candidates {
        0 => candidates.len().max(1),
        n => n,
    };
    let mut outcomes = Vec::new();
    for chunk in candidates.chunks(window) {
        let results = evaluate_all(chunk, items, options);
        let any_fit = results.iter().any(Result::is_ok);
        outcomes.extend(chunk.iter().copied().zip(results));
        if any_fit {
            break;
        }
        debug!(window = chunk.len(), "no candidate in window fits, widening");
    }
    outcomes
}

/// Reject inputs whose expansion or weight total is out of range
fn check_input(items: &[CargoItem]) -> Result<(), PlanError> {
    let units = unit_count(items);
    if units > u64::from(MAX_UNITS) {
        return Err(PlanError::InvalidQuantity {
            value: units.to_string(),
        });
    }
    if checked_aggregate_weight(items).is_none() {
        return Err(PlanError::InvalidNumber {
            field: "total weight".to_string(),
            value: "out of range".to_string(),
        });
    }
    Ok(())
}

fn rank(a: &PlacedTruck, b: &PlacedTruck) -> std::cmp::Ordering {
    b.score.total_cmp(&a.score)
}

/// Plan `items` onto one truck, or several when no single truck suffices.
///
/// The highest-scoring legal candidate wins; if none is legal the highest
/// scoring candidate overall. Fails with `NoFeasibleTruck` when some unit
/// fits no permitted truck even on its own.
pub fn plan_load(
    items: &[CargoItem],
    catalog: &TruckCatalog,
    options: &PlanOptions,
) -> Result<LoadPlan, PlanError> {
    if items.is_empty() {
        return Ok(LoadPlan::from_trucks(Vec::new(), Vec::new(), false));
    }
    check_input(items)?;

    let candidates = select_candidates(items, catalog, &options.filter, 0);
    let results = evaluate_windows(&candidates, items, options);
    let evaluated = results.len();

    let mut shortlist = Vec::with_capacity(evaluated);
    let mut placed = Vec::new();
    for (truck, result) in results {
        match result {
            Ok(p) => {
                shortlist.push(CandidateSummary {
                    truck_id: truck.id.clone(),
                    truck_name: truck.name.clone(),
                    score: Some(p.score),
                    is_legal: Some(p.is_legal),
                    failure: None,
                });
                placed.push(p);
            }
            Err(e) => shortlist.push(CandidateSummary {
                truck_id: truck.id.clone(),
                truck_name: truck.name.clone(),
                score: None,
                is_legal: None,
                failure: Some(e.to_string()),
            }),
        }
    }
    // Stable sort keeps candidate order among equal scores
    shortlist.sort_by(|a, b| match (a.score, b.score) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    placed.sort_by(rank);
    let best = match placed.iter().position(|p| p.is_legal) {
        Some(i) => Some(placed.swap_remove(i)),
        None if !placed.is_empty() => Some(placed.swap_remove(0)),
        None => None,
    };

    if let Some(best) = best {
        info!(
            truck = %best.truck.id,
            score = best.score,
            is_legal = best.is_legal,
            candidates = evaluated,
            "single-truck plan selected"
        );
        return Ok(LoadPlan::from_trucks(vec![best], shortlist, false));
    }

    warn!(candidates = evaluated, "no single truck fits, splitting load");
    let trucks = split_load(items, catalog, options)?;
    info!(trucks = trucks.len(), "multi-truck plan selected");
    Ok(LoadPlan::from_trucks(trucks, shortlist, true))
}

/// Greedy multi-truck split.
///
/// Each group is seeded with the heaviest remaining unit on the largest
/// truck that holds it; remaining units are added first-fit in descending
/// weight. Every finished group is then re-planned on its best truck.
fn split_load(
    items: &[CargoItem],
    catalog: &TruckCatalog,
    options: &PlanOptions,
) -> Result<Vec<PlacedTruck>, PlanError> {
    let mut remaining = expand_units(items);
    remaining.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.id.cmp(&b.id)));

    let unplaceable: Vec<String> = remaining
        .iter()
        .filter(|u| largest_candidate_for(u, catalog, &options.filter).is_none())
        .map(|u| u.id.clone())
        .collect();
    if !unplaceable.is_empty() {
        return Err(PlanError::NoFeasibleTruck {
            item_ids: unplaceable,
        });
    }

    let mut trucks = Vec::new();
    while !remaining.is_empty() {
        let seed = remaining.remove(0);
        let Some(carrier) = largest_candidate_for(&seed, catalog, &options.filter) else {
            return Err(PlanError::NoFeasibleTruck {
                item_ids: vec![seed.id],
            });
        };

        let mut group = vec![seed];
        let mut leftover = Vec::new();
        for unit in remaining {
            group.push(unit);
            if place_items(carrier, 0, &group).is_err() {
                if let Some(unit) = group.pop() {
                    leftover.push(unit);
                }
            }
        }
        remaining = leftover;

        debug!(truck = %carrier.id, units = group.len(), "split group formed");
        trucks.push(plan_group(&group, carrier, catalog, options)?);
    }
    Ok(trucks)
}

/// Best truck for one split group, falling back to the truck it was formed on
fn plan_group(
    group: &[CargoItem],
    carrier: &TruckType,
    catalog: &TruckCatalog,
    options: &PlanOptions,
) -> Result<PlacedTruck, PlanError> {
    let candidates = select_candidates(group, catalog, &options.filter, 0);
    let mut placed: Vec<PlacedTruck> = evaluate_windows(&candidates, group, options)
        .into_iter()
        .filter_map(|(_, result)| result.ok())
        .collect();
    placed.sort_by(rank);
    match placed.iter().position(|p| p.is_legal) {
        Some(i) => Ok(placed.swap_remove(i)),
        None if !placed.is_empty() => Ok(placed.swap_remove(0)),
        None => evaluate(carrier, group, options),
    }
}
