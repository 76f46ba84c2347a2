//! Candidate truck selection
//!
//! Narrows the catalog to configurations that can plausibly carry a set of
//! items: enough weight capacity for the whole set and a floor section that
//! holds each item in some permitted rotation. Placement decides the rest.

use haulplan_types::Inches;
use tracing::debug;

use crate::model::{aggregate_weight, CandidateFilter, CargoItem, TruckCatalog, TruckType};

/// Suitability of a configuration for items up to `tallest` high.
///
/// A trailer whose well keeps the tallest item under its legal height
/// outranks any trailer that would leave it over height.
pub fn suitability(truck: &TruckType, tallest: Inches) -> u8 {
    let legal = truck.legal.height;
    let on_deck_legal = truck.deck_height + tallest <= legal;
    let in_well_legal = truck.well.is_some() && truck.well_height() + tallest <= legal;
    let base = truck.category.base_preference();
    if on_deck_legal {
        base + 10
    } else if in_well_legal {
        base + 20
    } else {
        base
    }
}

/// Select candidate configurations for `items`.
///
/// Ordered smallest sufficient deck first, then by suitability, then by id.
/// At most `max_candidates` are returned (0 means no cap). An empty result
/// means no single truck suffices.
pub fn select_candidates<'a>(
    items: &[CargoItem],
    catalog: &'a TruckCatalog,
    filter: &CandidateFilter,
    max_candidates: usize,
) -> Vec<&'a TruckType> {
    if items.is_empty() {
        return Vec::new();
    }

    let total_weight = aggregate_weight(items);
    let tallest = items.iter().map(|i| i.height).max().unwrap_or(Inches::ZERO);

    let mut candidates: Vec<&TruckType> = catalog
        .active()
        .filter(|truck| filter.allows(truck))
        .filter(|truck| truck.max_cargo_weight >= total_weight)
        .filter(|truck| items.iter().all(|item| truck.can_hold(item)))
        .collect();

    candidates.sort_by(|a, b| {
        a.deck_length
            .cmp(&b.deck_length)
            .then_with(|| suitability(b, tallest).cmp(&suitability(a, tallest)))
            .then_with(|| a.id.cmp(&b.id))
    });

    if max_candidates > 0 {
        candidates.truncate(max_candidates);
    }

    debug!(
        items = items.len(),
        total_weight = %total_weight,
        candidates = candidates.len(),
        "selected candidate trucks"
    );
    candidates
}

/// The configuration with the most capacity that can hold `item` alone
pub fn largest_candidate_for<'a>(
    item: &CargoItem,
    catalog: &'a TruckCatalog,
    filter: &CandidateFilter,
) -> Option<&'a TruckType> {
    select_candidates(std::slice::from_ref(item), catalog, filter, 0)
        .into_iter()
        .max_by(|a, b| {
            a.max_cargo_weight
                .cmp(&b.max_cargo_weight)
                .then_with(|| a.deck_area().cmp(&b.deck_area()))
                .then_with(|| b.id.cmp(&a.id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cargo::test_item;
    use crate::model::TruckCategory;

    #[test]
    fn test_smallest_sufficient_deck_first() {
        let catalog = TruckCatalog::standard();
        let items = vec![test_item("a", 96, 48, 48, 4_000)];
        let candidates = select_candidates(&items, &catalog, &CandidateFilter::default(), 0);
        assert_eq!(candidates[0].id, "flatbed-20");
        let lengths: Vec<_> = candidates.iter().map(|t| t.deck_length).collect();
        let mut sorted = lengths.clone();
        sorted.sort();
        assert_eq!(lengths, sorted);
    }

    #[test]
    fn test_weight_filters_out_small_trucks() {
        let catalog = TruckCatalog::standard();
        let items = vec![test_item("a", 96, 48, 48, 30_000)];
        let candidates = select_candidates(&items, &catalog, &CandidateFilter::default(), 0);
        assert!(candidates.iter().all(|t| t.max_cargo_weight.as_f64() >= 30_000.0));
        assert!(!candidates.iter().any(|t| t.id == "flatbed-20"));
    }

    #[test]
    fn test_tall_item_prefers_well_trailers_at_equal_length() {
        let catalog = TruckCatalog::standard();
        // 120in tall: 60in deck -> 180in (over), 40in step -> 160in (legal)
        let items = vec![test_item("tall", 200, 96, 120, 20_000)];
        let candidates = select_candidates(&items, &catalog, &CandidateFilter::default(), 0);
        let at_48: Vec<_> = candidates
            .iter()
            .filter(|t| t.deck_length == Inches::from_feet(48))
            .collect();
        assert_ne!(at_48[0].category, TruckCategory::Flatbed);
    }

    #[test]
    fn test_empty_when_nothing_suffices() {
        let catalog = TruckCatalog::standard();
        let items = vec![test_item("a", 96, 48, 48, 90_000)];
        assert!(select_candidates(&items, &catalog, &CandidateFilter::default(), 0).is_empty());
    }

    #[test]
    fn test_cap_and_filter() {
        let catalog = TruckCatalog::standard();
        let items = vec![test_item("a", 96, 48, 48, 1_000)];
        assert_eq!(
            select_candidates(&items, &catalog, &CandidateFilter::default(), 3).len(),
            3
        );
        let only = CandidateFilter::trucks(&["flatbed-53"]);
        let candidates = select_candidates(&items, &catalog, &only, 0);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "flatbed-53");
    }

    #[test]
    fn test_inactive_trucks_skipped() {
        let mut catalog = TruckCatalog::standard();
        for truck in &mut catalog.trucks {
            truck.active = false;
        }
        let items = vec![test_item("a", 10, 10, 10, 10)];
        assert!(select_candidates(&items, &catalog, &CandidateFilter::default(), 0).is_empty());
    }

    #[test]
    fn test_largest_candidate() {
        let catalog = TruckCatalog::standard();
        let item = test_item("a", 96, 48, 48, 1_000);
        let largest = largest_candidate_for(&item, &catalog, &CandidateFilter::default()).unwrap();
        assert_eq!(largest.id, "lowboy-3axle");
    }
}
