//! Truck suitability scoring

use crate::model::PlacedTruck;

const UTILIZATION_PENALTY: f64 = 20.0;
const CAPACITY_PENALTY: f64 = 10.0;
const ILLEGAL_PENALTY: f64 = 30.0;
const PERMIT_STATE_PENALTY: f64 = 5.0;

/// Score a placed truck from 0 to 100.
///
/// Scores rank candidates within one planning pass only. They say nothing
/// about legality on their own.
pub fn score(truck: &PlacedTruck) -> f64 {
    let deck_area = truck.truck.deck_area();
    let unused_area = if deck_area > 0 {
        1.0 - truck.floor_area_used() as f64 / deck_area as f64
    } else {
        1.0
    };

    let capacity = truck.truck.max_cargo_weight.as_f64();
    let unused_weight = if capacity > 0.0 {
        1.0 - truck.total_weight.as_f64() / capacity
    } else {
        1.0
    };

    let mut score = 100.0
        - UTILIZATION_PENALTY * unused_area.clamp(0.0, 1.0)
        - CAPACITY_PENALTY * unused_weight.clamp(0.0, 1.0);
    if !truck.is_legal {
        score -= ILLEGAL_PENALTY;
    }
    let extra_states = truck.permits_required.len().saturating_sub(1);
    score -= PERMIT_STATE_PENALTY * extra_states as f64;
    score.max(0.0)
}

/// Score and store the result on the truck
pub fn apply_score(mut truck: PlacedTruck) -> PlacedTruck {
    truck.score = score(&truck);
    truck
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cargo::test_item;
    use crate::model::TruckCatalog;
    use crate::service::placement_engine::place_items;

    fn placed(truck_id: &str, items: &[crate::model::CargoItem]) -> PlacedTruck {
        let catalog = TruckCatalog::standard();
        place_items(catalog.get(truck_id).unwrap(), 0, items).unwrap()
    }

    #[test]
    fn test_full_deck_full_weight_scores_100() {
        // 240 x 102 covers the whole 20ft deck; 16000 lb is its capacity
        let truck = placed("flatbed-20", &[test_item("slab", 240, 102, 20, 16_000)]);
        assert!((score(&truck) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_half_used() {
        let truck = placed("flatbed-20", &[test_item("half", 120, 102, 20, 8_000)]);
        // 100 - 20 * 0.5 - 10 * 0.5
        assert!((score(&truck) - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_illegal_and_permit_states_penalised() {
        let mut truck = placed("flatbed-20", &[test_item("slab", 240, 102, 20, 16_000)]);
        truck.is_legal = false;
        truck.permits_required = vec!["TX".into(), "OK".into(), "KS".into()];
        assert!((score(&truck) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_floor_at_zero() {
        let mut truck = placed("flatbed-53", &[test_item("tiny", 12, 12, 12, 10)]);
        truck.is_legal = false;
        truck.permits_required = (0..20).map(|i| format!("S{}", i)).collect();
        assert_eq!(score(&truck), 0.0);
    }

    #[test]
    fn test_overhang_does_not_exceed_full_utilization() {
        let truck = placed("flatbed-20", &[test_item("wide", 240, 140, 20, 16_000)]);
        assert!(score(&truck) <= 100.0);
    }

    #[test]
    fn test_more_utilization_scores_higher() {
        let small = placed("flatbed-48", &[test_item("a", 96, 96, 48, 10_000)]);
        let large = placed("flatbed-20", &[test_item("a", 96, 96, 48, 10_000)]);
        assert!(score(&large) > score(&small));
    }
}
