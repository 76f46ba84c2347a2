//! Legal status and permit fees per state of transit
//!
//! Evaluation maps each `(state, miles)` entry of the route to at most one
//! permit line item, then the caller sums the line totals.

use haulplan_types::{Cents, PlanError};
use rust_decimal::Decimal;
use tracing::debug;

use crate::model::{
    FeeComponent, FeeRates, FeeSchedule, LoadDimensions, PermitLineItem, PlacedTruck,
    StateMileage, StateThresholds, ThresholdTable,
};

/// How one loaded truck compares with one state's thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermitAssessment {
    pub oversize: bool,
    pub overweight: bool,
    pub escort_count: u32,
    pub pole_car_required: bool,
    pub superload: bool,
}

impl PermitAssessment {
    pub fn requires_permit(&self) -> bool {
        self.oversize || self.overweight
    }
}

/// Compare loaded dimensions with a state's thresholds.
///
/// Escorts follow dimensions only: an overweight load of legal size gets
/// a permit but no escort.
pub fn assess(dims: &LoadDimensions, thresholds: &StateThresholds) -> PermitAssessment {
    let oversize = dims.width > thresholds.legal_width
        || dims.height > thresholds.legal_height
        || dims.length > thresholds.legal_length;
    let overweight = dims.gross_weight > thresholds.legal_gross_weight;

    let escort_count = if !oversize {
        0
    } else if dims.width > thresholds.two_escort_width || dims.length > thresholds.two_escort_length
    {
        2
    } else {
        1
    };

    PermitAssessment {
        oversize,
        overweight,
        escort_count,
        pole_car_required: dims.length > thresholds.pole_car_length,
        superload: dims.width > thresholds.superload_width
            || dims.gross_weight > thresholds.superload_weight,
    }
}

/// States, in the given order, whose thresholds the truck exceeds
pub fn states_requiring_permit(
    truck: &PlacedTruck,
    states: &[String],
    thresholds: &ThresholdTable,
) -> Vec<String> {
    states
        .iter()
        .filter(|state| assess(&truck.dimensions, &thresholds.for_state(state)).requires_permit())
        .cloned()
        .collect()
}

/// Sum repeated states, keeping first-seen order.
///
/// Fails with `InvalidNumber` on negative miles or a sum that overflows.
pub fn merge_mileage(entries: &[StateMileage]) -> Result<Vec<StateMileage>, PlanError> {
    let mut merged: Vec<StateMileage> = Vec::new();
    for entry in entries {
        entry.validate()?;
        let state = entry.state.to_uppercase();
        match merged.iter_mut().find(|m| m.state == state) {
            Some(existing) => {
                existing.miles = existing.miles.checked_add(entry.miles).ok_or_else(|| {
                    PlanError::InvalidNumber {
                        field: format!("miles in {}", state),
                        value: entry.miles.to_string(),
                    }
                })?;
                if existing.state_name.is_none() {
                    existing.state_name = entry.state_name.clone();
                }
            }
            None => merged.push(StateMileage {
                state,
                state_name: entry.state_name.clone(),
                miles: entry.miles,
            }),
        }
    }
    Ok(merged)
}

/// Fee components for one state, before any operator override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateFees {
    pub permit: Cents,
    pub escort: Cents,
    pub pole_car: Cents,
    pub superload: Cents,
}

impl StateFees {
    pub fn total(&self) -> Cents {
        self.permit + self.escort + self.pole_car + self.superload
    }
}

/// Fees for `permits` trucks in one state.
///
/// `escorts`, `pole_cars` and `superloads` are counts summed over those
/// trucks. The escort fee is rounded half-up to the cent.
pub fn state_fees(
    rates: &FeeRates,
    miles: Decimal,
    permits: u32,
    escorts: u32,
    pole_cars: u32,
    superloads: u32,
) -> Result<StateFees, PlanError> {
    let escort_cents = rates
        .escort_rate_per_mile
        .to_decimal()
        .checked_mul(miles)
        .and_then(|v| v.checked_mul(Decimal::from(escorts)));
    let escort = escort_cents
        .and_then(Cents::from_decimal_cents)
        .ok_or_else(|| PlanError::InvalidNumber {
            field: "escort fee".to_string(),
            value: miles.to_string(),
        })?;

    Ok(StateFees {
        permit: rates.base_permit_fee * i64::from(permits),
        escort,
        pole_car: rates.pole_car_fee * i64::from(pole_cars),
        superload: rates.superload_surcharge * i64::from(superloads),
    })
}

fn evaluate_state(
    trucks: &[PlacedTruck],
    entry: &StateMileage,
    fees: Option<&FeeSchedule>,
    thresholds: &ThresholdTable,
) -> Result<Option<PermitLineItem>, PlanError> {
    let state_thresholds = thresholds.for_state(&entry.state);
    let assessed: Vec<(usize, PermitAssessment)> = trucks
        .iter()
        .map(|t| (t.truck_index, assess(&t.dimensions, &state_thresholds)))
        .filter(|(_, a)| a.requires_permit())
        .collect();
    if assessed.is_empty() {
        return Ok(None);
    }

    let rates = fees
        .and_then(|schedule| schedule.rates_for(&entry.state))
        .ok_or_else(|| PlanError::MissingFeeSchedule {
            state: entry.state.clone(),
        })?;

    let escort_count: u32 = assessed.iter().map(|(_, a)| a.escort_count).sum();
    let pole_cars = assessed.iter().filter(|(_, a)| a.pole_car_required).count() as u32;
    let superloads = assessed.iter().filter(|(_, a)| a.superload).count() as u32;

    let computed = state_fees(
        rates,
        entry.miles,
        assessed.len() as u32,
        escort_count,
        pole_cars,
        superloads,
    )?;

    debug!(
        state = %entry.state,
        trucks = assessed.len(),
        escort_count,
        total = %computed.total(),
        "permit required"
    );

    let mut line = PermitLineItem {
        state: entry.state.clone(),
        state_name: entry.state_name.clone(),
        miles: entry.miles,
        truck_indices: assessed.iter().map(|(i, _)| *i).collect(),
        escort_count,
        pole_car_required: pole_cars > 0,
        superload: superloads > 0,
        permit_fee: FeeComponent::computed(computed.permit),
        escort_fee: FeeComponent::computed(computed.escort),
        pole_car_fee: FeeComponent::computed(computed.pole_car),
        superload_fee: FeeComponent::computed(computed.superload),
        total: Cents::ZERO,
    };
    line.recompute_total();
    Ok(Some(line))
}

/// Permit line items for every transited state where some truck is
/// oversize or overweight.
///
/// Fails with `MissingFeeSchedule` when such a state has no rates, either
/// because no schedule is configured or because it covers neither the
/// state nor a fallback.
pub fn evaluate_permits(
    trucks: &[PlacedTruck],
    state_mileage: &[StateMileage],
    fees: Option<&FeeSchedule>,
    thresholds: &ThresholdTable,
) -> Result<Vec<PermitLineItem>, PlanError> {
    let mut items = Vec::new();
    for entry in merge_mileage(state_mileage)? {
        if let Some(line) = evaluate_state(trucks, &entry, fees, thresholds)? {
            items.push(line);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cargo::test_item;
    use crate::model::{StateThresholdOverride, TruckCatalog};
    use crate::service::placement_engine::place_items;
    use haulplan_types::{Inches, Pounds};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn rates() -> FeeRates {
        FeeRates {
            base_permit_fee: Cents::from_dollars(60),
            escort_rate_per_mile: Cents::new(175),
            pole_car_fee: Cents::from_dollars(250),
            superload_surcharge: Cents::from_dollars(1_000),
        }
    }

    fn schedule() -> FeeSchedule {
        FeeSchedule {
            tenant_id: "tenant-1".to_string(),
            fallback: Some(rates()),
            states: BTreeMap::new(),
        }
    }

    fn loaded(height: i64, width: i64) -> PlacedTruck {
        let catalog = TruckCatalog::standard();
        let truck = catalog.get("flatbed-48").unwrap();
        place_items(truck, 0, &[test_item("load", 300, width, height, 20_000)]).unwrap()
    }

    fn dims(width: i64, length_ft: i64, gross: i64) -> LoadDimensions {
        LoadDimensions {
            width: Inches::from_whole(width),
            height: Inches::from_whole(150),
            length: Inches::from_feet(length_ft),
            gross_weight: Pounds::from_whole(gross),
        }
    }

    #[test]
    fn test_assess_escorts() {
        let federal = StateThresholds::federal();
        assert_eq!(assess(&dims(102, 70, 60_000), &federal), PermitAssessment::default());

        let moderate = assess(&dims(144, 70, 60_000), &federal);
        assert!(moderate.oversize);
        assert_eq!(moderate.escort_count, 1);

        let wide = assess(&dims(180, 70, 60_000), &federal);
        assert_eq!(wide.escort_count, 2);
        assert!(!wide.superload);

        let heavy = assess(&dims(102, 70, 90_000), &federal);
        assert!(heavy.overweight);
        assert_eq!(heavy.escort_count, 0);

        let huge = assess(&dims(200, 120, 210_000), &federal);
        assert!(huge.superload);
        assert!(huge.pole_car_required);
        assert_eq!(huge.escort_count, 2);
    }

    #[test]
    fn test_tall_load_without_fee_schedule_is_an_error() {
        // 60in deck + 114in cargo = 14.5 ft against 13.5 ft
        let truck = loaded(114, 96);
        assert_eq!(truck.dimensions.height, Inches::from_whole(174));
        let route = vec![StateMileage::new("TX", Decimal::from(120))];
        let err = evaluate_permits(&[truck], &route, None, &ThresholdTable::default()).unwrap_err();
        assert_eq!(err, PlanError::MissingFeeSchedule { state: "TX".to_string() });
    }

    #[test]
    fn test_schedule_without_state_or_fallback_is_an_error() {
        let truck = loaded(114, 96);
        let mut fees = schedule();
        fees.fallback = None;
        fees.states.insert("OK".to_string(), rates());
        let route = vec![
            StateMileage::new("OK", Decimal::from(50)),
            StateMileage::new("TX", Decimal::from(120)),
        ];
        let err = evaluate_permits(&[truck], &route, Some(&fees), &ThresholdTable::default())
            .unwrap_err();
        assert_eq!(err, PlanError::MissingFeeSchedule { state: "TX".to_string() });
    }

    #[test]
    fn test_legal_load_needs_no_schedule() {
        let truck = loaded(48, 96);
        let route = vec![StateMileage::new("TX", Decimal::from(120))];
        let items = evaluate_permits(&[truck], &route, None, &ThresholdTable::default()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_fee_computation() {
        let truck = loaded(114, 96);
        let route = vec![StateMileage::new("tx", Decimal::new(1205, 1))];
        let items =
            evaluate_permits(&[truck], &route, Some(&schedule()), &ThresholdTable::default())
                .unwrap();
        assert_eq!(items.len(), 1);
        let line = &items[0];
        assert_eq!(line.state, "TX");
        assert_eq!(line.escort_count, 1);
        assert_eq!(line.permit_fee.computed, Cents::from_dollars(60));
        // 175 c/mi x 120.5 mi = 21087.5 -> 21088
        assert_eq!(line.escort_fee.computed, Cents::new(21_088));
        assert_eq!(line.total, Cents::new(6_000 + 21_088));
    }

    #[test]
    fn test_state_override_changes_outcome() {
        let truck = loaded(96, 96); // 156in overall
        let mut thresholds = ThresholdTable::default();
        thresholds.states.insert(
            "CO".to_string(),
            StateThresholdOverride {
                legal_height: Some(Inches::from_whole(150)),
                ..Default::default()
            },
        );
        let route = vec![
            StateMileage::new("TX", Decimal::from(100)),
            StateMileage::new("CO", Decimal::from(200)),
        ];
        let items = evaluate_permits(&[truck.clone()], &route, Some(&schedule()), &thresholds).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].state, "CO");
        assert_eq!(
            states_requiring_permit(&truck, &["TX".to_string(), "CO".to_string()], &thresholds),
            vec!["CO".to_string()]
        );
    }

    #[test]
    fn test_repeated_states_merge() {
        let merged = merge_mileage(&[
            StateMileage::new("TX", Decimal::from(100)),
            StateMileage::new("OK", Decimal::from(40)),
            StateMileage::new("tx", Decimal::from(20)),
        ])
        .unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].state, "TX");
        assert_eq!(merged[0].miles, Decimal::from(120));
    }

    #[test]
    fn test_negative_miles_rejected() {
        let route = vec![
            StateMileage::new("TX", Decimal::from(100)),
            StateMileage::new("OK", Decimal::from(-40)),
        ];
        let err = evaluate_permits(&[loaded(114, 96)], &route, Some(&schedule()), &ThresholdTable::default())
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidNumber {
                field: "miles in OK".to_string(),
                value: "-40".to_string()
            }
        );
    }

    #[test]
    fn test_multiple_trucks_sum_into_one_line() {
        let a = loaded(114, 96);
        let b = loaded(114, 96).with_index(1);
        let route = vec![StateMileage::new("TX", Decimal::from(10))];
        let items = evaluate_permits(&[a, b], &route, Some(&schedule()), &ThresholdTable::default())
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].truck_indices, vec![0, 1]);
        assert_eq!(items[0].escort_count, 2);
        assert_eq!(items[0].permit_fee.computed, Cents::from_dollars(120));
    }

    proptest! {
        #[test]
        fn prop_fees_monotone(
            base in 0i64..100_000,
            rate in 0i64..1_000,
            pole in 0i64..100_000,
            surcharge in 0i64..500_000,
            miles in 0i64..200_000,
            extra_miles in 0i64..50_000,
            escorts in 0u32..3,
            extra_escorts in 0u32..3,
            low_superload in any::<bool>(),
            raise_superload in any::<bool>(),
        ) {
            let rates = FeeRates {
                base_permit_fee: Cents::new(base),
                escort_rate_per_mile: Cents::new(rate),
                pole_car_fee: Cents::new(pole),
                superload_surcharge: Cents::new(surcharge),
            };
            let low_miles = Decimal::new(miles, 1);
            let high_miles = Decimal::new(miles + extra_miles, 1);
            let low_super = u32::from(low_superload);
            let high_super = u32::from(low_superload || raise_superload);

            let low = state_fees(&rates, low_miles, 1, escorts, 0, low_super).unwrap();
            let high = state_fees(&rates, high_miles, 1, escorts + extra_escorts, 0, high_super).unwrap();
            prop_assert!(low.total() <= high.total());
        }
    }
}
