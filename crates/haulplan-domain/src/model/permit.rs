//! Legal thresholds, fee schedules and permit line items

use std::collections::BTreeMap;

use haulplan_types::{Cents, Inches, Pounds};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dimension and weight thresholds applied within one state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateThresholds {
    pub legal_width: Inches,
    pub legal_height: Inches,
    pub legal_length: Inches,
    pub legal_gross_weight: Pounds,
    /// Width above which a front and rear escort are required
    pub two_escort_width: Inches,
    /// Length above which a front and rear escort are required
    pub two_escort_length: Inches,
    pub pole_car_length: Inches,
    pub superload_width: Inches,
    pub superload_weight: Pounds,
}

impl StateThresholds {
    /// Federal defaults used when a state has no override
    pub fn federal() -> Self {
        Self {
            legal_width: Inches::from_whole(102),
            legal_height: Inches::from_whole(162),
            legal_length: Inches::from_feet(75),
            legal_gross_weight: Pounds::from_whole(80_000),
            two_escort_width: Inches::from_feet(14),
            two_escort_length: Inches::from_feet(110),
            pole_car_length: Inches::from_feet(100),
            superload_width: Inches::from_feet(16),
            superload_weight: Pounds::from_whole(200_000),
        }
    }
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self::federal()
    }
}

/// Per-state deviations from the federal thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateThresholdOverride {
    #[serde(default)]
    pub legal_width: Option<Inches>,
    #[serde(default)]
    pub legal_height: Option<Inches>,
    #[serde(default)]
    pub legal_length: Option<Inches>,
    #[serde(default)]
    pub legal_gross_weight: Option<Pounds>,
    #[serde(default)]
    pub two_escort_width: Option<Inches>,
    #[serde(default)]
    pub two_escort_length: Option<Inches>,
    #[serde(default)]
    pub pole_car_length: Option<Inches>,
    #[serde(default)]
    pub superload_width: Option<Inches>,
    #[serde(default)]
    pub superload_weight: Option<Pounds>,
}

impl StateThresholdOverride {
    pub fn apply(&self, base: StateThresholds) -> StateThresholds {
        StateThresholds {
            legal_width: self.legal_width.unwrap_or(base.legal_width),
            legal_height: self.legal_height.unwrap_or(base.legal_height),
            legal_length: self.legal_length.unwrap_or(base.legal_length),
            legal_gross_weight: self.legal_gross_weight.unwrap_or(base.legal_gross_weight),
            two_escort_width: self.two_escort_width.unwrap_or(base.two_escort_width),
            two_escort_length: self.two_escort_length.unwrap_or(base.two_escort_length),
            pole_car_length: self.pole_car_length.unwrap_or(base.pole_car_length),
            superload_width: self.superload_width.unwrap_or(base.superload_width),
            superload_weight: self.superload_weight.unwrap_or(base.superload_weight),
        }
    }
}

/// Threshold table: federal defaults plus state overrides keyed by state code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdTable {
    #[serde(default)]
    pub federal: StateThresholds,
    #[serde(default)]
    pub states: BTreeMap<String, StateThresholdOverride>,
}

impl ThresholdTable {
    pub fn for_state(&self, state: &str) -> StateThresholds {
        match self.states.get(&state.to_uppercase()) {
            Some(over) => over.apply(self.federal),
            None => self.federal,
        }
    }
}

/// Fee rates, all in cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub base_permit_fee: Cents,
    pub escort_rate_per_mile: Cents,
    pub pole_car_fee: Cents,
    pub superload_surcharge: Cents,
}

/// A tenant's configured fee schedule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub tenant_id: String,
    /// Rates for states without their own entry
    #[serde(default)]
    pub fallback: Option<FeeRates>,
    #[serde(default)]
    pub states: BTreeMap<String, FeeRates>,
}

impl FeeSchedule {
    pub fn rates_for(&self, state: &str) -> Option<&FeeRates> {
        self.states
            .get(&state.to_uppercase())
            .or(self.fallback.as_ref())
    }
}

/// A fee with an optional operator override. The computed value is kept
/// for audit even when overridden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeComponent {
    pub computed: Cents,
    #[serde(default)]
    pub manual: Option<Cents>,
}

impl FeeComponent {
    pub fn computed(value: Cents) -> Self {
        Self {
            computed: value,
            manual: None,
        }
    }

    pub fn effective(&self) -> Cents {
        self.manual.unwrap_or(self.computed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitComponent {
    Permit,
    Escort,
    PoleCar,
    Superload,
}

/// Permit costs for one transited state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitLineItem {
    pub state: String,
    #[serde(default)]
    pub state_name: Option<String>,
    pub miles: Decimal,
    /// Trucks (by plan index) needing a permit in this state
    pub truck_indices: Vec<usize>,
    pub escort_count: u32,
    pub pole_car_required: bool,
    pub superload: bool,
    pub permit_fee: FeeComponent,
    pub escort_fee: FeeComponent,
    pub pole_car_fee: FeeComponent,
    pub superload_fee: FeeComponent,
    pub total: Cents,
}

impl PermitLineItem {
    pub fn component_mut(&mut self, component: PermitComponent) -> &mut FeeComponent {
        match component {
            PermitComponent::Permit => &mut self.permit_fee,
            PermitComponent::Escort => &mut self.escort_fee,
            PermitComponent::PoleCar => &mut self.pole_car_fee,
            PermitComponent::Superload => &mut self.superload_fee,
        }
    }

    /// Set or clear an operator override and refresh the total
    pub fn set_override(&mut self, component: PermitComponent, manual: Option<Cents>) {
        self.component_mut(component).manual = manual;
        self.recompute_total();
    }

    pub fn recompute_total(&mut self) {
        self.total = self.permit_fee.effective()
            + self.escort_fee.effective()
            + self.pole_car_fee.effective()
            + self.superload_fee.effective();
    }
}

/// Sum of permit totals
pub fn permit_total(items: &[PermitLineItem]) -> Cents {
    items.iter().map(|p| p.total).sum()
}
