//! Route data supplied by the mapping collaborator

use haulplan_types::PlanError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Distance driven within one state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMileage {
    /// Two-letter state code
    pub state: String,
    #[serde(default)]
    pub state_name: Option<String>,
    pub miles: Decimal,
}

impl StateMileage {
    pub fn new(state: &str, miles: Decimal) -> Self {
        Self {
            state: state.to_uppercase(),
            state_name: None,
            miles,
        }
    }

    /// Miles must be zero or more
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.miles < Decimal::ZERO {
            return Err(PlanError::InvalidNumber {
                field: format!("miles in {}", self.state),
                value: self.miles.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Route {
    pub pickup: Coordinates,
    pub dropoff: Coordinates,
    pub distance_miles: Decimal,
    #[serde(default)]
    pub state_mileage: Vec<StateMileage>,
}

impl Route {
    /// State codes in travel order, without repeats
    pub fn states(&self) -> Vec<String> {
        let mut states: Vec<String> = Vec::new();
        for entry in &self.state_mileage {
            if !states.iter().any(|s| s.eq_ignore_ascii_case(&entry.state)) {
                states.push(entry.state.to_uppercase());
            }
        }
        states
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.distance_miles < Decimal::ZERO {
            return Err(PlanError::InvalidNumber {
                field: "distance_miles".to_string(),
                value: self.distance_miles.to_string(),
            });
        }
        self.state_mileage.iter().try_for_each(StateMileage::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_miles_rejected() {
        let mut route = Route {
            distance_miles: Decimal::from(150),
            state_mileage: vec![
                StateMileage::new("TX", Decimal::from(100)),
                StateMileage::new("OK", Decimal::ZERO),
            ],
            ..Route::default()
        };
        assert!(route.validate().is_ok());

        route.state_mileage[1].miles = Decimal::new(-5, 1);
        assert_eq!(
            route.validate(),
            Err(PlanError::InvalidNumber {
                field: "miles in OK".to_string(),
                value: "-0.5".to_string()
            })
        );

        route.state_mileage[1].miles = Decimal::from(50);
        route.distance_miles = Decimal::from(-1);
        assert!(route.validate().is_err());
    }
}
