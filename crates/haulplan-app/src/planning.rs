//! Reference data and knobs shared by every planning pass

use std::collections::BTreeMap;

use haulplan_domain::model::{CandidateFilter, FeeSchedule, ThresholdTable, TruckCatalog};
use haulplan_domain::service::{PlanOptions, DEFAULT_MAX_CANDIDATES};
use haulplan_infra::{load_catalog, load_fee_schedule, load_thresholds};
use haulplan_types::Result;
use tracing::debug;

use crate::config::Config;

/// Truck catalog, thresholds and fee schedules resolved once per process
#[derive(Debug, Clone)]
pub struct PlanningContext {
    pub catalog: TruckCatalog,
    pub thresholds: ThresholdTable,
    /// Fee schedules keyed by tenant. A tenant without one can only price
    /// loads that need no permit.
    pub fees: BTreeMap<String, FeeSchedule>,
    pub max_candidates: usize,
    pub parallel: bool,
}

impl Default for PlanningContext {
    fn default() -> Self {
        Self {
            catalog: TruckCatalog::standard(),
            thresholds: ThresholdTable::default(),
            fees: BTreeMap::new(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
            parallel: true,
        }
    }
}

impl PlanningContext {
    /// Load the files named in `config`, falling back to built-ins
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => load_catalog(path)?,
            None => TruckCatalog::standard(),
        };
        let thresholds = match &config.thresholds_path {
            Some(path) => load_thresholds(path)?,
            None => ThresholdTable::default(),
        };
        let mut fees = BTreeMap::new();
        if let Some(path) = &config.fee_schedule_path {
            let schedule = load_fee_schedule(path)?;
            fees.insert(schedule.tenant_id.clone(), schedule);
        }

        debug!(
            trucks = catalog.len(),
            threshold_states = thresholds.states.len(),
            fee_tenants = fees.len(),
            "planning context ready"
        );
        Ok(Self {
            catalog,
            thresholds,
            fees,
            max_candidates: config.max_candidates,
            parallel: config.parallel,
        })
    }

    /// Add a schedule, replacing any earlier one for the same tenant
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees.insert(fees.tenant_id.clone(), fees);
        self
    }

    pub fn fees_for(&self, tenant_id: &str) -> Option<&FeeSchedule> {
        self.fees.get(tenant_id)
    }

    pub fn plan_options(&self, filter: CandidateFilter, route_states: Vec<String>) -> PlanOptions {
        PlanOptions {
            filter,
            max_candidates: self.max_candidates,
            parallel: self.parallel,
            route_states,
            thresholds: self.thresholds.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_use_builtin_catalog() {
        let context = PlanningContext::from_config(&Config::default()).unwrap();
        assert_eq!(context.catalog.len(), TruckCatalog::standard().len());
        assert!(context.fees.is_empty());
        assert_eq!(context.max_candidates, DEFAULT_MAX_CANDIDATES);
    }

    #[test]
    fn test_loads_fee_schedule_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            "tenant_id = \"acme\"\n\n[fallback]\nbase_permit_fee = 5000\nescort_rate_per_mile = 150\npole_car_fee = 20000\nsuperload_surcharge = 90000\n"
        )
        .unwrap();
        let config = Config {
            fee_schedule_path: Some(file.path().to_path_buf()),
            max_candidates: 3,
            parallel: false,
            ..Config::default()
        };
        let context = PlanningContext::from_config(&config).unwrap();
        assert_eq!(context.fees_for("acme").unwrap().tenant_id, "acme");
        assert!(context.fees_for("other").is_none());

        let options = context.plan_options(CandidateFilter::default(), vec!["TX".to_string()]);
        assert_eq!(options.max_candidates, 3);
        assert!(!options.parallel);
        assert_eq!(options.route_states, vec!["TX"]);
    }

    #[test]
    fn test_fees_are_kept_per_tenant() {
        let schedule = |tenant: &str| FeeSchedule {
            tenant_id: tenant.to_string(),
            fallback: None,
            states: Default::default(),
        };
        let context = PlanningContext::default()
            .with_fees(schedule("acme"))
            .with_fees(schedule("zenith"));
        assert_eq!(context.fees.len(), 2);
        assert_eq!(context.fees_for("zenith").unwrap().tenant_id, "zenith");
        assert!(context.fees_for("t1").is_none());
    }

    #[test]
    fn test_missing_catalog_file_fails() {
        let config = Config {
            catalog_path: Some("/nonexistent/trucks.toml".into()),
            ..Config::default()
        };
        assert!(PlanningContext::from_config(&config).is_err());
    }
}
