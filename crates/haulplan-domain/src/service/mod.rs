//! Domain services

pub mod candidate_selector;
pub mod load_planner;
pub mod normalizer;
pub mod permit_evaluator;
pub mod placement_engine;
pub mod truck_scorer;

pub use candidate_selector::{select_candidates, suitability};
pub use load_planner::{plan_load, CandidateSummary, LoadPlan, PlanOptions, DEFAULT_MAX_CANDIDATES};
pub use normalizer::{
    normalize_item, normalize_items, normalize_length, normalize_quantity, normalize_weight,
    parse_currency, LengthUnit, RawCargoItem, RawNumber, WeightUnit,
};
pub use permit_evaluator::{
    assess, evaluate_permits, merge_mileage, state_fees, states_requiring_permit,
    PermitAssessment, StateFees,
};
pub use placement_engine::{legal_violations, load_dimensions, place_items};
pub use truck_scorer::{apply_score, score};
