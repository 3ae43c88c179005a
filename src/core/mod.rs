mod capacity;
mod costs;
mod income;
mod modifiers;
mod numeric;
mod services;
mod state;
mod store;

pub use capacity::{
    CapacityMetrics, DAYS_PER_WEEK, MONTHS_PER_YEAR, WEEKS_PER_CYCLE, WEEKS_PER_YEAR,
    derive_capacity,
};
pub use costs::{
    CostMetrics, CostTotals, MAX_TAX_RATE_PERCENT, VariableCostMetrics, compute_costs,
};
pub use income::{
    DEFAULT_ANNUAL_TARGET_NET, IncomeTargetMetrics, TargetNetDefaults, derive_income_targets,
    derive_target_net_defaults,
};
pub use modifiers::{NormalizedModifiers, normalize_modifiers};
pub use numeric::{clamp, normalize_percent, normalize_percent_default, to_number};
pub use services::{
    ServiceConfig, ServiceContext, ServiceResult, compute_service, compute_service_with,
    merged_service_config, service_catalog, service_result, service_results,
};
pub use state::{
    Basis, CapacityPatch, CapacityState, ConfigPatch, ConfigState, CostsPatch, CostsState,
    FixedCostsPatch, FixedCostsState, IncomeTargetsPatch, IncomeTargetsState, ModifiersPatch,
    ModifiersState, STATE_VERSION, ServiceOverrides, ServicesPatch, ServicesState, State,
    StatePatch, TargetMode, TargetNetDefaultsPatch, TaxPatch, TaxRegime, TaxState, TravelPatch,
    TravelState, VariableCostsPatch, VariableCostsState, initial_state,
};
pub use store::{Derived, ListenerId, Store};
