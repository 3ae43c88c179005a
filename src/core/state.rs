use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::income::TargetNetDefaults;

pub const STATE_VERSION: u32 = 3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetMode {
    Net,
    Gross,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Basis {
    Year,
    Week,
    Month,
    #[serde(alias = "averageWeek", alias = "average_week")]
    AverageWeek,
    #[serde(alias = "averageMonth", alias = "average_month")]
    AverageMonth,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaxRegime {
    #[serde(alias = "flat")]
    Simplified,
    #[serde(alias = "progressive")]
    Standard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct State {
    pub version: u32,
    pub income_targets: IncomeTargetsState,
    pub modifiers: ModifiersState,
    pub capacity: CapacityState,
    pub costs: CostsState,
    pub tax: TaxState,
    pub services: ServicesState,
    pub config: ConfigState,
}

impl Default for State {
    fn default() -> Self {
        initial_state()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeTargetsState {
    pub mode: TargetMode,
    pub basis: Basis,
    pub year: f64,
    pub week: f64,
    pub month: f64,
    pub average_week: f64,
    pub average_month: f64,
}

impl Default for IncomeTargetsState {
    fn default() -> Self {
        Self {
            mode: TargetMode::Net,
            basis: Basis::Year,
            year: 50_000.0,
            week: 1_900.0,
            month: 5_200.0,
            average_week: 1_000.0,
            average_month: 4_200.0,
        }
    }
}

/// Scenario levers. Canonical `*_percent` fields are preferred; the bare
/// names are legacy spellings still accepted from older saved payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModifiersState {
    pub comfort_margin_percent: Option<f64>,
    pub comfort_margin: Option<f64>,
    pub seasonality_percent: Option<f64>,
    pub seasonality: Option<f64>,
    pub travel_friction_percent: Option<f64>,
    pub travel_friction: Option<f64>,
    pub hands_on_percent: Option<f64>,
    pub hands_on: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CapacityState {
    pub months_off: f64,
    pub weeks_off_cycle: f64,
    pub days_off_week: f64,
    pub utilization_percent: f64,
    pub travel: TravelState,
}

impl Default for CapacityState {
    fn default() -> Self {
        Self {
            months_off: 1.0,
            weeks_off_cycle: 0.0,
            days_off_week: 2.0,
            utilization_percent: 70.0,
            travel: TravelState::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TravelState {
    pub days_per_year: Option<f64>,
    pub days_per_month: Option<f64>,
    pub days_per_cycle: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostsState {
    pub tax_rate_percent: f64,
    pub vat_rate_percent: f64,
    pub buffer_percent: f64,
    pub fixed: FixedCostsState,
    pub variable: VariableCostsState,
}

impl Default for CostsState {
    fn default() -> Self {
        Self {
            tax_rate_percent: 30.0,
            vat_rate_percent: 21.0,
            buffer_percent: 15.0,
            fixed: FixedCostsState::default(),
            variable: VariableCostsState::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixedCostsState {
    /// Explicit annual total; wins over the breakdown sum when set.
    pub annual_total: Option<f64>,
    pub breakdown: BTreeMap<String, f64>,
}

impl Default for FixedCostsState {
    fn default() -> Self {
        let mut breakdown = BTreeMap::new();
        breakdown.insert("workspace".to_string(), 3_600.0);
        breakdown.insert("insurance".to_string(), 1_200.0);
        breakdown.insert("tooling".to_string(), 1_800.0);
        breakdown.insert("accounting".to_string(), 900.0);
        Self {
            annual_total: None,
            breakdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VariableCostsState {
    pub per_working_day: f64,
    pub per_billable_day: f64,
    pub per_travel_day: f64,
    pub other_annual: f64,
}

impl Default for VariableCostsState {
    fn default() -> Self {
        Self {
            per_working_day: 8.0,
            per_billable_day: 12.0,
            per_travel_day: 45.0,
            other_annual: 1_500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxState {
    pub regime: TaxRegime,
    pub vat_registered: bool,
    pub include_vat_in_prices: bool,
}

impl Default for TaxState {
    fn default() -> Self {
        Self {
            regime: TaxRegime::Simplified,
            vat_registered: true,
            include_vat_in_prices: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServicesState {
    pub overrides: BTreeMap<String, ServiceOverrides>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceOverrides {
    pub enabled: Option<bool>,
    pub units_per_month: Option<f64>,
    pub units_per_year: Option<f64>,
    pub share_of_capacity: Option<f64>,
    pub days_per_unit: Option<f64>,
    pub base_price: Option<f64>,
    pub price_per_unit: Option<f64>,
    pub direct_cost_per_unit: Option<f64>,
    pub overhead_share: Option<f64>,
    pub tax_rate_percent: Option<f64>,
}

impl ServiceOverrides {
    fn merge_from(&mut self, patch: &ServiceOverrides) {
        if let Some(v) = patch.enabled {
            self.enabled = Some(v);
        }
        if let Some(v) = patch.units_per_month {
            self.units_per_month = Some(v);
        }
        if let Some(v) = patch.units_per_year {
            self.units_per_year = Some(v);
        }
        if let Some(v) = patch.share_of_capacity {
            self.share_of_capacity = Some(v);
        }
        if let Some(v) = patch.days_per_unit {
            self.days_per_unit = Some(v);
        }
        if let Some(v) = patch.base_price {
            self.base_price = Some(v);
        }
        if let Some(v) = patch.price_per_unit {
            self.price_per_unit = Some(v);
        }
        if let Some(v) = patch.direct_cost_per_unit {
            self.direct_cost_per_unit = Some(v);
        }
        if let Some(v) = patch.overhead_share {
            self.overhead_share = Some(v);
        }
        if let Some(v) = patch.tax_rate_percent {
            self.tax_rate_percent = Some(v);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigState {
    pub currency_symbol: String,
    pub target_defaults: TargetNetDefaults,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self {
            currency_symbol: "€".to_string(),
            target_defaults: TargetNetDefaults::default(),
        }
    }
}

/// Fresh template value. Each call builds a new tree; nothing is shared
/// with previously returned states.
pub fn initial_state() -> State {
    State {
        version: STATE_VERSION,
        income_targets: IncomeTargetsState::default(),
        modifiers: ModifiersState::default(),
        capacity: CapacityState::default(),
        costs: CostsState::default(),
        tax: TaxState::default(),
        services: ServicesState::default(),
        config: ConfigState::default(),
    }
}

/// Partial state. Absent fields are no-ops; present object sections merge
/// recursively; present scalars replace the stored value wholesale.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatePatch {
    pub version: Option<u32>,
    pub income_targets: Option<IncomeTargetsPatch>,
    pub modifiers: Option<ModifiersPatch>,
    pub capacity: Option<CapacityPatch>,
    pub costs: Option<CostsPatch>,
    pub tax: Option<TaxPatch>,
    pub services: Option<ServicesPatch>,
    pub config: Option<ConfigPatch>,
}

impl StatePatch {
    pub fn apply_to(&self, state: &mut State) {
        if let Some(v) = self.version {
            state.version = v;
        }
        if let Some(p) = &self.income_targets {
            p.apply_to(&mut state.income_targets);
        }
        if let Some(p) = &self.modifiers {
            p.apply_to(&mut state.modifiers);
        }
        if let Some(p) = &self.capacity {
            p.apply_to(&mut state.capacity);
        }
        if let Some(p) = &self.costs {
            p.apply_to(&mut state.costs);
        }
        if let Some(p) = &self.tax {
            p.apply_to(&mut state.tax);
        }
        if let Some(p) = &self.services {
            p.apply_to(&mut state.services);
        }
        if let Some(p) = &self.config {
            p.apply_to(&mut state.config);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeTargetsPatch {
    pub mode: Option<TargetMode>,
    pub basis: Option<Basis>,
    pub year: Option<f64>,
    pub week: Option<f64>,
    pub month: Option<f64>,
    pub average_week: Option<f64>,
    pub average_month: Option<f64>,
}

impl IncomeTargetsPatch {
    fn apply_to(&self, state: &mut IncomeTargetsState) {
        if let Some(v) = self.mode {
            state.mode = v;
        }
        if let Some(v) = self.basis {
            state.basis = v;
        }
        if let Some(v) = self.year {
            state.year = v;
        }
        if let Some(v) = self.week {
            state.week = v;
        }
        if let Some(v) = self.month {
            state.month = v;
        }
        if let Some(v) = self.average_week {
            state.average_week = v;
        }
        if let Some(v) = self.average_month {
            state.average_month = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModifiersPatch {
    pub comfort_margin_percent: Option<f64>,
    pub comfort_margin: Option<f64>,
    pub seasonality_percent: Option<f64>,
    pub seasonality: Option<f64>,
    pub travel_friction_percent: Option<f64>,
    pub travel_friction: Option<f64>,
    pub hands_on_percent: Option<f64>,
    pub hands_on: Option<f64>,
}

impl ModifiersPatch {
    fn apply_to(&self, state: &mut ModifiersState) {
        if let Some(v) = self.comfort_margin_percent {
            state.comfort_margin_percent = Some(v);
        }
        if let Some(v) = self.comfort_margin {
            state.comfort_margin = Some(v);
        }
        if let Some(v) = self.seasonality_percent {
            state.seasonality_percent = Some(v);
        }
        if let Some(v) = self.seasonality {
            state.seasonality = Some(v);
        }
        if let Some(v) = self.travel_friction_percent {
            state.travel_friction_percent = Some(v);
        }
        if let Some(v) = self.travel_friction {
            state.travel_friction = Some(v);
        }
        if let Some(v) = self.hands_on_percent {
            state.hands_on_percent = Some(v);
        }
        if let Some(v) = self.hands_on {
            state.hands_on = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CapacityPatch {
    pub months_off: Option<f64>,
    pub weeks_off_cycle: Option<f64>,
    pub days_off_week: Option<f64>,
    pub utilization_percent: Option<f64>,
    pub travel: Option<TravelPatch>,
}

impl CapacityPatch {
    fn apply_to(&self, state: &mut CapacityState) {
        if let Some(v) = self.months_off {
            state.months_off = v;
        }
        if let Some(v) = self.weeks_off_cycle {
            state.weeks_off_cycle = v;
        }
        if let Some(v) = self.days_off_week {
            state.days_off_week = v;
        }
        if let Some(v) = self.utilization_percent {
            state.utilization_percent = v;
        }
        if let Some(p) = &self.travel {
            p.apply_to(&mut state.travel);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TravelPatch {
    pub days_per_year: Option<f64>,
    pub days_per_month: Option<f64>,
    pub days_per_cycle: Option<f64>,
}

impl TravelPatch {
    fn apply_to(&self, state: &mut TravelState) {
        if let Some(v) = self.days_per_year {
            state.days_per_year = Some(v);
        }
        if let Some(v) = self.days_per_month {
            state.days_per_month = Some(v);
        }
        if let Some(v) = self.days_per_cycle {
            state.days_per_cycle = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostsPatch {
    pub tax_rate_percent: Option<f64>,
    pub vat_rate_percent: Option<f64>,
    pub buffer_percent: Option<f64>,
    pub fixed: Option<FixedCostsPatch>,
    pub variable: Option<VariableCostsPatch>,
}

impl CostsPatch {
    fn apply_to(&self, state: &mut CostsState) {
        if let Some(v) = self.tax_rate_percent {
            state.tax_rate_percent = v;
        }
        if let Some(v) = self.vat_rate_percent {
            state.vat_rate_percent = v;
        }
        if let Some(v) = self.buffer_percent {
            state.buffer_percent = v;
        }
        if let Some(p) = &self.fixed {
            p.apply_to(&mut state.fixed);
        }
        if let Some(p) = &self.variable {
            p.apply_to(&mut state.variable);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixedCostsPatch {
    pub annual_total: Option<f64>,
    pub breakdown: BTreeMap<String, f64>,
}

impl FixedCostsPatch {
    fn apply_to(&self, state: &mut FixedCostsState) {
        if let Some(v) = self.annual_total {
            state.annual_total = Some(v);
        }
        for (key, value) in &self.breakdown {
            state.breakdown.insert(key.clone(), *value);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VariableCostsPatch {
    pub per_working_day: Option<f64>,
    pub per_billable_day: Option<f64>,
    pub per_travel_day: Option<f64>,
    pub other_annual: Option<f64>,
}

impl VariableCostsPatch {
    fn apply_to(&self, state: &mut VariableCostsState) {
        if let Some(v) = self.per_working_day {
            state.per_working_day = v;
        }
        if let Some(v) = self.per_billable_day {
            state.per_billable_day = v;
        }
        if let Some(v) = self.per_travel_day {
            state.per_travel_day = v;
        }
        if let Some(v) = self.other_annual {
            state.other_annual = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxPatch {
    pub regime: Option<TaxRegime>,
    pub vat_registered: Option<bool>,
    pub include_vat_in_prices: Option<bool>,
}

impl TaxPatch {
    fn apply_to(&self, state: &mut TaxState) {
        if let Some(v) = self.regime {
            state.regime = v;
        }
        if let Some(v) = self.vat_registered {
            state.vat_registered = v;
        }
        if let Some(v) = self.include_vat_in_prices {
            state.include_vat_in_prices = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServicesPatch {
    pub overrides: BTreeMap<String, ServiceOverrides>,
}

impl ServicesPatch {
    fn apply_to(&self, state: &mut ServicesState) {
        for (id, patch) in &self.overrides {
            state
                .overrides
                .entry(id.clone())
                .or_default()
                .merge_from(patch);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
    pub currency_symbol: Option<String>,
    pub target_defaults: Option<TargetNetDefaultsPatch>,
}

impl ConfigPatch {
    fn apply_to(&self, state: &mut ConfigState) {
        if let Some(v) = &self.currency_symbol {
            state.currency_symbol = v.clone();
        }
        if let Some(p) = &self.target_defaults {
            p.apply_to(&mut state.target_defaults);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetNetDefaultsPatch {
    pub year: Option<f64>,
    pub week: Option<f64>,
    pub month: Option<f64>,
    pub average_week: Option<f64>,
    pub average_month: Option<f64>,
}

impl TargetNetDefaultsPatch {
    fn apply_to(&self, defaults: &mut TargetNetDefaults) {
        if let Some(v) = self.year {
            defaults.year = v;
        }
        if let Some(v) = self.week {
            defaults.week = v;
        }
        if let Some(v) = self.month {
            defaults.month = v;
        }
        if let Some(v) = self.average_week {
            defaults.average_week = v;
        }
        if let Some(v) = self.average_month {
            defaults.average_month = v;
        }
    }
}
