use serde::Serialize;

use super::capacity::{CapacityMetrics, derive_capacity};
use super::costs::{CostMetrics, MAX_TAX_RATE_PERCENT, compute_costs};
use super::income::{IncomeTargetMetrics, derive_income_targets, derive_target_net_defaults};
use super::modifiers::{NormalizedModifiers, normalize_modifiers};
use super::numeric::{normalize_percent, normalize_percent_default};
use super::services::{
    ServiceContext, ServiceResult, compute_service_with, service_result, service_results,
};
use super::state::{
    Basis, CapacityPatch, CostsPatch, IncomeTargetsPatch, ModifiersPatch, State, StatePatch,
    TravelPatch, initial_state,
};

/// Everything recomputed from scratch after each mutation. Service
/// economics are intentionally absent; consumers ask for them on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub modifiers: NormalizedModifiers,
    pub capacity: CapacityMetrics,
    pub costs: CostMetrics,
    pub income: IncomeTargetMetrics,
}

pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&State, &Derived)>;

/// Single source of truth. Each instance is independent; there is no
/// process-wide store. Mutation requires `&mut self`, so a listener can
/// never re-enter `patch` while a notification is in flight.
pub struct Store {
    state: State,
    derived: Derived,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: ListenerId,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(initial_state())
    }

    pub fn with_state(mut state: State) -> Self {
        let derived = recompute(&mut state);
        Self {
            state,
            derived,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    /// Live reference to canonical state. Immutable by construction.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Snapshot copy of the derived metrics.
    pub fn derived(&self) -> Derived {
        self.derived
    }

    /// Replaces the entire state, recomputes, notifies.
    pub fn set(&mut self, next: State) {
        self.state = next;
        self.refresh();
    }

    /// Deep-merges a partial state, recomputes, notifies.
    pub fn patch(&mut self, patch: StatePatch) {
        patch.apply_to(&mut self.state);
        self.refresh();
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&State, &Derived) + 'static) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn service_results(&self) -> Vec<ServiceResult> {
        service_results(&self.state, &self.derived.capacity, &self.derived.costs)
    }

    pub fn service_result(&self, id: &str) -> Option<ServiceResult> {
        service_result(&self.state, &self.derived.capacity, &self.derived.costs, id)
    }

    pub fn service_result_with<F>(&self, id: &str, custom: F) -> Option<ServiceResult>
    where
        F: FnOnce(&ServiceContext<'_>) -> Result<ServiceResult, String>,
    {
        compute_service_with(
            &self.state,
            &self.derived.capacity,
            &self.derived.costs,
            id,
            custom,
        )
    }

    /// Clamps to [0, 12].
    pub fn set_months_off(&mut self, raw: &str) {
        let value = normalize_percent(Some(raw), self.state.capacity.months_off, 0.0, 12.0);
        self.patch(capacity_patch(CapacityPatch {
            months_off: Some(value),
            ..CapacityPatch::default()
        }));
    }

    /// Clamps to [0, 4].
    pub fn set_weeks_off_cycle(&mut self, raw: &str) {
        let value = normalize_percent(Some(raw), self.state.capacity.weeks_off_cycle, 0.0, 4.0);
        self.patch(capacity_patch(CapacityPatch {
            weeks_off_cycle: Some(value),
            ..CapacityPatch::default()
        }));
    }

    /// Clamps to [0, 7].
    pub fn set_days_off_week(&mut self, raw: &str) {
        let value = normalize_percent(Some(raw), self.state.capacity.days_off_week, 0.0, 7.0);
        self.patch(capacity_patch(CapacityPatch {
            days_off_week: Some(value),
            ..CapacityPatch::default()
        }));
    }

    /// Clamps to [0, 100].
    pub fn set_utilization_percent(&mut self, raw: &str) {
        let value = normalize_percent_default(Some(raw), self.state.capacity.utilization_percent);
        self.patch(capacity_patch(CapacityPatch {
            utilization_percent: Some(value),
            ..CapacityPatch::default()
        }));
    }

    /// Clamps to [0, 365].
    pub fn set_travel_days_per_year(&mut self, raw: &str) {
        let fallback = self.state.capacity.travel.days_per_year.unwrap_or(0.0);
        let value = normalize_percent(Some(raw), fallback, 0.0, 365.0);
        self.patch(capacity_patch(CapacityPatch {
            travel: Some(TravelPatch {
                days_per_year: Some(value),
                ..TravelPatch::default()
            }),
            ..CapacityPatch::default()
        }));
    }

    /// Clamps to [0, 99.9].
    pub fn set_tax_rate_percent(&mut self, raw: &str) {
        let value = normalize_percent(
            Some(raw),
            self.state.costs.tax_rate_percent,
            0.0,
            MAX_TAX_RATE_PERCENT,
        );
        self.patch(costs_patch(CostsPatch {
            tax_rate_percent: Some(value),
            ..CostsPatch::default()
        }));
    }

    /// Clamps to [0, unbounded).
    pub fn set_vat_rate_percent(&mut self, raw: &str) {
        let value = normalize_percent(
            Some(raw),
            self.state.costs.vat_rate_percent,
            0.0,
            f64::INFINITY,
        );
        self.patch(costs_patch(CostsPatch {
            vat_rate_percent: Some(value),
            ..CostsPatch::default()
        }));
    }

    /// Clamps to [0, 100].
    pub fn set_buffer_percent(&mut self, raw: &str) {
        let value = normalize_percent_default(Some(raw), self.state.costs.buffer_percent);
        self.patch(costs_patch(CostsPatch {
            buffer_percent: Some(value),
            ..CostsPatch::default()
        }));
    }

    /// Clamps to [0, 75].
    pub fn set_seasonality_percent(&mut self, raw: &str) {
        let fallback = self.state.modifiers.seasonality_percent.unwrap_or(0.0);
        let value = normalize_percent(Some(raw), fallback, 0.0, 75.0);
        self.patch(modifiers_patch(ModifiersPatch {
            seasonality_percent: Some(value),
            ..ModifiersPatch::default()
        }));
    }

    /// Clamps to [0, 60].
    pub fn set_comfort_margin_percent(&mut self, raw: &str) {
        let fallback = self.state.modifiers.comfort_margin_percent.unwrap_or(10.0);
        let value = normalize_percent(Some(raw), fallback, 0.0, 60.0);
        self.patch(modifiers_patch(ModifiersPatch {
            comfort_margin_percent: Some(value),
            ..ModifiersPatch::default()
        }));
    }

    /// Clamps to [0, 150].
    pub fn set_travel_friction_percent(&mut self, raw: &str) {
        let fallback = self.state.modifiers.travel_friction_percent.unwrap_or(0.0);
        let value = normalize_percent(Some(raw), fallback, 0.0, 150.0);
        self.patch(modifiers_patch(ModifiersPatch {
            travel_friction_percent: Some(value),
            ..ModifiersPatch::default()
        }));
    }

    /// Clamps to [0, 100].
    pub fn set_hands_on_percent(&mut self, raw: &str) {
        let fallback = self.state.modifiers.hands_on_percent.unwrap_or(50.0);
        let value = normalize_percent_default(Some(raw), fallback);
        self.patch(modifiers_patch(ModifiersPatch {
            hands_on_percent: Some(value),
            ..ModifiersPatch::default()
        }));
    }

    pub fn set_target_basis(&mut self, basis: Basis) {
        self.patch(income_patch(IncomeTargetsPatch {
            basis: Some(basis),
            ..IncomeTargetsPatch::default()
        }));
    }

    /// Sets the raw figure for the currently selected basis.
    pub fn set_target_value(&mut self, raw: &str) {
        let targets = &self.state.income_targets;
        let fallback = match targets.basis {
            Basis::Year => targets.year,
            Basis::Week => targets.week,
            Basis::Month => targets.month,
            Basis::AverageWeek => targets.average_week,
            Basis::AverageMonth => targets.average_month,
        };
        let value = normalize_percent(Some(raw), fallback, 0.0, f64::INFINITY);
        let mut patch = IncomeTargetsPatch::default();
        match targets.basis {
            Basis::Year => patch.year = Some(value),
            Basis::Week => patch.week = Some(value),
            Basis::Month => patch.month = Some(value),
            Basis::AverageWeek => patch.average_week = Some(value),
            Basis::AverageMonth => patch.average_month = Some(value),
        }
        self.patch(income_patch(patch));
    }

    fn refresh(&mut self) {
        self.derived = recompute(&mut self.state);
        self.notify();
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state, &self.derived);
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed derivation order: capacity feeds costs, capacity feeds the
/// target-net defaults (merged back into config), then income targets read
/// the refreshed state.
fn recompute(state: &mut State) -> Derived {
    let modifiers = normalize_modifiers(&state.modifiers);
    let capacity = derive_capacity(&state.capacity, &state.modifiers);
    let costs = compute_costs(state, &capacity);
    state.config.target_defaults = derive_target_net_defaults(&capacity);
    let income = derive_income_targets(state, &capacity);

    Derived {
        modifiers,
        capacity,
        costs,
        income,
    }
}

fn capacity_patch(patch: CapacityPatch) -> StatePatch {
    StatePatch {
        capacity: Some(patch),
        ..StatePatch::default()
    }
}

fn costs_patch(patch: CostsPatch) -> StatePatch {
    StatePatch {
        costs: Some(patch),
        ..StatePatch::default()
    }
}

fn modifiers_patch(patch: ModifiersPatch) -> StatePatch {
    StatePatch {
        modifiers: Some(patch),
        ..StatePatch::default()
    }
}

fn income_patch(patch: IncomeTargetsPatch) -> StatePatch {
    StatePatch {
        income_targets: Some(patch),
        ..StatePatch::default()
    }
}
