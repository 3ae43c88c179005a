use serde::Serialize;

use super::capacity::{CapacityMetrics, MONTHS_PER_YEAR};
use super::modifiers::normalize_modifiers;
use super::numeric::clamp;
use super::state::State;

pub const MAX_TAX_RATE_PERCENT: f64 = 99.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostTotals {
    pub annual: f64,
    pub monthly: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableCostMetrics {
    pub working_days_annual: f64,
    pub billable_days_annual: f64,
    pub travel_days_annual: f64,
    pub other_annual: f64,
    pub annual: f64,
    pub monthly: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostMetrics {
    pub tax_rate: f64,
    pub vat_rate: f64,
    pub effective_buffer: f64,
    pub fixed: CostTotals,
    pub variable: VariableCostMetrics,
    pub total: CostTotals,
}

pub fn compute_costs(state: &State, capacity: &CapacityMetrics) -> CostMetrics {
    let modifiers = normalize_modifiers(&state.modifiers);

    let tax_rate = clamp(state.costs.tax_rate_percent, 0.0, MAX_TAX_RATE_PERCENT) / 100.0;
    let vat_rate = if state.tax.vat_registered {
        non_negative(state.costs.vat_rate_percent) / 100.0
    } else {
        0.0
    };

    // Scenario comfort margin stacks additively onto the manual buffer.
    let effective_buffer = (clamp(state.costs.buffer_percent, 0.0, 100.0)
        + modifiers.comfort_margin_percent)
        / 100.0;

    let fixed_annual = resolve_fixed_annual(state);
    let fixed = CostTotals {
        annual: fixed_annual,
        monthly: fixed_annual / MONTHS_PER_YEAR,
    };

    let working_days_annual =
        non_negative(state.costs.variable.per_working_day) * capacity.working_days_per_year;
    let billable_days_annual =
        non_negative(state.costs.variable.per_billable_day) * capacity.billable_days_after_travel;
    let travel_days_annual =
        non_negative(state.costs.variable.per_travel_day) * capacity.travel_allowance_days;
    let other_annual = non_negative(state.costs.variable.other_annual);

    let variable_annual =
        working_days_annual + billable_days_annual + travel_days_annual + other_annual;
    let variable = VariableCostMetrics {
        working_days_annual,
        billable_days_annual,
        travel_days_annual,
        other_annual,
        annual: variable_annual,
        monthly: variable_annual / MONTHS_PER_YEAR,
    };

    let total_annual = fixed.annual + variable.annual;
    let total = CostTotals {
        annual: total_annual,
        monthly: total_annual / MONTHS_PER_YEAR,
    };

    CostMetrics {
        tax_rate,
        vat_rate,
        effective_buffer,
        fixed,
        variable,
        total,
    }
}

/// Explicit annual total wins; otherwise the breakdown sum. Negative
/// breakdown entries are discarded, not subtracted.
fn resolve_fixed_annual(state: &State) -> f64 {
    if let Some(total) = state.costs.fixed.annual_total.filter(|v| v.is_finite()) {
        return total.max(0.0);
    }

    state
        .costs
        .fixed
        .breakdown
        .values()
        .filter(|v| v.is_finite() && **v > 0.0)
        .sum()
}

fn non_negative(value: f64) -> f64 {
    clamp(value, 0.0, f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capacity::derive_capacity;
    use crate::core::state::{ModifiersState, initial_state};
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn derived_costs(state: &State) -> CostMetrics {
        let capacity = derive_capacity(&state.capacity, &state.modifiers);
        compute_costs(state, &capacity)
    }

    #[test]
    fn comfort_margin_stacks_onto_the_buffer() {
        let mut state = initial_state();
        state.costs.tax_rate_percent = 40.0;
        state.costs.vat_rate_percent = 21.0;
        state.costs.buffer_percent = 15.0;
        state.modifiers = ModifiersState {
            comfort_margin_percent: Some(10.0),
            ..ModifiersState::default()
        };

        let costs = derived_costs(&state);
        assert_approx(costs.effective_buffer, 0.25);
        assert_approx(costs.tax_rate, 0.4);
        assert_approx(costs.vat_rate, 0.21);
    }

    #[test]
    fn tax_rate_clamps_below_one_hundred_percent() {
        let mut state = initial_state();
        state.costs.tax_rate_percent = 150.0;
        assert_approx(derived_costs(&state).tax_rate, 0.999);
    }

    #[test]
    fn vat_is_zero_when_not_registered() {
        let mut state = initial_state();
        state.costs.vat_rate_percent = 21.0;
        state.tax.vat_registered = false;
        assert_approx(derived_costs(&state).vat_rate, 0.0);
    }

    #[test]
    fn explicit_fixed_total_wins_over_breakdown() {
        let mut state = initial_state();
        state.costs.fixed.annual_total = Some(10_000.0);
        assert_approx(derived_costs(&state).fixed.annual, 10_000.0);
    }

    #[test]
    fn breakdown_sum_discards_negative_entries() {
        let mut state = initial_state();
        state.costs.fixed.annual_total = None;
        state.costs.fixed.breakdown.clear();
        state
            .costs
            .fixed
            .breakdown
            .insert("workspace".to_string(), 3_000.0);
        state
            .costs
            .fixed
            .breakdown
            .insert("refund".to_string(), -500.0);
        state
            .costs
            .fixed
            .breakdown
            .insert("insurance".to_string(), 1_000.0);

        assert_approx(derived_costs(&state).fixed.annual, 4_000.0);
    }

    #[test]
    fn variable_costs_scale_with_capacity_stages() {
        let mut state = initial_state();
        state.capacity.months_off = 0.0;
        state.capacity.weeks_off_cycle = 0.0;
        state.capacity.days_off_week = 2.0;
        state.capacity.utilization_percent = 50.0;
        state.capacity.travel.days_per_year = Some(10.0);
        state.modifiers = ModifiersState {
            seasonality_percent: Some(0.0),
            travel_friction_percent: Some(0.0),
            ..ModifiersState::default()
        };
        state.costs.variable.per_working_day = 2.0;
        state.costs.variable.per_billable_day = 4.0;
        state.costs.variable.per_travel_day = 10.0;
        state.costs.variable.other_annual = 100.0;

        let capacity = derive_capacity(&state.capacity, &state.modifiers);
        let costs = compute_costs(&state, &capacity);

        assert_approx(capacity.working_days_per_year, 260.0);
        assert_approx(capacity.billable_days_per_year, 130.0);
        assert_approx(capacity.billable_days_after_travel, 120.0);
        assert_approx(costs.variable.working_days_annual, 520.0);
        assert_approx(costs.variable.billable_days_annual, 480.0);
        assert_approx(costs.variable.travel_days_annual, 100.0);
        assert_approx(costs.variable.annual, 1_200.0);
    }

    #[test]
    fn non_finite_cost_inputs_degrade_to_zero() {
        let mut state = initial_state();
        state.costs.variable.per_working_day = f64::NAN;
        state.costs.variable.other_annual = f64::INFINITY;
        state.costs.vat_rate_percent = f64::NAN;

        let costs = derived_costs(&state);
        assert_approx(costs.variable.working_days_annual, 0.0);
        assert_approx(costs.variable.other_annual, 0.0);
        assert_approx(costs.vat_rate, 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_total_is_exactly_fixed_plus_variable(
            months_off in 0.0f64..12.0,
            utilization in 0.0f64..100.0,
            per_working_day in 0.0f64..200.0,
            per_billable_day in 0.0f64..200.0,
            per_travel_day in 0.0f64..200.0,
            other_annual in 0.0f64..50_000.0,
            fixed_total in 0.0f64..100_000.0
        ) {
            let mut state = initial_state();
            state.capacity.months_off = months_off;
            state.capacity.utilization_percent = utilization;
            state.costs.fixed.annual_total = Some(fixed_total);
            state.costs.variable.per_working_day = per_working_day;
            state.costs.variable.per_billable_day = per_billable_day;
            state.costs.variable.per_travel_day = per_travel_day;
            state.costs.variable.other_annual = other_annual;

            let costs = derived_costs(&state);
            prop_assert!((costs.total.annual - (costs.fixed.annual + costs.variable.annual)).abs() <= 1e-9);
            prop_assert!(costs.total.annual >= 0.0);
            prop_assert!((costs.total.monthly - costs.total.annual / 12.0).abs() <= 1e-9);
        }
    }
}
