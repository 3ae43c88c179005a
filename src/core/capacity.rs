use serde::Serialize;

use super::modifiers::normalize_modifiers;
use super::numeric::clamp;
use super::state::{CapacityState, ModifiersState, TravelState};

pub const MONTHS_PER_YEAR: f64 = 12.0;
pub const WEEKS_PER_YEAR: f64 = 52.0;
pub const WEEKS_PER_CYCLE: f64 = 4.0;
pub const DAYS_PER_WEEK: f64 = 7.0;

/// Seasonality can never remove more than 90% of capacity.
const SEASONALITY_FLOOR: f64 = 0.1;

/// Supply-side metrics. Every attrition stage is exposed so downstream
/// derivers and displays can pick the figure they need.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityMetrics {
    pub months_off: f64,
    pub weeks_off_cycle: f64,
    pub days_off_week: f64,
    pub active_month_share: f64,
    pub active_months: f64,
    pub weeks_share: f64,
    pub seasonality_penalty: f64,
    pub working_weeks: f64,
    pub working_days_per_week: f64,
    pub working_days_per_year: f64,
    pub utilization_rate: f64,
    pub billable_days_per_year: f64,
    pub travel_days_base: f64,
    pub travel_friction_multiplier: f64,
    pub travel_allowance_days: f64,
    pub billable_days_after_travel: f64,
}

pub fn derive_capacity(capacity: &CapacityState, modifiers: &ModifiersState) -> CapacityMetrics {
    let normalized = normalize_modifiers(modifiers);

    let months_off = clamp(capacity.months_off, 0.0, MONTHS_PER_YEAR);
    let weeks_off_cycle = clamp(capacity.weeks_off_cycle, 0.0, WEEKS_PER_CYCLE);
    let days_off_week = clamp(capacity.days_off_week, 0.0, DAYS_PER_WEEK);

    let active_month_share = (MONTHS_PER_YEAR - months_off) / MONTHS_PER_YEAR;
    let active_months = MONTHS_PER_YEAR * active_month_share;
    let weeks_share = (WEEKS_PER_CYCLE - weeks_off_cycle) / WEEKS_PER_CYCLE;

    let seasonality_penalty = (1.0 - normalized.seasonality_rate).max(SEASONALITY_FLOOR);
    let working_weeks = WEEKS_PER_YEAR * active_month_share * weeks_share * seasonality_penalty;

    let working_days_per_week = DAYS_PER_WEEK - days_off_week;
    let working_days_per_year = working_weeks * working_days_per_week;

    // Seasonality hits both the calendar and how much of it gets sold.
    let utilization_rate =
        clamp(capacity.utilization_percent / 100.0, 0.0, 1.0) * seasonality_penalty;
    let billable_days_per_year = working_days_per_year * utilization_rate;

    let travel_days_base = resolve_travel_days(&capacity.travel, active_months, working_weeks);
    let travel_friction_multiplier = 1.0 + normalized.travel_friction_rate.max(0.0);
    let travel_allowance_days =
        (travel_days_base * travel_friction_multiplier).min(working_days_per_year);
    let billable_days_after_travel = (billable_days_per_year - travel_allowance_days).max(0.0);

    CapacityMetrics {
        months_off,
        weeks_off_cycle,
        days_off_week,
        active_month_share,
        active_months,
        weeks_share,
        seasonality_penalty,
        working_weeks,
        working_days_per_week,
        working_days_per_year,
        utilization_rate,
        billable_days_per_year,
        travel_days_base,
        travel_friction_multiplier,
        travel_allowance_days,
        billable_days_after_travel,
    }
}

/// Annual travel days. An explicit annual figure wins; otherwise the larger
/// of the monthly and per-cycle estimates. Travel only happens in active
/// months, so both estimates scale with worked time rather than the raw
/// calendar.
fn resolve_travel_days(travel: &TravelState, active_months: f64, working_weeks: f64) -> f64 {
    if let Some(annual) = travel.days_per_year.filter(|v| v.is_finite()) {
        return annual.max(0.0);
    }

    let monthly_estimate = travel
        .days_per_month
        .filter(|v| v.is_finite())
        .map(|d| d.max(0.0) * active_months)
        .unwrap_or(0.0);
    let cycles_per_year = working_weeks / WEEKS_PER_CYCLE;
    let cycle_estimate = travel
        .days_per_cycle
        .filter(|v| v.is_finite())
        .map(|d| d.max(0.0) * cycles_per_year)
        .unwrap_or(0.0);

    monthly_estimate.max(cycle_estimate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn neutral_modifiers() -> ModifiersState {
        ModifiersState {
            seasonality_percent: Some(0.0),
            travel_friction_percent: Some(0.0),
            ..ModifiersState::default()
        }
    }

    fn capacity_inputs(
        months_off: f64,
        weeks_off_cycle: f64,
        days_off_week: f64,
        utilization_percent: f64,
    ) -> CapacityState {
        CapacityState {
            months_off,
            weeks_off_cycle,
            days_off_week,
            utilization_percent,
            travel: TravelState::default(),
        }
    }

    #[test]
    fn full_availability_yields_the_whole_calendar() {
        let metrics = derive_capacity(&capacity_inputs(0.0, 0.0, 0.0, 100.0), &neutral_modifiers());
        assert_approx(metrics.working_days_per_year, 364.0);
        assert_approx(metrics.billable_days_per_year, 364.0);
        assert_approx(metrics.billable_days_after_travel, 364.0);
    }

    #[test]
    fn attrition_stages_match_hand_computed_figures() {
        let metrics = derive_capacity(&capacity_inputs(2.0, 1.0, 2.0, 70.0), &neutral_modifiers());
        assert_approx(metrics.active_months, 10.0);
        assert_approx(metrics.weeks_share, 0.75);
        assert_approx(metrics.working_weeks, 32.5);
        assert_approx(metrics.working_days_per_week, 5.0);
        assert_approx(metrics.working_days_per_year, 162.5);
        assert_approx(metrics.billable_days_per_year, 113.75);
    }

    #[test]
    fn inputs_clamp_to_their_documented_ranges() {
        let metrics =
            derive_capacity(&capacity_inputs(20.0, 9.0, 10.0, 150.0), &neutral_modifiers());
        assert_approx(metrics.months_off, 12.0);
        assert_approx(metrics.weeks_off_cycle, 4.0);
        assert_approx(metrics.days_off_week, 7.0);
        assert_approx(metrics.working_days_per_year, 0.0);
        assert_approx(metrics.billable_days_per_year, 0.0);
    }

    #[test]
    fn seasonality_attenuates_weeks_and_utilization() {
        let modifiers = ModifiersState {
            seasonality_percent: Some(50.0),
            ..neutral_modifiers()
        };
        let metrics = derive_capacity(&capacity_inputs(0.0, 0.0, 0.0, 100.0), &modifiers);
        assert_approx(metrics.seasonality_penalty, 0.5);
        assert_approx(metrics.working_weeks, 26.0);
        assert_approx(metrics.utilization_rate, 0.5);
        assert_approx(metrics.billable_days_per_year, 91.0);
    }

    #[test]
    fn max_seasonality_keeps_a_quarter_of_capacity() {
        let modifiers = ModifiersState {
            seasonality_percent: Some(75.0),
            ..neutral_modifiers()
        };
        let metrics = derive_capacity(&capacity_inputs(0.0, 0.0, 0.0, 100.0), &modifiers);
        assert_approx(metrics.seasonality_penalty, 0.25);
    }

    #[test]
    fn explicit_annual_travel_wins_over_derived_estimates() {
        let mut capacity = capacity_inputs(0.0, 0.0, 2.0, 80.0);
        capacity.travel = TravelState {
            days_per_year: Some(24.0),
            days_per_month: Some(10.0),
            days_per_cycle: Some(10.0),
        };
        let metrics = derive_capacity(&capacity, &neutral_modifiers());
        assert_approx(metrics.travel_days_base, 24.0);
        assert_approx(metrics.travel_allowance_days, 24.0);
    }

    #[test]
    fn derived_travel_takes_the_larger_estimate() {
        let mut capacity = capacity_inputs(0.0, 0.0, 2.0, 80.0);
        capacity.travel = TravelState {
            days_per_year: None,
            days_per_month: Some(2.0),
            days_per_cycle: Some(3.0),
        };
        let metrics = derive_capacity(&capacity, &neutral_modifiers());
        // monthly: 2 × 12 = 24; per-cycle: 3 × 52/4 = 39
        assert_approx(metrics.travel_days_base, 39.0);
    }

    #[test]
    fn travel_friction_scales_the_allowance() {
        let mut capacity = capacity_inputs(0.0, 0.0, 2.0, 80.0);
        capacity.travel = TravelState {
            days_per_year: Some(20.0),
            ..TravelState::default()
        };
        let modifiers = ModifiersState {
            travel_friction_percent: Some(50.0),
            ..neutral_modifiers()
        };
        let metrics = derive_capacity(&capacity, &modifiers);
        assert_approx(metrics.travel_friction_multiplier, 1.5);
        assert_approx(metrics.travel_allowance_days, 30.0);
    }

    #[test]
    fn travel_allowance_caps_at_working_days() {
        let mut capacity = capacity_inputs(6.0, 2.0, 5.0, 100.0);
        capacity.travel = TravelState {
            days_per_year: Some(500.0),
            ..TravelState::default()
        };
        let metrics = derive_capacity(&capacity, &neutral_modifiers());
        assert_approx(metrics.travel_allowance_days, metrics.working_days_per_year);
        assert_approx(metrics.billable_days_after_travel, 0.0);
    }

    #[test]
    fn non_finite_inputs_degrade_to_clamp_minimums() {
        let capacity = capacity_inputs(f64::NAN, f64::INFINITY, f64::NAN, f64::NAN);
        let metrics = derive_capacity(&capacity, &neutral_modifiers());
        assert_approx(metrics.months_off, 0.0);
        assert_approx(metrics.weeks_off_cycle, 0.0);
        assert_approx(metrics.days_off_week, 0.0);
        assert_approx(metrics.utilization_rate, 0.0);
        assert!(metrics.billable_days_per_year == 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_stage_values_are_ordered_and_bounded(
            months_off in -2.0f64..15.0,
            weeks_off_cycle in -1.0f64..6.0,
            days_off_week in -1.0f64..9.0,
            utilization in -20.0f64..150.0,
            seasonality in 0.0f64..100.0,
            friction in 0.0f64..200.0,
            travel_monthly in 0.0f64..40.0
        ) {
            let capacity = CapacityState {
                months_off,
                weeks_off_cycle,
                days_off_week,
                utilization_percent: utilization,
                travel: TravelState {
                    days_per_year: None,
                    days_per_month: Some(travel_monthly),
                    days_per_cycle: None,
                },
            };
            let modifiers = ModifiersState {
                seasonality_percent: Some(seasonality),
                travel_friction_percent: Some(friction),
                ..ModifiersState::default()
            };
            let metrics = derive_capacity(&capacity, &modifiers);

            prop_assert!(metrics.working_days_per_year <= WEEKS_PER_YEAR * DAYS_PER_WEEK + 1e-9);
            prop_assert!(metrics.billable_days_per_year <= metrics.working_days_per_year + 1e-9);
            prop_assert!(metrics.billable_days_after_travel <= metrics.billable_days_per_year + 1e-9);
            prop_assert!(metrics.billable_days_after_travel >= 0.0);
            prop_assert!(metrics.travel_allowance_days <= metrics.working_days_per_year + 1e-9);
        }

        #[test]
        fn prop_more_months_off_never_adds_capacity(
            months_off in 0.0f64..11.0,
            utilization in 0.0f64..100.0
        ) {
            let base = derive_capacity(
                &capacity_inputs(months_off, 0.0, 2.0, utilization),
                &neutral_modifiers(),
            );
            let reduced = derive_capacity(
                &capacity_inputs(months_off + 1.0, 0.0, 2.0, utilization),
                &neutral_modifiers(),
            );
            prop_assert!(reduced.working_days_per_year <= base.working_days_per_year + 1e-9);
            prop_assert!(reduced.billable_days_per_year <= base.billable_days_per_year + 1e-9);
        }
    }
}
