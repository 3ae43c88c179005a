use serde::{Deserialize, Serialize};

use super::capacity::{CapacityMetrics, MONTHS_PER_YEAR, WEEKS_PER_YEAR};
use super::numeric::clamp;
use super::state::{Basis, State, TargetMode};

/// Canonical annual net target used to seed per-basis defaults.
pub const DEFAULT_ANNUAL_TARGET_NET: f64 = 50_000.0;

/// Suggested per-basis targets, re-merged into `config.target_defaults`
/// after every capacity change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetNetDefaults {
    pub year: f64,
    pub week: f64,
    pub month: f64,
    pub average_week: f64,
    pub average_month: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeTargetMetrics {
    pub mode: TargetMode,
    pub basis: Basis,
    pub target_net: f64,
    pub target_net_per_week: f64,
    pub target_net_per_month: f64,
    pub target_net_per_average_week: f64,
    pub target_net_per_average_month: f64,
}

pub fn derive_target_net_defaults(capacity: &CapacityMetrics) -> TargetNetDefaults {
    let year = DEFAULT_ANNUAL_TARGET_NET;
    TargetNetDefaults {
        year,
        week: div_or_annual(year, capacity.working_weeks),
        month: div_or_annual(year, capacity.active_months),
        average_week: year / WEEKS_PER_YEAR,
        average_month: year / MONTHS_PER_YEAR,
    }
}

/// The raw figure keyed by the selected basis is authoritative; it is
/// re-annualized against current capacity. A zero-capacity denominator
/// falls back to the raw annual figure.
pub fn derive_income_targets(state: &State, capacity: &CapacityMetrics) -> IncomeTargetMetrics {
    let raw = &state.income_targets;

    let annual = match raw.basis {
        Basis::Year => raw.year,
        Basis::Week => annualize(raw.week, capacity.working_weeks, raw.year),
        Basis::Month => annualize(raw.month, capacity.active_months, raw.year),
        Basis::AverageWeek => raw.average_week * WEEKS_PER_YEAR,
        Basis::AverageMonth => raw.average_month * MONTHS_PER_YEAR,
    };
    let target_net = non_negative(annual);

    IncomeTargetMetrics {
        mode: raw.mode,
        basis: raw.basis,
        target_net,
        target_net_per_week: safe_div(target_net, capacity.working_weeks),
        target_net_per_month: safe_div(target_net, capacity.active_months),
        target_net_per_average_week: target_net / WEEKS_PER_YEAR,
        target_net_per_average_month: target_net / MONTHS_PER_YEAR,
    }
}

fn annualize(value: f64, multiplier: f64, fallback_annual: f64) -> f64 {
    if multiplier > 0.0 {
        value * multiplier
    } else {
        fallback_annual
    }
}

fn div_or_annual(annual: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        annual / denominator
    } else {
        annual
    }
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn non_negative(value: f64) -> f64 {
    clamp(value, 0.0, f64::INFINITY)
}
