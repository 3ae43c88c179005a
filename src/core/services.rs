use serde::Serialize;

use super::capacity::CapacityMetrics;
use super::costs::{CostMetrics, MAX_TAX_RATE_PERCENT};
use super::modifiers::normalize_modifiers;
use super::numeric::clamp;
use super::state::{ServiceOverrides, State};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub days_per_unit: f64,
    pub base_price: f64,
    pub direct_cost_per_unit: f64,
    pub share_of_capacity: Option<f64>,
    pub overhead_share: Option<f64>,
    pub tax_rate_percent: Option<f64>,
    pub units_per_month: Option<f64>,
    pub units_per_year: Option<f64>,
    pub price_per_unit: Option<f64>,
}

impl ServiceConfig {
    fn catalog_entry(
        id: &str,
        name: &str,
        days_per_unit: f64,
        base_price: f64,
        direct_cost_per_unit: f64,
        share_of_capacity: Option<f64>,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            enabled: true,
            days_per_unit,
            base_price,
            direct_cost_per_unit,
            share_of_capacity,
            overhead_share: None,
            tax_rate_percent: None,
            units_per_month: None,
            units_per_year: None,
            price_per_unit: None,
        }
    }

    fn apply_overrides(&mut self, overrides: &ServiceOverrides) {
        if let Some(v) = overrides.enabled {
            self.enabled = v;
        }
        if let Some(v) = overrides.days_per_unit {
            self.days_per_unit = v;
        }
        if let Some(v) = overrides.base_price {
            self.base_price = v;
        }
        if let Some(v) = overrides.direct_cost_per_unit {
            self.direct_cost_per_unit = v;
        }
        if let Some(v) = overrides.share_of_capacity {
            self.share_of_capacity = Some(v);
        }
        if let Some(v) = overrides.overhead_share {
            self.overhead_share = Some(v);
        }
        if let Some(v) = overrides.tax_rate_percent {
            self.tax_rate_percent = Some(v);
        }
        if let Some(v) = overrides.units_per_month {
            self.units_per_month = Some(v);
        }
        if let Some(v) = overrides.units_per_year {
            self.units_per_year = Some(v);
        }
        if let Some(v) = overrides.price_per_unit {
            self.price_per_unit = Some(v);
        }
    }
}

pub fn service_catalog() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig::catalog_entry("consulting-day", "Consulting day", 1.0, 850.0, 40.0, None),
        ServiceConfig::catalog_entry("workshop", "Workshop", 2.0, 2_400.0, 350.0, Some(0.15)),
        ServiceConfig::catalog_entry("retainer", "Monthly retainer", 4.0, 3_200.0, 120.0, Some(0.25)),
        ServiceConfig::catalog_entry("audit", "Audit engagement", 6.0, 5_400.0, 400.0, Some(0.1)),
    ]
}

/// Catalog defaults overlaid with the caller's stored overrides.
pub fn merged_service_config(state: &State, id: &str) -> Option<ServiceConfig> {
    let mut config = service_catalog().into_iter().find(|c| c.id == id)?;
    if let Some(overrides) = state.services.overrides.get(id) {
        config.apply_overrides(overrides);
    }
    Some(config)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResult {
    pub id: String,
    pub name: String,
    pub units_per_month: f64,
    pub price_per_unit: f64,
    pub revenue_per_month: f64,
    pub direct_cost_per_month: f64,
    pub tax_per_month: f64,
    pub net_per_month: f64,
}

pub struct ServiceContext<'a> {
    pub config: &'a ServiceConfig,
    pub capacity: &'a CapacityMetrics,
    pub costs: &'a CostMetrics,
}

/// Economics for one service id. `None` for unknown or disabled services.
pub fn service_result(
    state: &State,
    capacity: &CapacityMetrics,
    costs: &CostMetrics,
    id: &str,
) -> Option<ServiceResult> {
    let config = merged_service_config(state, id)?;
    if !config.enabled {
        return None;
    }
    Some(compute_service(state, capacity, costs, &config))
}

/// Economics for every enabled catalog service, in catalog order.
pub fn service_results(
    state: &State,
    capacity: &CapacityMetrics,
    costs: &CostMetrics,
) -> Vec<ServiceResult> {
    service_catalog()
        .into_iter()
        .map(|mut config| {
            if let Some(overrides) = state.services.overrides.get(&config.id) {
                config.apply_overrides(overrides);
            }
            config
        })
        .filter(|config| config.enabled)
        .map(|config| compute_service(state, capacity, costs, &config))
        .collect()
}

/// Runs a caller-supplied compute hook for one service. A hook error means
/// "no result for this service"; it is not propagated.
pub fn compute_service_with<F>(
    state: &State,
    capacity: &CapacityMetrics,
    costs: &CostMetrics,
    id: &str,
    custom: F,
) -> Option<ServiceResult>
where
    F: FnOnce(&ServiceContext<'_>) -> Result<ServiceResult, String>,
{
    let config = merged_service_config(state, id)?;
    if !config.enabled {
        return None;
    }
    let context = ServiceContext {
        config: &config,
        capacity,
        costs,
    };
    custom(&context).ok()
}

pub fn compute_service(
    state: &State,
    capacity: &CapacityMetrics,
    costs: &CostMetrics,
    config: &ServiceConfig,
) -> ServiceResult {
    let modifiers = normalize_modifiers(&state.modifiers);

    let capacity_share = clamp(
        config
            .share_of_capacity
            .unwrap_or(modifiers.hands_on_rate),
        0.0,
        1.0,
    );

    let units_per_month = finite_or_zero(resolve_units_per_month(config, capacity, capacity_share));
    let price_per_unit = finite_or_zero(match config.price_per_unit {
        Some(price) => price.max(0.0),
        None => config.base_price.max(0.0) * (1.0 + costs.effective_buffer),
    });
    let revenue_per_month = finite_or_zero(units_per_month * price_per_unit);

    let overhead_share = clamp(config.overhead_share.unwrap_or(capacity_share), 0.0, 1.0);
    let overhead_per_month = overhead_share * (costs.fixed.monthly + costs.variable.monthly);
    let direct_cost_per_month = finite_or_zero(
        units_per_month * config.direct_cost_per_unit.max(0.0) + overhead_per_month,
    );

    let tax_rate = match config.tax_rate_percent {
        Some(percent) => clamp(percent, 0.0, MAX_TAX_RATE_PERCENT) / 100.0,
        None => costs.tax_rate,
    };
    let tax_per_month = finite_or_zero((revenue_per_month - direct_cost_per_month).max(0.0) * tax_rate);
    let net_per_month = finite_or_zero(revenue_per_month - direct_cost_per_month - tax_per_month);

    ServiceResult {
        id: config.id.clone(),
        name: config.name.clone(),
        units_per_month,
        price_per_unit,
        revenue_per_month,
        direct_cost_per_month,
        tax_per_month,
        net_per_month,
    }
}

/// Explicit monthly volume wins, then an annual figure spread over active
/// months, then a capacity-share allocation of billable days.
fn resolve_units_per_month(
    config: &ServiceConfig,
    capacity: &CapacityMetrics,
    capacity_share: f64,
) -> f64 {
    if let Some(units) = config.units_per_month.filter(|v| v.is_finite()) {
        return units.max(0.0);
    }
    if let Some(units) = config.units_per_year.filter(|v| v.is_finite()) {
        return safe_div(units.max(0.0), capacity.active_months);
    }

    let allocated_days = capacity_share * capacity.billable_days_after_travel;
    safe_div(
        safe_div(allocated_days, config.days_per_unit),
        capacity.active_months,
    )
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
