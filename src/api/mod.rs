use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    Basis, CapacityMetrics, CostMetrics, Derived, IncomeTargetMetrics, MAX_TAX_RATE_PERCENT,
    NormalizedModifiers, ServiceOverrides, ServiceResult, State, StatePatch, Store, TargetMode,
    TargetNetDefaults, TaxRegime, initial_state,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliBasis {
    Year,
    Week,
    Month,
    AverageWeek,
    AverageMonth,
}

impl From<CliBasis> for Basis {
    fn from(value: CliBasis) -> Self {
        match value {
            CliBasis::Year => Basis::Year,
            CliBasis::Week => Basis::Week,
            CliBasis::Month => Basis::Month,
            CliBasis::AverageWeek => Basis::AverageWeek,
            CliBasis::AverageMonth => Basis::AverageMonth,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTargetMode {
    Net,
    Gross,
}

impl From<CliTargetMode> for TargetMode {
    fn from(value: CliTargetMode) -> Self {
        match value {
            CliTargetMode::Net => TargetMode::Net,
            CliTargetMode::Gross => TargetMode::Gross,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTaxRegime {
    Simplified,
    Standard,
}

impl From<CliTaxRegime> for TaxRegime {
    fn from(value: CliTaxRegime) -> Self {
        match value {
            CliTaxRegime::Simplified => TaxRegime::Simplified,
            CliTaxRegime::Standard => TaxRegime::Standard,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiBasis {
    Year,
    Week,
    Month,
    #[serde(alias = "averageWeek", alias = "average_week")]
    AverageWeek,
    #[serde(alias = "averageMonth", alias = "average_month")]
    AverageMonth,
}

impl From<ApiBasis> for CliBasis {
    fn from(value: ApiBasis) -> Self {
        match value {
            ApiBasis::Year => CliBasis::Year,
            ApiBasis::Week => CliBasis::Week,
            ApiBasis::Month => CliBasis::Month,
            ApiBasis::AverageWeek => CliBasis::AverageWeek,
            ApiBasis::AverageMonth => CliBasis::AverageMonth,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiTargetMode {
    Net,
    Gross,
}

impl From<ApiTargetMode> for CliTargetMode {
    fn from(value: ApiTargetMode) -> Self {
        match value {
            ApiTargetMode::Net => CliTargetMode::Net,
            ApiTargetMode::Gross => CliTargetMode::Gross,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiTaxRegime {
    #[serde(alias = "flat")]
    Simplified,
    #[serde(alias = "progressive")]
    Standard,
}

impl From<ApiTaxRegime> for CliTaxRegime {
    fn from(value: ApiTaxRegime) -> Self {
        match value {
            ApiTaxRegime::Simplified => CliTaxRegime::Simplified,
            ApiTaxRegime::Standard => CliTaxRegime::Standard,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    months_off: Option<f64>,
    weeks_off_cycle: Option<f64>,
    days_off_week: Option<f64>,
    utilization: Option<f64>,
    travel_days_per_year: Option<f64>,
    travel_days_per_month: Option<f64>,
    travel_days_per_cycle: Option<f64>,

    seasonality: Option<f64>,
    comfort_margin: Option<f64>,
    travel_friction: Option<f64>,
    hands_on: Option<f64>,

    tax_rate: Option<f64>,
    vat_rate: Option<f64>,
    buffer: Option<f64>,
    fixed_costs_annual: Option<f64>,
    per_working_day_cost: Option<f64>,
    per_billable_day_cost: Option<f64>,
    per_travel_day_cost: Option<f64>,
    other_variable_annual: Option<f64>,

    tax_regime: Option<ApiTaxRegime>,
    vat_registered: Option<bool>,
    include_vat_in_prices: Option<bool>,

    target_mode: Option<ApiTargetMode>,
    target_basis: Option<ApiBasis>,
    target_year: Option<f64>,
    target_week: Option<f64>,
    target_month: Option<f64>,
    target_average_week: Option<f64>,
    target_average_month: Option<f64>,

    currency: Option<String>,
    services: Option<BTreeMap<String, ServiceOverrides>>,
}

#[derive(Parser, Debug)]
#[command(
    name = "dayrate",
    about = "Freelance planning calculator (capacity, costs, income targets, service mix)"
)]
struct Cli {
    #[arg(long, default_value_t = 1.0, help = "Months off per year (0-12)")]
    months_off: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Weeks off per four-week cycle (0-4)"
    )]
    weeks_off_cycle: f64,
    #[arg(long, default_value_t = 2.0, help = "Days off per week (0-7)")]
    days_off_week: f64,
    #[arg(
        long,
        default_value_t = 70.0,
        help = "Share of working days actually billed, in percent"
    )]
    utilization: f64,
    #[arg(long, help = "Explicit annual travel days; wins over derived figures")]
    travel_days_per_year: Option<f64>,
    #[arg(long, help = "Travel days per active month")]
    travel_days_per_month: Option<f64>,
    #[arg(long, help = "Travel days per four-week cycle")]
    travel_days_per_cycle: Option<f64>,
    #[arg(
        long,
        help = "Seasonality drag in percent (0-75); omit for the scenario default"
    )]
    seasonality: Option<f64>,
    #[arg(
        long,
        help = "Comfort margin stacked onto the price buffer, in percent (0-60)"
    )]
    comfort_margin: Option<f64>,
    #[arg(
        long,
        help = "Travel friction surcharge on travel days, in percent (0-150)"
    )]
    travel_friction: Option<f64>,
    #[arg(
        long,
        help = "Hands-on delivery quota, in percent of billable days (0-100)"
    )]
    hands_on: Option<f64>,
    #[arg(long, default_value_t = 30.0, help = "Income tax rate in percent")]
    tax_rate: f64,
    #[arg(long, default_value_t = 21.0, help = "VAT rate in percent")]
    vat_rate: f64,
    #[arg(
        long,
        default_value_t = 15.0,
        help = "Safety buffer applied to base prices, in percent"
    )]
    buffer: f64,
    #[arg(long, help = "Explicit annual fixed cost total; wins over the breakdown")]
    fixed_costs_annual: Option<f64>,
    #[arg(long, default_value_t = 8.0, help = "Variable cost per working day")]
    per_working_day_cost: f64,
    #[arg(long, default_value_t = 12.0, help = "Variable cost per billable day")]
    per_billable_day_cost: f64,
    #[arg(long, default_value_t = 45.0, help = "Variable cost per travel day")]
    per_travel_day_cost: f64,
    #[arg(long, default_value_t = 1500.0, help = "Other annual variable costs")]
    other_variable_annual: f64,
    #[arg(long, value_enum, default_value_t = CliTaxRegime::Simplified)]
    tax_regime: CliTaxRegime,
    #[arg(long, help = "Whether VAT applies; defaults to true")]
    vat_registered: Option<bool>,
    #[arg(long, help = "Whether displayed prices include VAT; defaults to false")]
    include_vat_in_prices: Option<bool>,
    #[arg(long, value_enum, default_value_t = CliTargetMode::Net)]
    target_mode: CliTargetMode,
    #[arg(
        long,
        value_enum,
        default_value_t = CliBasis::Year,
        help = "Which raw target figure is authoritative"
    )]
    target_basis: CliBasis,
    #[arg(long, default_value_t = 50000.0)]
    target_year: f64,
    #[arg(long, default_value_t = 1900.0)]
    target_week: f64,
    #[arg(long, default_value_t = 5200.0)]
    target_month: f64,
    #[arg(long, default_value_t = 1000.0)]
    target_average_week: f64,
    #[arg(long, default_value_t = 4200.0)]
    target_average_month: f64,
    #[arg(long, default_value = "€", help = "Currency symbol echoed to clients")]
    currency: String,
}

#[derive(Debug)]
struct PlanRequest {
    state: State,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    currency_symbol: String,
    modifiers: NormalizedModifiers,
    capacity: CapacityMetrics,
    costs: CostMetrics,
    income: IncomeTargetMetrics,
    target_defaults: TargetNetDefaults,
    services: Vec<ServiceResult>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_state(cli: Cli) -> Result<State, String> {
    if !(0.0..=12.0).contains(&cli.months_off) {
        return Err("--months-off must be between 0 and 12".to_string());
    }

    if !(0.0..=4.0).contains(&cli.weeks_off_cycle) {
        return Err("--weeks-off-cycle must be between 0 and 4".to_string());
    }

    if !(0.0..=7.0).contains(&cli.days_off_week) {
        return Err("--days-off-week must be between 0 and 7".to_string());
    }

    if !(0.0..=100.0).contains(&cli.utilization) {
        return Err("--utilization must be between 0 and 100".to_string());
    }

    for (name, value) in [
        ("--travel-days-per-year", cli.travel_days_per_year),
        ("--travel-days-per-month", cli.travel_days_per_month),
        ("--travel-days-per-cycle", cli.travel_days_per_cycle),
    ] {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be >= 0"));
            }
        }
    }

    if let Some(value) = cli.seasonality {
        if !(0.0..=75.0).contains(&value) {
            return Err("--seasonality must be between 0 and 75".to_string());
        }
    }

    if let Some(value) = cli.comfort_margin {
        if !(0.0..=60.0).contains(&value) {
            return Err("--comfort-margin must be between 0 and 60".to_string());
        }
    }

    if let Some(value) = cli.travel_friction {
        if !(0.0..=150.0).contains(&value) {
            return Err("--travel-friction must be between 0 and 150".to_string());
        }
    }

    if let Some(value) = cli.hands_on {
        if !(0.0..=100.0).contains(&value) {
            return Err("--hands-on must be between 0 and 100".to_string());
        }
    }

    if !(0.0..=MAX_TAX_RATE_PERCENT).contains(&cli.tax_rate) {
        return Err("--tax-rate must be between 0 and 99.9".to_string());
    }

    if !cli.vat_rate.is_finite() || cli.vat_rate < 0.0 {
        return Err("--vat-rate must be >= 0".to_string());
    }

    if !(0.0..=100.0).contains(&cli.buffer) {
        return Err("--buffer must be between 0 and 100".to_string());
    }

    if let Some(value) = cli.fixed_costs_annual {
        if !value.is_finite() || value < 0.0 {
            return Err("--fixed-costs-annual must be >= 0".to_string());
        }
    }

    for (name, value) in [
        ("--per-working-day-cost", cli.per_working_day_cost),
        ("--per-billable-day-cost", cli.per_billable_day_cost),
        ("--per-travel-day-cost", cli.per_travel_day_cost),
        ("--other-variable-annual", cli.other_variable_annual),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    for (name, value) in [
        ("--target-year", cli.target_year),
        ("--target-week", cli.target_week),
        ("--target-month", cli.target_month),
        ("--target-average-week", cli.target_average_week),
        ("--target-average-month", cli.target_average_month),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if cli.currency.trim().is_empty() {
        return Err("--currency must not be empty".to_string());
    }

    let mut state = initial_state();

    state.capacity.months_off = cli.months_off;
    state.capacity.weeks_off_cycle = cli.weeks_off_cycle;
    state.capacity.days_off_week = cli.days_off_week;
    state.capacity.utilization_percent = cli.utilization;
    state.capacity.travel.days_per_year = cli.travel_days_per_year;
    state.capacity.travel.days_per_month = cli.travel_days_per_month;
    state.capacity.travel.days_per_cycle = cli.travel_days_per_cycle;

    state.modifiers.seasonality_percent = cli.seasonality;
    state.modifiers.comfort_margin_percent = cli.comfort_margin;
    state.modifiers.travel_friction_percent = cli.travel_friction;
    state.modifiers.hands_on_percent = cli.hands_on;

    state.costs.tax_rate_percent = cli.tax_rate;
    state.costs.vat_rate_percent = cli.vat_rate;
    state.costs.buffer_percent = cli.buffer;
    state.costs.fixed.annual_total = cli.fixed_costs_annual;
    state.costs.variable.per_working_day = cli.per_working_day_cost;
    state.costs.variable.per_billable_day = cli.per_billable_day_cost;
    state.costs.variable.per_travel_day = cli.per_travel_day_cost;
    state.costs.variable.other_annual = cli.other_variable_annual;

    state.tax.regime = cli.tax_regime.into();
    state.tax.vat_registered = cli.vat_registered.unwrap_or(true);
    state.tax.include_vat_in_prices = cli.include_vat_in_prices.unwrap_or(false);

    state.income_targets.mode = cli.target_mode.into();
    state.income_targets.basis = cli.target_basis.into();
    state.income_targets.year = cli.target_year;
    state.income_targets.week = cli.target_week;
    state.income_targets.month = cli.target_month;
    state.income_targets.average_week = cli.target_average_week;
    state.income_targets.average_month = cli.target_average_month;

    state.config.currency_symbol = cli.currency;

    Ok(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .route("/api/patch", post(patch_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("dayrate HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/plan");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload).await
}

async fn plan_handler_impl(payload: PlanPayload) -> Response {
    let request = match plan_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    json_response(StatusCode::OK, build_plan_response(request.state))
}

async fn patch_handler(Json(raw): Json<serde_json::Value>) -> Response {
    match plan_response_for_patch(raw) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn plan_response_for_patch(raw: serde_json::Value) -> Result<PlanResponse, String> {
    let patch = serde_json::from_value::<StatePatch>(raw)
        .map_err(|e| format!("Invalid state patch: {e}"))?;
    let mut store = Store::new();
    store.patch(patch);
    Ok(plan_response_from_store(&store))
}

fn build_plan_response(state: State) -> PlanResponse {
    let store = Store::with_state(state);
    plan_response_from_store(&store)
}

fn plan_response_from_store(store: &Store) -> PlanResponse {
    let Derived {
        modifiers,
        capacity,
        costs,
        income,
    } = store.derived();

    PlanResponse {
        currency_symbol: store.state().config.currency_symbol.clone(),
        modifiers,
        capacity,
        costs,
        income,
        target_defaults: store.state().config.target_defaults,
        services: store.service_results(),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_request_from_payload(payload)
}

fn plan_request_from_payload(payload: PlanPayload) -> Result<PlanRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.months_off {
        cli.months_off = v;
    }
    if let Some(v) = payload.weeks_off_cycle {
        cli.weeks_off_cycle = v;
    }
    if let Some(v) = payload.days_off_week {
        cli.days_off_week = v;
    }
    if let Some(v) = payload.utilization {
        cli.utilization = v;
    }
    if let Some(v) = payload.travel_days_per_year {
        cli.travel_days_per_year = Some(v);
    }
    if let Some(v) = payload.travel_days_per_month {
        cli.travel_days_per_month = Some(v);
    }
    if let Some(v) = payload.travel_days_per_cycle {
        cli.travel_days_per_cycle = Some(v);
    }

    if let Some(v) = payload.seasonality {
        cli.seasonality = Some(v);
    }
    if let Some(v) = payload.comfort_margin {
        cli.comfort_margin = Some(v);
    }
    if let Some(v) = payload.travel_friction {
        cli.travel_friction = Some(v);
    }
    if let Some(v) = payload.hands_on {
        cli.hands_on = Some(v);
    }

    if let Some(v) = payload.tax_rate {
        cli.tax_rate = v;
    }
    if let Some(v) = payload.vat_rate {
        cli.vat_rate = v;
    }
    if let Some(v) = payload.buffer {
        cli.buffer = v;
    }
    if let Some(v) = payload.fixed_costs_annual {
        cli.fixed_costs_annual = Some(v);
    }
    if let Some(v) = payload.per_working_day_cost {
        cli.per_working_day_cost = v;
    }
    if let Some(v) = payload.per_billable_day_cost {
        cli.per_billable_day_cost = v;
    }
    if let Some(v) = payload.per_travel_day_cost {
        cli.per_travel_day_cost = v;
    }
    if let Some(v) = payload.other_variable_annual {
        cli.other_variable_annual = v;
    }

    if let Some(v) = payload.tax_regime {
        cli.tax_regime = v.into();
    }
    if let Some(v) = payload.vat_registered {
        cli.vat_registered = Some(v);
    }
    if let Some(v) = payload.include_vat_in_prices {
        cli.include_vat_in_prices = Some(v);
    }

    if let Some(v) = payload.target_mode {
        cli.target_mode = v.into();
    }
    if let Some(v) = payload.target_basis {
        cli.target_basis = v.into();
    }
    if let Some(v) = payload.target_year {
        cli.target_year = v;
    }
    if let Some(v) = payload.target_week {
        cli.target_week = v;
    }
    if let Some(v) = payload.target_month {
        cli.target_month = v;
    }
    if let Some(v) = payload.target_average_week {
        cli.target_average_week = v;
    }
    if let Some(v) = payload.target_average_month {
        cli.target_average_month = v;
    }

    if let Some(v) = payload.currency {
        cli.currency = v;
    }

    let mut state = build_state(cli)?;
    if let Some(services) = payload.services {
        for (id, overrides) in services {
            state.services.overrides.insert(id, overrides);
        }
    }

    Ok(PlanRequest { state })
}

fn default_cli_for_api() -> Cli {
    Cli {
        months_off: 1.0,
        weeks_off_cycle: 0.0,
        days_off_week: 2.0,
        utilization: 70.0,
        travel_days_per_year: None,
        travel_days_per_month: None,
        travel_days_per_cycle: None,
        seasonality: None,
        comfort_margin: None,
        travel_friction: None,
        hands_on: None,
        tax_rate: 30.0,
        vat_rate: 21.0,
        buffer: 15.0,
        fixed_costs_annual: None,
        per_working_day_cost: 8.0,
        per_billable_day_cost: 12.0,
        per_travel_day_cost: 45.0,
        other_variable_annual: 1_500.0,
        tax_regime: CliTaxRegime::Simplified,
        vat_registered: None,
        include_vat_in_prices: None,
        target_mode: CliTargetMode::Net,
        target_basis: CliBasis::Year,
        target_year: 50_000.0,
        target_week: 1_900.0,
        target_month: 5_200.0,
        target_average_week: 1_000.0,
        target_average_month: 4_200.0,
        currency: "€".to_string(),
    }
}
