use serde::Serialize;

use super::numeric::clamp;
use super::state::ModifiersState;

/// Bounds and fallback for one scenario lever.
struct ModifierBounds {
    default: f64,
    min: f64,
    max: f64,
}

const COMFORT_MARGIN: ModifierBounds = ModifierBounds {
    default: 10.0,
    min: 0.0,
    max: 60.0,
};

const SEASONALITY: ModifierBounds = ModifierBounds {
    default: 0.0,
    min: 0.0,
    max: 75.0,
};

const TRAVEL_FRICTION: ModifierBounds = ModifierBounds {
    default: 0.0,
    min: 0.0,
    max: 150.0,
};

const HANDS_ON: ModifierBounds = ModifierBounds {
    default: 50.0,
    min: 0.0,
    max: 100.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedModifiers {
    pub comfort_margin_percent: f64,
    pub comfort_margin_rate: f64,
    pub seasonality_percent: f64,
    pub seasonality_rate: f64,
    pub travel_friction_percent: f64,
    pub travel_friction_rate: f64,
    pub hands_on_percent: f64,
    pub hands_on_rate: f64,
}

pub fn normalize_modifiers(modifiers: &ModifiersState) -> NormalizedModifiers {
    let comfort_margin = resolve(
        &COMFORT_MARGIN,
        modifiers.comfort_margin_percent,
        modifiers.comfort_margin,
    );
    let seasonality = resolve(
        &SEASONALITY,
        modifiers.seasonality_percent,
        modifiers.seasonality,
    );
    let travel_friction = resolve(
        &TRAVEL_FRICTION,
        modifiers.travel_friction_percent,
        modifiers.travel_friction,
    );
    let hands_on = resolve(&HANDS_ON, modifiers.hands_on_percent, modifiers.hands_on);

    NormalizedModifiers {
        comfort_margin_percent: comfort_margin,
        comfort_margin_rate: comfort_margin / 100.0,
        seasonality_percent: seasonality,
        seasonality_rate: seasonality / 100.0,
        travel_friction_percent: travel_friction,
        travel_friction_rate: travel_friction / 100.0,
        hands_on_percent: hands_on,
        hands_on_rate: hands_on / 100.0,
    }
}

/// Canonical field first, then the legacy spelling, then the fixed default.
/// Non-finite values count as missing.
fn resolve(bounds: &ModifierBounds, canonical: Option<f64>, legacy: Option<f64>) -> f64 {
    let raw = canonical
        .filter(|v| v.is_finite())
        .or(legacy.filter(|v| v.is_finite()))
        .unwrap_or(bounds.default);
    clamp(raw, bounds.min, bounds.max)
}
