pub fn to_number(raw: Option<&str>, fallback: f64) -> f64 {
    let Some(raw) = raw else {
        return fallback;
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fallback;
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => fallback,
    }
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }

    value.max(min).min(max)
}

pub fn normalize_percent(raw: Option<&str>, fallback: f64, min: f64, max: f64) -> f64 {
    clamp(to_number(raw, fallback), min, max)
}

pub fn normalize_percent_default(raw: Option<&str>, fallback: f64) -> f64 {
    normalize_percent(raw, fallback, 0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{any, prop_assert, proptest};

    #[test]
    fn to_number_parses_trimmed_values() {
        assert_eq!(to_number(Some("  42.5 "), 0.0), 42.5);
        assert_eq!(to_number(Some("-3"), 0.0), -3.0);
    }

    #[test]
    fn to_number_falls_back_for_missing_or_malformed_input() {
        assert_eq!(to_number(None, 7.0), 7.0);
        assert_eq!(to_number(Some(""), 7.0), 7.0);
        assert_eq!(to_number(Some("   "), 7.0), 7.0);
        assert_eq!(to_number(Some("abc"), 7.0), 7.0);
        assert_eq!(to_number(Some("inf"), 7.0), 7.0);
        assert_eq!(to_number(Some("NaN"), 7.0), 7.0);
    }

    #[test]
    fn clamp_bounds_values() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(11.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn clamp_resolves_non_finite_to_min() {
        assert_eq!(clamp(f64::NAN, 2.0, 10.0), 2.0);
        assert_eq!(clamp(f64::INFINITY, 2.0, 10.0), 2.0);
        assert_eq!(clamp(f64::NEG_INFINITY, 2.0, 10.0), 2.0);
    }

    #[test]
    fn normalize_percent_defaults_to_percent_range() {
        assert_eq!(normalize_percent_default(Some("150"), 0.0), 100.0);
        assert_eq!(normalize_percent_default(Some("-5"), 0.0), 0.0);
        assert_eq!(normalize_percent_default(None, 35.0), 35.0);
    }

    proptest! {
        #[test]
        fn prop_clamp_is_idempotent(value in any::<f64>()) {
            let once = clamp(value, -25.0, 75.0);
            let twice = clamp(once, -25.0, 75.0);
            prop_assert!(once == twice);
        }

        #[test]
        fn prop_clamp_stays_in_range(value in any::<f64>()) {
            let bounded = clamp(value, 0.0, 100.0);
            prop_assert!((0.0..=100.0).contains(&bounded));
        }
    }
}
