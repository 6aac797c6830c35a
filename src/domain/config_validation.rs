//! Configuration validation.
//!
//! Validates config fields before the engine is constructed. Value checks
//! live here; structural defaults live in [`settings`](super::settings).

use crate::domain::error::RudderError;
use crate::ports::config_port::ConfigPort;

const KNOWN_RULES: &[&str] = &[
    "trend_pullback",
    "band_reversion",
    "oscillator_reversion",
    "breakout_failure",
    "opening_range",
];

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), RudderError> {
    validate_max_positions(config)?;
    validate_risk(config)?;
    validate_max_notional(config)?;
    validate_universe(config)?;
    validate_rule(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> RudderError {
    RudderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_max_positions(config: &dyn ConfigPort) -> Result<(), RudderError> {
    let value = config.get_int("engine", "max_positions", 5);
    if value < 1 {
        return Err(invalid(
            "engine",
            "max_positions",
            "max_positions must be at least 1",
        ));
    }
    Ok(())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), RudderError> {
    let dollars = config.get_double("engine", "risk_per_trade", 0.0);
    let fraction = config.get_double("engine", "risk_fraction", 0.0);

    if dollars > 0.0 && fraction > 0.0 {
        return Err(invalid(
            "engine",
            "risk_per_trade",
            "set either risk_per_trade or risk_fraction, not both",
        ));
    }
    if dollars < 0.0 {
        return Err(invalid(
            "engine",
            "risk_per_trade",
            "risk_per_trade must be positive",
        ));
    }
    if fraction < 0.0 || fraction >= 1.0 {
        return Err(invalid(
            "engine",
            "risk_fraction",
            "risk_fraction must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_max_notional(config: &dyn ConfigPort) -> Result<(), RudderError> {
    let value = config.get_double("engine", "max_notional", 25_000.0);
    if value <= 0.0 {
        return Err(invalid(
            "engine",
            "max_notional",
            "max_notional must be positive",
        ));
    }
    Ok(())
}

fn validate_universe(config: &dyn ConfigPort) -> Result<(), RudderError> {
    let top_k = config.get_int("universe", "top_k", 50);
    if top_k < 1 {
        return Err(invalid("universe", "top_k", "top_k must be at least 1"));
    }
    let min_price = config.get_double("universe", "min_price", 10.0);
    if min_price < 0.0 {
        return Err(invalid(
            "universe",
            "min_price",
            "min_price must be non-negative",
        ));
    }
    Ok(())
}

fn validate_rule(config: &dyn ConfigPort) -> Result<(), RudderError> {
    let name = match config.get_string("rule", "name") {
        Some(name) => name,
        None => {
            return Err(RudderError::ConfigMissing {
                section: "rule".to_string(),
                key: "name".to_string(),
            });
        }
    };
    let name = name.trim();
    if !KNOWN_RULES.contains(&name) {
        return Err(invalid(
            "rule",
            "name",
            format!("unknown rule variant '{}'", name),
        ));
    }

    for key in ["stop_atr_mult", "target_atr_mult", "sizing_atr_mult"] {
        let value = config.get_double("rule", key, 1.0);
        if value <= 0.0 {
            return Err(invalid("rule", key, format!("{} must be positive", key)));
        }
    }

    if config.get_int("rule", "time_stop_days", 1) < 1 {
        return Err(invalid(
            "rule",
            "time_stop_days",
            "time_stop_days must be at least 1",
        ));
    }

    if name == "opening_range" {
        validate_session(config)?;
    }
    Ok(())
}

fn validate_session(config: &dyn ConfigPort) -> Result<(), RudderError> {
    for key in ["open", "flatten"] {
        if config.get_string("session", key).is_some() && config.get_time("session", key).is_none()
        {
            return Err(invalid(
                "session",
                key,
                "invalid time format (expected HH:MM)",
            ));
        }
    }

    let open = config
        .get_time("session", "open")
        .unwrap_or_else(|| chrono::NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    let flatten = config
        .get_time("session", "flatten")
        .unwrap_or_else(|| chrono::NaiveTime::from_hms_opt(15, 55, 0).unwrap());
    let range_minutes = config.get_int("session", "range_minutes", 5);

    if range_minutes < 1 {
        return Err(invalid(
            "session",
            "range_minutes",
            "range_minutes must be at least 1",
        ));
    }

    let range_end = open + chrono::Duration::minutes(range_minutes);
    if flatten <= range_end {
        return Err(invalid(
            "session",
            "flatten",
            "flatten must fall after the opening range completes",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn minimal_valid_config() {
        let config = adapter("[rule]\nname = trend_pullback\n");
        assert!(validate_engine_config(&config).is_ok());
    }

    #[test]
    fn zero_max_positions_rejected() {
        let config = adapter("[engine]\nmax_positions = 0\n\n[rule]\nname = trend_pullback\n");
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn both_risk_knobs_rejected() {
        let config = adapter(
            "[engine]\nrisk_per_trade = 1000\nrisk_fraction = 0.01\n\n[rule]\nname = trend_pullback\n",
        );
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn risk_fraction_must_be_a_fraction() {
        let config =
            adapter("[engine]\nrisk_fraction = 1.5\n\n[rule]\nname = oscillator_reversion\n");
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn negative_notional_rejected() {
        let config = adapter("[engine]\nmax_notional = -5\n\n[rule]\nname = trend_pullback\n");
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn missing_rule_name_rejected() {
        let config = adapter("[engine]\nmax_positions = 5\n");
        let err = validate_engine_config(&config).unwrap_err();
        assert!(matches!(err, RudderError::ConfigMissing { .. }));
    }

    #[test]
    fn unknown_rule_name_rejected() {
        let config = adapter("[rule]\nname = hodl\n");
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn zero_atr_mult_rejected() {
        let config = adapter("[rule]\nname = breakout_failure\nstop_atr_mult = 0\n");
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn bad_session_time_rejected() {
        let config =
            adapter("[rule]\nname = opening_range\n\n[session]\nopen = half past nine\n");
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn flatten_before_range_end_rejected() {
        let config = adapter(
            "[rule]\nname = opening_range\n\n[session]\nopen = 09:30\nrange_minutes = 5\nflatten = 09:32\n",
        );
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn valid_session_accepted() {
        let config = adapter(
            "[rule]\nname = opening_range\n\n[session]\nopen = 09:30\nrange_minutes = 5\nflatten = 15:55\n",
        );
        assert!(validate_engine_config(&config).is_ok());
    }

    #[test]
    fn zero_universe_rejected() {
        let config = adapter("[universe]\ntop_k = 0\n\n[rule]\nname = trend_pullback\n");
        assert!(validate_engine_config(&config).is_err());
    }
}
