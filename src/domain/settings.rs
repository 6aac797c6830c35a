//! Engine settings and construction from configuration.

use crate::domain::error::RudderError;
use crate::domain::rules::{
    BandReversionParams, BreakoutFailureParams, CrsiParams, OpeningRangeParams,
    OscillatorReversionParams, RuleParams, SignalPolarity, TrendPullbackParams,
};
use crate::domain::sizer::RiskBudget;
use crate::domain::universe::UniverseConfig;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub max_positions: usize,
    pub risk: RiskBudget,
    pub max_notional: f64,
    pub universe: UniverseConfig,
    pub rule: RuleParams,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            max_positions: 5,
            risk: RiskBudget::Dollars(1000.0),
            max_notional: 25_000.0,
            universe: UniverseConfig::default(),
            rule: RuleParams::TrendPullback(TrendPullbackParams::default()),
        }
    }
}

/// Build settings from a validated config. A `risk_fraction` key selects
/// equity-fraction budgeting, otherwise `risk_per_trade` dollars apply.
pub fn build_settings(config: &dyn ConfigPort) -> Result<EngineSettings, RudderError> {
    let risk_fraction = config.get_double("engine", "risk_fraction", 0.0);
    let risk = if risk_fraction > 0.0 {
        RiskBudget::EquityFraction(risk_fraction)
    } else {
        RiskBudget::Dollars(config.get_double("engine", "risk_per_trade", 1000.0))
    };

    Ok(EngineSettings {
        max_positions: config.get_int("engine", "max_positions", 5) as usize,
        risk,
        max_notional: config.get_double("engine", "max_notional", 25_000.0),
        universe: UniverseConfig {
            top_k: config.get_int("universe", "top_k", 50) as usize,
            min_price: config.get_double("universe", "min_price", 10.0),
            require_fundamental_data: config.get_bool(
                "universe",
                "require_fundamental_data",
                false,
            ),
        },
        rule: build_rule(config)?,
    })
}

fn build_rule(config: &dyn ConfigPort) -> Result<RuleParams, RudderError> {
    let name = config
        .get_string("rule", "name")
        .ok_or_else(|| RudderError::ConfigMissing {
            section: "rule".into(),
            key: "name".into(),
        })?;

    match name.trim() {
        "trend_pullback" => Ok(RuleParams::TrendPullback(TrendPullbackParams {
            adx_period: config.get_int("rule", "adx_period", 14) as usize,
            adx_threshold: config.get_double("rule", "adx_threshold", 30.0),
            ema_period: config.get_int("rule", "ema_period", 20) as usize,
            ema_tolerance: config.get_double("rule", "ema_tolerance", 0.005),
            entry_offset: config.get_double("rule", "entry_offset", 0.05),
            min_stop_fraction: config.get_double("rule", "min_stop_fraction", 0.01),
            widened_stop_fraction: config.get_double("rule", "widened_stop_fraction", 0.02),
            fallback_stop_fraction: config.get_double("rule", "fallback_stop_fraction", 0.05),
            trail_fraction: config.get_double("rule", "trail_fraction", 0.02),
        })),
        "band_reversion" => Ok(RuleParams::BandReversion(BandReversionParams {
            fast_sma: config.get_int("rule", "fast_sma", 50) as usize,
            slow_sma: config.get_int("rule", "slow_sma", 200) as usize,
            band_period: config.get_int("rule", "band_period", 20) as usize,
            band_mult_x100: (config.get_double("rule", "band_mult", 2.0) * 100.0).round() as u32,
            crsi: build_crsi(config, 3, 2, 100),
            oversold: config.get_double("rule", "oversold", 15.0),
            atr_period: config.get_int("rule", "atr_period", 14) as usize,
            stop_atr_mult: config.get_double("rule", "stop_atr_mult", 3.0),
            limit_discount: config.get_double("rule", "limit_discount", 0.005),
            time_stop_days: config.get_int("rule", "time_stop_days", 8),
        })),
        "oscillator_reversion" => Ok(RuleParams::OscillatorReversion(OscillatorReversionParams {
            trend_sma: config.get_int("rule", "trend_sma", 200) as usize,
            crsi: build_crsi(config, 2, 2, 100),
            oversold: config.get_double("rule", "oversold", 15.0),
            atr_period: config.get_int("rule", "atr_period", 14) as usize,
            sizing_atr_mult: config.get_double("rule", "sizing_atr_mult", 3.0),
            stop_atr_mult: config.get_double("rule", "stop_atr_mult", 2.0),
            target_atr_mult: config.get_double("rule", "target_atr_mult", 3.0),
        })),
        "breakout_failure" => Ok(RuleParams::BreakoutFailure(BreakoutFailureParams {
            lookback: config.get_int("rule", "lookback", 20) as usize,
            min_age_days: config.get_int("rule", "min_age_days", 3) as usize,
            atr_period: config.get_int("rule", "atr_period", 14) as usize,
            stop_atr_mult: config.get_double("rule", "stop_atr_mult", 1.5),
            target_atr_mult: config.get_double("rule", "target_atr_mult", 2.0),
            time_stop_days: config.get_int("rule", "time_stop_days", 3),
            polarity: if config.get_bool("rule", "inverted", false) {
                SignalPolarity::Inverted
            } else {
                SignalPolarity::Direct
            },
        })),
        "opening_range" => {
            let defaults = OpeningRangeParams::default();
            Ok(RuleParams::OpeningRange(OpeningRangeParams {
                session_open: config
                    .get_time("session", "open")
                    .unwrap_or(defaults.session_open),
                range_minutes: config.get_int("session", "range_minutes", 5),
                flatten_time: config
                    .get_time("session", "flatten")
                    .unwrap_or(defaults.flatten_time),
            }))
        }
        other => Err(RudderError::ConfigInvalid {
            section: "rule".into(),
            key: "name".into(),
            reason: format!("unknown rule variant '{}'", other),
        }),
    }
}

fn build_crsi(
    config: &dyn ConfigPort,
    rsi: i64,
    streak: i64,
    rank: i64,
) -> CrsiParams {
    CrsiParams {
        rsi: config.get_int("rule", "crsi_rsi", rsi) as usize,
        streak: config.get_int("rule", "crsi_streak", streak) as usize,
        rank: config.get_int("rule", "crsi_rank", rank) as usize,
    }
}
