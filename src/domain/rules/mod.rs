//! Rule variants: parameters and pure signal evaluators.
//!
//! Each variant is one rule set over externally computed gauge values and
//! recent bars. Evaluators are pure predicates; the engine owns order
//! placement and exits. Variants that differ only in constants are the
//! same rule with different parameters.

pub mod band_reversion;
pub mod breakout_failure;
pub mod opening_range;
pub mod oscillator_reversion;
pub mod trend_pullback;

use crate::ports::indicator_port::GaugeKind;
use chrono::NaiveTime;

/// Discrete signal, computed fresh on every evaluation and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    None,
    Long,
    Short,
}

impl Signal {
    pub fn is_none(&self) -> bool {
        matches!(self, Signal::None)
    }

    /// +1 for long, -1 for short, 0 for none.
    pub fn direction(&self) -> i64 {
        match self {
            Signal::None => 0,
            Signal::Long => 1,
            Signal::Short => -1,
        }
    }
}

/// Whether raw rule signals are taken as-is or flipped. The breakout-failure
/// preset ships inverted: it fades the failed break instead of trading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalPolarity {
    #[default]
    Direct,
    Inverted,
}

impl SignalPolarity {
    pub fn apply(&self, signal: Signal) -> Signal {
        match (self, signal) {
            (SignalPolarity::Direct, s) => s,
            (SignalPolarity::Inverted, Signal::Long) => Signal::Short,
            (SignalPolarity::Inverted, Signal::Short) => Signal::Long,
            (SignalPolarity::Inverted, Signal::None) => Signal::None,
        }
    }
}

/// Connors RSI component periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrsiParams {
    pub rsi: usize,
    pub streak: usize,
    pub rank: usize,
}

impl CrsiParams {
    pub fn kind(&self) -> GaugeKind {
        GaugeKind::Crsi {
            rsi: self.rsi,
            streak: self.streak,
            rank: self.rank,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendPullbackParams {
    pub adx_period: usize,
    pub adx_threshold: f64,
    pub ema_period: usize,
    pub ema_tolerance: f64,
    /// Offset added above the reference high (entry stop) and below the
    /// reference low (protective stop).
    pub entry_offset: f64,
    /// Stops tighter than this fraction of the entry price are widened to
    /// `widened_stop_fraction` instead of rejected.
    pub min_stop_fraction: f64,
    pub widened_stop_fraction: f64,
    /// Hard stop as a fraction below average price when no pending stop
    /// was recorded at entry.
    pub fallback_stop_fraction: f64,
    /// Trailing stop sits this fraction below the EMA.
    pub trail_fraction: f64,
}

impl Default for TrendPullbackParams {
    fn default() -> Self {
        TrendPullbackParams {
            adx_period: 14,
            adx_threshold: 30.0,
            ema_period: 20,
            ema_tolerance: 0.005,
            entry_offset: 0.05,
            min_stop_fraction: 0.01,
            widened_stop_fraction: 0.02,
            fallback_stop_fraction: 0.05,
            trail_fraction: 0.02,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BandReversionParams {
    pub fast_sma: usize,
    pub slow_sma: usize,
    pub band_period: usize,
    pub band_mult_x100: u32,
    pub crsi: CrsiParams,
    pub oversold: f64,
    pub atr_period: usize,
    pub stop_atr_mult: f64,
    /// Limit orders rest this fraction below the lower band.
    pub limit_discount: f64,
    pub time_stop_days: i64,
}

impl Default for BandReversionParams {
    fn default() -> Self {
        BandReversionParams {
            fast_sma: 50,
            slow_sma: 200,
            band_period: 20,
            band_mult_x100: 200,
            crsi: CrsiParams {
                rsi: 3,
                streak: 2,
                rank: 100,
            },
            oversold: 15.0,
            atr_period: 14,
            stop_atr_mult: 3.0,
            limit_discount: 0.005,
            time_stop_days: 8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OscillatorReversionParams {
    pub trend_sma: usize,
    pub crsi: CrsiParams,
    pub oversold: f64,
    pub atr_period: usize,
    /// Stop distance used for sizing only; the managed stop uses
    /// `stop_atr_mult`.
    pub sizing_atr_mult: f64,
    pub stop_atr_mult: f64,
    pub target_atr_mult: f64,
}

impl Default for OscillatorReversionParams {
    fn default() -> Self {
        OscillatorReversionParams {
            trend_sma: 200,
            crsi: CrsiParams {
                rsi: 2,
                streak: 2,
                rank: 100,
            },
            oversold: 15.0,
            atr_period: 14,
            sizing_atr_mult: 3.0,
            stop_atr_mult: 2.0,
            target_atr_mult: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreakoutFailureParams {
    pub lookback: usize,
    /// The extreme must have been set at least this many days ago.
    pub min_age_days: usize,
    pub atr_period: usize,
    pub stop_atr_mult: f64,
    pub target_atr_mult: f64,
    pub time_stop_days: i64,
    pub polarity: SignalPolarity,
}

impl Default for BreakoutFailureParams {
    fn default() -> Self {
        BreakoutFailureParams {
            lookback: 20,
            min_age_days: 3,
            atr_period: 14,
            stop_atr_mult: 1.5,
            target_atr_mult: 2.0,
            time_stop_days: 3,
            polarity: SignalPolarity::Direct,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpeningRangeParams {
    pub session_open: NaiveTime,
    pub range_minutes: i64,
    pub flatten_time: NaiveTime,
}

impl Default for OpeningRangeParams {
    fn default() -> Self {
        OpeningRangeParams {
            session_open: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            range_minutes: 5,
            flatten_time: NaiveTime::from_hms_opt(15, 55, 0).unwrap(),
        }
    }
}

impl OpeningRangeParams {
    /// First moment at which the opening range is considered complete.
    pub fn range_end(&self) -> NaiveTime {
        self.session_open + chrono::Duration::minutes(self.range_minutes)
    }
}

/// The configured rule variant with its parameters.
#[derive(Debug, Clone)]
pub enum RuleParams {
    TrendPullback(TrendPullbackParams),
    BandReversion(BandReversionParams),
    OscillatorReversion(OscillatorReversionParams),
    BreakoutFailure(BreakoutFailureParams),
    OpeningRange(OpeningRangeParams),
}

impl RuleParams {
    pub fn name(&self) -> &'static str {
        match self {
            RuleParams::TrendPullback(_) => "trend_pullback",
            RuleParams::BandReversion(_) => "band_reversion",
            RuleParams::OscillatorReversion(_) => "oscillator_reversion",
            RuleParams::BreakoutFailure(_) => "breakout_failure",
            RuleParams::OpeningRange(_) => "opening_range",
        }
    }

    /// Gauges the host must supply for each tracked symbol.
    pub fn gauge_kinds(&self) -> Vec<GaugeKind> {
        match self {
            RuleParams::TrendPullback(p) => vec![
                GaugeKind::Adx(p.adx_period),
                GaugeKind::PlusDi(p.adx_period),
                GaugeKind::MinusDi(p.adx_period),
                GaugeKind::Ema(p.ema_period),
            ],
            RuleParams::BandReversion(p) => vec![
                GaugeKind::Sma(p.fast_sma),
                GaugeKind::Sma(p.slow_sma),
                GaugeKind::BollingerMiddle {
                    period: p.band_period,
                    stddev_mult_x100: p.band_mult_x100,
                },
                GaugeKind::BollingerLower {
                    period: p.band_period,
                    stddev_mult_x100: p.band_mult_x100,
                },
                p.crsi.kind(),
                GaugeKind::Atr(p.atr_period),
            ],
            RuleParams::OscillatorReversion(p) => vec![
                GaugeKind::Sma(p.trend_sma),
                p.crsi.kind(),
                GaugeKind::Atr(p.atr_period),
            ],
            RuleParams::BreakoutFailure(p) => vec![GaugeKind::Atr(p.atr_period)],
            RuleParams::OpeningRange(_) => vec![],
        }
    }

    /// Rolling-window capacity each variant needs. Window-less variants
    /// still keep the latest bar.
    pub fn window_capacity(&self) -> usize {
        match self {
            RuleParams::TrendPullback(_) => 2,
            RuleParams::BreakoutFailure(p) => p.lookback + 5,
            RuleParams::BandReversion(_)
            | RuleParams::OscillatorReversion(_)
            | RuleParams::OpeningRange(_) => 1,
        }
    }
}
