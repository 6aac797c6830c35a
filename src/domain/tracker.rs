//! Per-symbol tracked state.
//!
//! One `SymbolState` per instrument the engine is watching. Created when a
//! symbol enters the universe, retained while a position is open even after
//! the symbol leaves (orphaned), destroyed once flat and out of universe.

use crate::domain::bar::{Bar, BarWindow};
use crate::domain::rules::opening_range::OpeningRange;
use crate::domain::rules::band_reversion::BandReversionReadings;
use crate::domain::rules::oscillator_reversion::OscillatorReversionReadings;
use crate::domain::rules::trend_pullback::TrendPullbackReadings;
use crate::domain::rules::RuleParams;
use crate::ports::indicator_port::{Gauge, GaugeKind, IndicatorHost};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// The host-provided gauges a rule variant reads.
pub enum GaugeSet {
    TrendPullback {
        adx: Box<dyn Gauge>,
        plus_di: Box<dyn Gauge>,
        minus_di: Box<dyn Gauge>,
        ema: Box<dyn Gauge>,
    },
    BandReversion {
        sma_fast: Box<dyn Gauge>,
        sma_slow: Box<dyn Gauge>,
        middle_band: Box<dyn Gauge>,
        lower_band: Box<dyn Gauge>,
        crsi: Box<dyn Gauge>,
        atr: Box<dyn Gauge>,
    },
    OscillatorReversion {
        trend_sma: Box<dyn Gauge>,
        crsi: Box<dyn Gauge>,
        atr: Box<dyn Gauge>,
    },
    BreakoutFailure {
        atr: Box<dyn Gauge>,
    },
    OpeningRange,
}

impl GaugeSet {
    pub fn build(host: &dyn IndicatorHost, symbol: &str, rule: &RuleParams) -> Self {
        match rule {
            RuleParams::TrendPullback(p) => GaugeSet::TrendPullback {
                adx: host.gauge(symbol, &GaugeKind::Adx(p.adx_period)),
                plus_di: host.gauge(symbol, &GaugeKind::PlusDi(p.adx_period)),
                minus_di: host.gauge(symbol, &GaugeKind::MinusDi(p.adx_period)),
                ema: host.gauge(symbol, &GaugeKind::Ema(p.ema_period)),
            },
            RuleParams::BandReversion(p) => GaugeSet::BandReversion {
                sma_fast: host.gauge(symbol, &GaugeKind::Sma(p.fast_sma)),
                sma_slow: host.gauge(symbol, &GaugeKind::Sma(p.slow_sma)),
                middle_band: host.gauge(
                    symbol,
                    &GaugeKind::BollingerMiddle {
                        period: p.band_period,
                        stddev_mult_x100: p.band_mult_x100,
                    },
                ),
                lower_band: host.gauge(
                    symbol,
                    &GaugeKind::BollingerLower {
                        period: p.band_period,
                        stddev_mult_x100: p.band_mult_x100,
                    },
                ),
                crsi: host.gauge(symbol, &p.crsi.kind()),
                atr: host.gauge(symbol, &GaugeKind::Atr(p.atr_period)),
            },
            RuleParams::OscillatorReversion(p) => GaugeSet::OscillatorReversion {
                trend_sma: host.gauge(symbol, &GaugeKind::Sma(p.trend_sma)),
                crsi: host.gauge(symbol, &p.crsi.kind()),
                atr: host.gauge(symbol, &GaugeKind::Atr(p.atr_period)),
            },
            RuleParams::BreakoutFailure(p) => GaugeSet::BreakoutFailure {
                atr: host.gauge(symbol, &GaugeKind::Atr(p.atr_period)),
            },
            RuleParams::OpeningRange(_) => GaugeSet::OpeningRange,
        }
    }

    pub fn is_ready(&self) -> bool {
        match self {
            GaugeSet::TrendPullback {
                adx,
                plus_di,
                minus_di,
                ema,
            } => adx.is_ready() && plus_di.is_ready() && minus_di.is_ready() && ema.is_ready(),
            GaugeSet::BandReversion {
                sma_fast,
                sma_slow,
                middle_band,
                lower_band,
                crsi,
                atr,
            } => {
                sma_fast.is_ready()
                    && sma_slow.is_ready()
                    && middle_band.is_ready()
                    && lower_band.is_ready()
                    && crsi.is_ready()
                    && atr.is_ready()
            }
            GaugeSet::OscillatorReversion {
                trend_sma,
                crsi,
                atr,
            } => trend_sma.is_ready() && crsi.is_ready() && atr.is_ready(),
            GaugeSet::BreakoutFailure { atr } => atr.is_ready(),
            GaugeSet::OpeningRange => true,
        }
    }

    pub fn trend_pullback_readings(&self) -> Option<TrendPullbackReadings> {
        match self {
            GaugeSet::TrendPullback {
                adx,
                plus_di,
                minus_di,
                ema,
            } => Some(TrendPullbackReadings {
                adx: adx.value(),
                plus_di: plus_di.value(),
                minus_di: minus_di.value(),
                ema: ema.value(),
            }),
            _ => None,
        }
    }

    pub fn band_reversion_readings(&self) -> Option<BandReversionReadings> {
        match self {
            GaugeSet::BandReversion {
                sma_fast,
                sma_slow,
                middle_band,
                lower_band,
                crsi,
                atr,
            } => Some(BandReversionReadings {
                sma_fast: sma_fast.value(),
                sma_slow: sma_slow.value(),
                middle_band: middle_band.value(),
                lower_band: lower_band.value(),
                crsi: crsi.value(),
                atr: atr.value(),
            }),
            _ => None,
        }
    }

    pub fn oscillator_reversion_readings(&self) -> Option<OscillatorReversionReadings> {
        match self {
            GaugeSet::OscillatorReversion {
                trend_sma,
                crsi,
                atr,
            } => Some(OscillatorReversionReadings {
                trend_sma: trend_sma.value(),
                crsi: crsi.value(),
                atr: atr.value(),
            }),
            _ => None,
        }
    }

    pub fn atr(&self) -> Option<f64> {
        match self {
            GaugeSet::TrendPullback { .. } | GaugeSet::OpeningRange => None,
            GaugeSet::BandReversion { atr, .. }
            | GaugeSet::OscillatorReversion { atr, .. }
            | GaugeSet::BreakoutFailure { atr } => Some(atr.value()),
        }
    }
}

impl fmt::Debug for GaugeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GaugeSet::TrendPullback { .. } => "TrendPullback",
            GaugeSet::BandReversion { .. } => "BandReversion",
            GaugeSet::OscillatorReversion { .. } => "OscillatorReversion",
            GaugeSet::BreakoutFailure { .. } => "BreakoutFailure",
            GaugeSet::OpeningRange => "OpeningRange",
        };
        write!(f, "GaugeSet::{}(ready: {})", name, self.is_ready())
    }
}

/// Intraday session bookkeeping for the opening-range variant.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub date: Option<NaiveDate>,
    pub range: OpeningRange,
    pub traded: bool,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState {
            date: None,
            range: OpeningRange::empty(),
            traded: false,
        }
    }

    /// Reset range and trade flag on the first event of a new session.
    pub fn roll(&mut self, date: NaiveDate) {
        if self.date != Some(date) {
            self.date = Some(date);
            self.range = OpeningRange::empty();
            self.traded = false;
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct SymbolState {
    pub symbol: String,
    pub gauges: GaugeSet,
    pub window: BarWindow,
    /// Protective stop recorded when an entry order is placed; 0 when none.
    pub pending_stop_price: f64,
    pub entry_time: Option<NaiveDateTime>,
    pub entry_price: f64,
    /// Out of the active universe but kept alive for an open position.
    pub orphaned: bool,
    pub session: SessionState,
}

impl SymbolState {
    pub fn new(symbol: &str, rule: &RuleParams, host: &dyn IndicatorHost) -> Self {
        SymbolState {
            symbol: symbol.to_string(),
            gauges: GaugeSet::build(host, symbol, rule),
            window: BarWindow::new(rule.window_capacity()),
            pending_stop_price: 0.0,
            entry_time: None,
            entry_price: 0.0,
            orphaned: false,
            session: SessionState::new(),
        }
    }

    /// Ready once every gauge has warmed up and the bar window is full.
    pub fn is_ready(&self) -> bool {
        self.gauges.is_ready() && self.window.is_full()
    }

    pub fn record_bar(&mut self, bar: Bar) {
        self.window.push(bar);
    }

    pub fn days_in_trade(&self, now: NaiveDateTime) -> i64 {
        match self.entry_time {
            Some(entry) => (now.date() - entry.date()).num_days(),
            None => 0,
        }
    }

    /// Forget entry bookkeeping after a liquidation request.
    pub fn clear_entry_state(&mut self) {
        self.pending_stop_price = 0.0;
        self.entry_time = None;
        self.entry_price = 0.0;
    }
}
