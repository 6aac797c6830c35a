//! Trend-pullback rule.
//!
//! Entry: strong trend (ADX over threshold), bullish bias (+DI over -DI),
//! and the latest completed bar pulling back to the EMA, either by touching
//! it intrabar or by closing its low within a small tolerance of it. The
//! entry itself is a buy-stop above the bar's high so the trade only
//! triggers if strength resumes.

use crate::domain::bar::Bar;
use crate::domain::rules::{Signal, TrendPullbackParams};
use crate::domain::sizer::StopFloor;

/// Current gauge values the rule reads.
#[derive(Debug, Clone, Copy)]
pub struct TrendPullbackReadings {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub ema: f64,
}

pub fn evaluate(
    readings: &TrendPullbackReadings,
    bar: &Bar,
    params: &TrendPullbackParams,
) -> Signal {
    if readings.adx < params.adx_threshold {
        return Signal::None;
    }

    let touched = bar.touches(readings.ema)
        || (bar.low - readings.ema).abs() / readings.ema < params.ema_tolerance;
    let uptrend = readings.plus_di > readings.minus_di;

    if touched && uptrend {
        Signal::Long
    } else {
        Signal::None
    }
}

/// Entry and protective stop levels for a triggered signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryLevels {
    pub entry_stop: f64,
    pub protective_stop: f64,
}

impl EntryLevels {
    pub fn stop_distance(&self) -> f64 {
        self.entry_stop - self.protective_stop
    }
}

/// Buy-stop above the bar's high, protective stop below its low, with an
/// overly tight stop widened per the configured floor.
pub fn entry_levels(bar: &Bar, params: &TrendPullbackParams) -> EntryLevels {
    let entry_stop = bar.high + params.entry_offset;
    let raw_stop = bar.low - params.entry_offset;

    let floor = StopFloor {
        min_fraction: params.min_stop_fraction,
        widened_fraction: params.widened_stop_fraction,
    };
    let protective_stop = floor.apply(entry_stop, raw_stop);

    EntryLevels {
        entry_stop,
        protective_stop,
    }
}

/// Exit trigger while invested: the tighter of the hard stop recorded at
/// entry (or the fallback fraction below average price) and the trailing
/// stop below the EMA.
pub fn exit_trigger(
    pending_stop_price: f64,
    average_price: f64,
    ema: f64,
    params: &TrendPullbackParams,
) -> f64 {
    let hard_stop = if pending_stop_price > 0.0 {
        pending_stop_price
    } else {
        average_price * (1.0 - params.fallback_stop_fraction)
    };
    let trail = ema * (1.0 - params.trail_fraction);
    hard_stop.max(trail)
}
