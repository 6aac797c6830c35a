//! Band-reversion rule.
//!
//! Entry setup: long-term trend up with price sandwiched between the fast
//! and slow moving averages, price at or below the lower volatility band,
//! and the oscillator deeply oversold. The order is a limit resting a
//! fraction below the lower band; a limit that would sit below the slow
//! average is suppressed rather than placed.

use crate::domain::rules::{BandReversionParams, Signal};

/// Current gauge values the rule reads.
#[derive(Debug, Clone, Copy)]
pub struct BandReversionReadings {
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub middle_band: f64,
    pub lower_band: f64,
    pub crsi: f64,
    pub atr: f64,
}

pub fn evaluate(price: f64, readings: &BandReversionReadings, params: &BandReversionParams) -> Signal {
    let trend_ok = readings.sma_fast > readings.sma_slow
        && readings.sma_fast > price
        && price > readings.sma_slow;
    let at_band = price <= readings.lower_band;
    let oversold = readings.crsi < params.oversold;

    if trend_ok && at_band && oversold {
        Signal::Long
    } else {
        Signal::None
    }
}

/// Resting limit price for a triggered setup.
pub fn limit_price(readings: &BandReversionReadings, params: &BandReversionParams) -> f64 {
    readings.lower_band * (1.0 - params.limit_discount)
}

/// A limit below the slow average would be buying into a broken trend.
pub fn limit_acceptable(limit: f64, readings: &BandReversionReadings) -> bool {
    limit >= readings.sma_slow
}
