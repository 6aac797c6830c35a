//! Oscillator-reversion rule.
//!
//! The simplest of the reversion variants: price above the long-term
//! average and the oscillator oversold. Entries are market orders; exits
//! are ATR multiples around the fill price.

use crate::domain::rules::{OscillatorReversionParams, Signal};

#[derive(Debug, Clone, Copy)]
pub struct OscillatorReversionReadings {
    pub trend_sma: f64,
    pub crsi: f64,
    pub atr: f64,
}

pub fn evaluate(
    price: f64,
    readings: &OscillatorReversionReadings,
    params: &OscillatorReversionParams,
) -> Signal {
    if price < readings.trend_sma {
        return Signal::None;
    }
    if readings.crsi < params.oversold {
        Signal::Long
    } else {
        Signal::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(trend_sma: f64, crsi: f64) -> OscillatorReversionReadings {
        OscillatorReversionReadings {
            trend_sma,
            crsi,
            atr: 2.0,
        }
    }

    #[test]
    fn fires_above_trend_when_oversold() {
        assert_eq!(
            evaluate(
                100.0,
                &readings(90.0, 10.0),
                &OscillatorReversionParams::default()
            ),
            Signal::Long
        );
    }

    #[test]
    fn below_trend_suppresses_signal() {
        assert_eq!(
            evaluate(
                100.0,
                &readings(110.0, 10.0),
                &OscillatorReversionParams::default()
            ),
            Signal::None
        );
    }

    #[test]
    fn not_oversold_suppresses_signal() {
        assert_eq!(
            evaluate(
                100.0,
                &readings(90.0, 15.0),
                &OscillatorReversionParams::default()
            ),
            Signal::None
        );
    }
}
