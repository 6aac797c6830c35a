//! Breakout-failure rule.
//!
//! Scans the trailing window (excluding today) for the lookback low and
//! high and how long ago each was set. Today breaking below an aged low
//! but closing back above it is a failed breakdown; the symmetric high
//! case is a failed breakout. Breakdown-failure is checked first when both
//! could fire on the same bar. The configured polarity maps the raw
//! failure to a direction: direct trades the reversal, inverted fades it.

use crate::domain::bar::BarWindow;
use crate::domain::rules::{BreakoutFailureParams, Signal};

pub fn evaluate(window: &BarWindow, params: &BreakoutFailureParams) -> Signal {
    if window.len() < params.lookback + 1 {
        return Signal::None;
    }

    let today = match window.get(0) {
        Some(bar) => bar,
        None => return Signal::None,
    };

    // Nearest occurrence wins for ties, matching first-index semantics over
    // a newest-first scan.
    let mut min_low = f64::INFINITY;
    let mut min_age = 0usize;
    let mut max_high = f64::NEG_INFINITY;
    let mut max_age = 0usize;

    for days_ago in 1..=params.lookback {
        let bar = match window.get(days_ago) {
            Some(bar) => bar,
            None => return Signal::None,
        };
        if bar.low < min_low {
            min_low = bar.low;
            min_age = days_ago;
        }
        if bar.high > max_high {
            max_high = bar.high;
            max_age = days_ago;
        }
    }

    let raw = if min_age >= params.min_age_days && today.low < min_low && today.close > min_low {
        Signal::Long
    } else if max_age >= params.min_age_days && today.high > max_high && today.close < max_high {
        Signal::Short
    } else {
        Signal::None
    };

    params.polarity.apply(raw)
}
