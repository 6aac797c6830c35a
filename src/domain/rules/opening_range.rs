//! Opening-range breakout rule.
//!
//! The first minutes of each session establish a high/low range; after the
//! capture window a close beyond the range triggers one directional entry.
//! The once-per-session and end-of-session flattening logic lives in the
//! engine's session state; this evaluator is the pure breakout predicate.

use crate::domain::bar::Bar;
use crate::domain::rules::Signal;

/// High/low of the session's capture window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningRange {
    pub high: f64,
    pub low: f64,
    pub captured: bool,
}

impl OpeningRange {
    pub fn empty() -> Self {
        OpeningRange {
            high: 0.0,
            low: 0.0,
            captured: false,
        }
    }

    /// Fold a capture-window bar into the range.
    pub fn extend(&mut self, bar: &Bar) {
        if self.high == 0.0 || bar.high > self.high {
            self.high = bar.high;
        }
        if self.low == 0.0 || bar.low < self.low {
            self.low = bar.low;
        }
    }
}

pub fn evaluate(range: &OpeningRange, close: f64) -> Signal {
    if !range.captured {
        return Signal::None;
    }
    if range.high > 0.0 && close > range.high {
        Signal::Long
    } else if range.low > 0.0 && close < range.low {
        Signal::Short
    } else {
        Signal::None
    }
}
