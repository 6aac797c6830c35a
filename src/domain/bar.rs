//! Price bar representation and the rolling bar window.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub symbol: String,
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Bar {
    pub fn date(&self) -> NaiveDate {
        self.time.date()
    }

    /// True if the level lies inside the bar's high/low range.
    pub fn touches(&self, level: f64) -> bool {
        self.low <= level && level <= self.high
    }
}

/// Fixed-capacity rolling window of completed bars, newest first.
///
/// `get(0)` is the most recent bar, `get(1)` the bar before it. The window
/// is ready for rules once it has seen `capacity` bars.
#[derive(Debug, Clone)]
pub struct BarWindow {
    capacity: usize,
    bars: VecDeque<Bar>,
}

impl BarWindow {
    pub fn new(capacity: usize) -> Self {
        BarWindow {
            capacity,
            bars: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, bar: Bar) {
        self.bars.push_front(bar);
        self.bars.truncate(self.capacity);
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity == 0 || self.bars.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
