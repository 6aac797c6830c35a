//! Host-facing event interface.
//!
//! The host drives the engine through these hooks, serially: a periodic
//! universe refresh, the resulting add/remove diff, then per-bar data
//! events. No two calls for the same symbol ever overlap.

use crate::domain::bar::Bar;
use crate::domain::universe::{InstrumentSnapshot, SecurityChanges};
use crate::ports::broker_port::BrokerPort;
use crate::ports::indicator_port::IndicatorHost;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// One data event: the completed bars visible this cycle, keyed by symbol.
/// Tracked symbols missing from the map are skipped for the cycle.
#[derive(Debug, Clone)]
pub struct DataEvent {
    pub time: NaiveDateTime,
    pub bars: HashMap<String, Bar>,
}

impl DataEvent {
    pub fn new(time: NaiveDateTime) -> Self {
        DataEvent {
            time,
            bars: HashMap::new(),
        }
    }

    pub fn with_bar(mut self, bar: Bar) -> Self {
        self.bars.insert(bar.symbol.clone(), bar);
        self
    }
}

pub trait MarketEventHandler {
    /// Rank the refresh snapshot and return the selected universe. The host
    /// diffs the selection against the previous one and delivers the result
    /// through [`on_securities_changed`](Self::on_securities_changed).
    fn on_universe_refresh(&mut self, snapshots: &[InstrumentSnapshot]) -> Vec<String>;

    fn on_securities_changed(
        &mut self,
        changes: &SecurityChanges,
        broker: &mut dyn BrokerPort,
        indicators: &dyn IndicatorHost,
    );

    fn on_data_event(&mut self, event: &DataEvent, broker: &mut dyn BrokerPort);
}
