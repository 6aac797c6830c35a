//! Replay driver.
//!
//! Plays a CSV feed through the engine against the paper broker, acting as
//! the host: refresh the universe on each new session date, deliver the
//! add/remove diff, then the bar event. Resting orders placed on one bar
//! settle against the next.

use crate::adapters::csv_feed::CsvFeed;
use crate::adapters::paper_broker::PaperBroker;
use crate::domain::engine::Engine;
use crate::domain::settings::EngineSettings;
use crate::domain::universe::SecurityChanges;
use crate::ports::broker_port::BrokerPort;
use crate::ports::event_port::{DataEvent, MarketEventHandler};
use chrono::NaiveDate;

#[derive(Debug)]
pub struct ReplaySummary {
    pub events: usize,
    pub sessions: usize,
    pub fills: usize,
    pub liquidations: Vec<(String, String)>,
    pub final_equity: f64,
    pub final_cash: f64,
    pub open_positions: usize,
}

pub fn run_replay(feed: &CsvFeed, settings: EngineSettings, initial_cash: f64) -> ReplaySummary {
    let mut engine = Engine::new(settings);
    let mut broker = PaperBroker::new(initial_cash);

    let mut previous_universe: Vec<String> = Vec::new();
    let mut session_date: Option<NaiveDate> = None;
    let mut events = 0usize;
    let mut sessions = 0usize;

    for time in feed.timeline() {
        feed.advance_to(time);
        let bars = feed.bars_at(time);

        // fill resting orders from earlier bars, then mark this bar's
        // prices for market orders and liquidations
        broker.settle(&bars);
        broker.mark(&bars);

        if session_date != Some(time.date()) {
            session_date = Some(time.date());
            sessions += 1;

            let snapshots = feed.snapshots_at(time);
            let selection = engine.on_universe_refresh(&snapshots);
            let changes = SecurityChanges::diff(&previous_universe, &selection);
            if !changes.is_empty() {
                engine.on_securities_changed(&changes, &mut broker, feed);
            }
            previous_universe = selection;
        }

        let mut event = DataEvent::new(time);
        event.bars = bars;
        engine.on_data_event(&event, &mut broker);
        events += 1;
    }

    ReplaySummary {
        events,
        sessions,
        fills: broker.fills.len(),
        liquidations: broker.liquidations.clone(),
        final_equity: broker.equity(),
        final_cash: broker.cash(),
        open_positions: broker.invested_count(),
    }
}
