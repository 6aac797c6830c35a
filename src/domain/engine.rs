//! Event-driven engine.
//!
//! Owns the tracked-symbol map and the universe membership set, and turns
//! host events into order and liquidation requests. All work happens
//! synchronously inside the host's callbacks; the engine never blocks,
//! schedules, or retries. Failure policy inside the event loop is strictly
//! "skip this symbol this cycle".

use crate::domain::bar::Bar;
use crate::domain::exit::{evaluate_exit, ExitLevels, ExitReason};
use crate::domain::rules::{
    band_reversion, breakout_failure, opening_range, oscillator_reversion, trend_pullback,
    OpeningRangeParams, RuleParams,
};
use crate::domain::settings::EngineSettings;
use crate::domain::sizer::{size_order, SizeRequest};
use crate::domain::tracker::SymbolState;
use crate::domain::universe::{select_universe, InstrumentSnapshot, SecurityChanges};
use crate::ports::broker_port::{BrokerPort, PositionView};
use crate::ports::event_port::{DataEvent, MarketEventHandler};
use crate::ports::indicator_port::IndicatorHost;
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};

pub struct Engine {
    settings: EngineSettings,
    trackers: HashMap<String, SymbolState>,
    active: HashSet<String>,
}

impl Engine {
    pub fn new(settings: EngineSettings) -> Self {
        Engine {
            settings,
            trackers: HashMap::new(),
            active: HashSet::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn is_tracked(&self, symbol: &str) -> bool {
        self.trackers.contains_key(symbol)
    }

    pub fn is_active(&self, symbol: &str) -> bool {
        self.active.contains(symbol)
    }

    pub fn tracked_count(&self) -> usize {
        self.trackers.len()
    }

    pub fn tracker(&self, symbol: &str) -> Option<&SymbolState> {
        self.trackers.get(symbol)
    }
}

impl MarketEventHandler for Engine {
    fn on_universe_refresh(&mut self, snapshots: &[InstrumentSnapshot]) -> Vec<String> {
        select_universe(snapshots, &self.settings.universe)
    }

    fn on_securities_changed(
        &mut self,
        changes: &SecurityChanges,
        broker: &mut dyn BrokerPort,
        indicators: &dyn IndicatorHost,
    ) {
        for symbol in &changes.removed {
            broker.cancel_open_orders(symbol);
            self.active.remove(symbol);

            if self.trackers.contains_key(symbol) {
                if broker.position(symbol).invested {
                    // keep the tracker alive to manage the open position
                    if let Some(state) = self.trackers.get_mut(symbol) {
                        state.orphaned = true;
                    }
                } else {
                    self.trackers.remove(symbol);
                }
            }
        }

        for symbol in &changes.added {
            self.active.insert(symbol.clone());
            match self.trackers.get_mut(symbol) {
                Some(state) => state.orphaned = false,
                None => {
                    let state = SymbolState::new(symbol, &self.settings.rule, indicators);
                    self.trackers.insert(symbol.clone(), state);
                }
            }
        }
    }

    fn on_data_event(&mut self, event: &DataEvent, broker: &mut dyn BrokerPort) {
        let mut total_active = broker.invested_count() + broker.total_open_orders();

        let mut symbols: Vec<String> = self.trackers.keys().cloned().collect();
        symbols.sort();

        for symbol in symbols {
            let orphaned = match self.trackers.get(&symbol) {
                Some(state) => state.orphaned,
                None => continue,
            };
            let view = broker.position(&symbol);

            // an orphan that has gone flat is dropped on this later cycle
            if orphaned && !view.invested && broker.open_order_count(&symbol) == 0 {
                self.trackers.remove(&symbol);
                continue;
            }

            let Some(bar) = event.bars.get(&symbol) else {
                continue;
            };

            let settings = &self.settings;
            let in_universe = self.active.contains(&symbol);
            let Some(state) = self.trackers.get_mut(&symbol) else {
                continue;
            };

            state.record_bar(bar.clone());
            if !state.is_ready() {
                continue;
            }

            if let RuleParams::OpeningRange(params) = &settings.rule {
                let placed = handle_opening_range(
                    params,
                    settings,
                    state,
                    bar,
                    event.time,
                    in_universe,
                    total_active,
                    broker,
                );
                if placed {
                    total_active += 1;
                }
                continue;
            }

            if view.invested {
                if state.entry_time.is_none() {
                    state.entry_time = Some(event.time);
                }
                if let Some(reason) = exit_decision(settings, state, &view, bar, event.time) {
                    broker.liquidate(&symbol, reason.label());
                    state.clear_entry_state();
                }
                continue;
            }

            if !in_universe {
                continue;
            }

            if broker.open_order_count(&symbol) > 0 {
                if let RuleParams::BandReversion(params) = &settings.rule {
                    // the resting limit survives only while the setup holds
                    let stale = state
                        .gauges
                        .band_reversion_readings()
                        .map(|r| band_reversion::evaluate(bar.close, &r, params).is_none())
                        .unwrap_or(true);
                    if stale {
                        broker.cancel_open_orders(&symbol);
                    }
                    continue;
                }
                // stale entry orders are re-derived from fresh levels below
                broker.cancel_open_orders(&symbol);
            }

            if total_active >= settings.max_positions {
                continue;
            }

            if try_enter(settings, state, bar, event.time, broker) {
                total_active += 1;
            }
        }
    }
}

fn exit_decision(
    settings: &EngineSettings,
    state: &SymbolState,
    view: &PositionView,
    bar: &Bar,
    now: NaiveDateTime,
) -> Option<ExitReason> {
    let price = bar.close;
    let is_long = view.quantity >= 0;
    let days = state.days_in_trade(now);

    let levels = match &settings.rule {
        RuleParams::TrendPullback(p) => {
            let readings = state.gauges.trend_pullback_readings()?;
            ExitLevels {
                stop: Some(trend_pullback::exit_trigger(
                    state.pending_stop_price,
                    view.average_price,
                    readings.ema,
                    p,
                )),
                target: None,
                time_stop_days: None,
            }
        }
        RuleParams::BandReversion(p) => {
            let readings = state.gauges.band_reversion_readings()?;
            ExitLevels {
                stop: Some(view.average_price - readings.atr * p.stop_atr_mult),
                target: Some(readings.middle_band),
                time_stop_days: Some(p.time_stop_days),
            }
        }
        RuleParams::OscillatorReversion(p) => {
            let readings = state.gauges.oscillator_reversion_readings()?;
            ExitLevels {
                stop: Some(view.average_price - readings.atr * p.stop_atr_mult),
                target: Some(view.average_price + readings.atr * p.target_atr_mult),
                time_stop_days: None,
            }
        }
        RuleParams::BreakoutFailure(p) => {
            let atr = state.gauges.atr()?;
            let entry = if state.entry_price > 0.0 {
                state.entry_price
            } else {
                view.average_price
            };
            let (stop, target) = if is_long {
                (entry - atr * p.stop_atr_mult, entry + atr * p.target_atr_mult)
            } else {
                (entry + atr * p.stop_atr_mult, entry - atr * p.target_atr_mult)
            };
            ExitLevels {
                stop: Some(stop),
                target: Some(target),
                time_stop_days: Some(p.time_stop_days),
            }
        }
        RuleParams::OpeningRange(_) => return None,
    };

    evaluate_exit(&levels, price, is_long, days)
}

fn try_enter(
    settings: &EngineSettings,
    state: &mut SymbolState,
    bar: &Bar,
    now: NaiveDateTime,
    broker: &mut dyn BrokerPort,
) -> bool {
    let price = bar.close;
    let risk_dollars = settings.risk.dollars(broker.equity());

    match &settings.rule {
        RuleParams::TrendPullback(p) => {
            let Some(readings) = state.gauges.trend_pullback_readings() else {
                return false;
            };
            let Some(reference) = state.window.get(0) else {
                return false;
            };
            if trend_pullback::evaluate(&readings, reference, p).is_none() {
                return false;
            }
            let levels = trend_pullback::entry_levels(reference, p);
            let Some(quantity) = size_order(&SizeRequest {
                risk_dollars,
                stop_distance: levels.stop_distance(),
                price: levels.entry_stop,
                max_notional: settings.max_notional,
            }) else {
                return false;
            };
            broker.submit_stop_order(&state.symbol, quantity, levels.entry_stop);
            state.pending_stop_price = levels.protective_stop;
            true
        }
        RuleParams::BandReversion(p) => {
            let Some(readings) = state.gauges.band_reversion_readings() else {
                return false;
            };
            if band_reversion::evaluate(price, &readings, p).is_none() {
                return false;
            }
            let limit = band_reversion::limit_price(&readings, p);
            if !band_reversion::limit_acceptable(limit, &readings) {
                return false;
            }
            let Some(quantity) = size_order(&SizeRequest {
                risk_dollars,
                stop_distance: readings.atr * p.stop_atr_mult,
                price: limit,
                max_notional: settings.max_notional,
            }) else {
                return false;
            };
            broker.submit_limit_order(&state.symbol, quantity, limit);
            true
        }
        RuleParams::OscillatorReversion(p) => {
            let Some(readings) = state.gauges.oscillator_reversion_readings() else {
                return false;
            };
            if oscillator_reversion::evaluate(price, &readings, p).is_none() {
                return false;
            }
            let Some(quantity) = size_order(&SizeRequest {
                risk_dollars,
                stop_distance: readings.atr * p.sizing_atr_mult,
                price,
                max_notional: settings.max_notional,
            }) else {
                return false;
            };
            broker.submit_market_order(&state.symbol, quantity);
            state.entry_time = Some(now);
            state.entry_price = price;
            true
        }
        RuleParams::BreakoutFailure(p) => {
            let signal = breakout_failure::evaluate(&state.window, p);
            if signal.is_none() {
                return false;
            }
            let Some(atr) = state.gauges.atr() else {
                return false;
            };
            let Some(quantity) = size_order(&SizeRequest {
                risk_dollars,
                stop_distance: atr * p.stop_atr_mult,
                price,
                max_notional: settings.max_notional,
            }) else {
                return false;
            };
            broker.submit_market_order(&state.symbol, quantity * signal.direction());
            state.entry_time = Some(now);
            state.entry_price = price;
            true
        }
        RuleParams::OpeningRange(_) => false,
    }
}

/// Session-driven handling for the intraday variant: roll the session,
/// flatten at the configured time, build the opening range, then allow at
/// most one breakout entry per session. Returns true when an order was
/// placed.
#[allow(clippy::too_many_arguments)]
fn handle_opening_range(
    params: &OpeningRangeParams,
    settings: &EngineSettings,
    state: &mut SymbolState,
    bar: &Bar,
    now: NaiveDateTime,
    in_universe: bool,
    total_active: usize,
    broker: &mut dyn BrokerPort,
) -> bool {
    state.session.roll(now.date());
    let time = now.time();

    if time >= params.flatten_time {
        if broker.position(&state.symbol).invested {
            broker.liquidate(&state.symbol, ExitReason::EndOfSession.label());
            state.clear_entry_state();
        }
        return false;
    }

    if time < params.session_open {
        return false;
    }

    if time < params.range_end() {
        state.session.range.extend(bar);
        return false;
    }

    if !state.session.range.captured && state.session.range.high > 0.0 {
        state.session.range.captured = true;
    }

    if broker.position(&state.symbol).invested {
        return false;
    }
    if !in_universe || state.session.traded {
        return false;
    }
    if total_active >= settings.max_positions {
        return false;
    }

    let signal = opening_range::evaluate(&state.session.range, bar.close);
    if signal.is_none() {
        return false;
    }

    // full allocation, capped by notional; this rule carries no stop level
    let budget = broker.equity().min(settings.max_notional);
    let quantity = (budget / bar.close).floor() as i64;
    if quantity <= 0 {
        return false;
    }

    broker.submit_market_order(&state.symbol, quantity * signal.direction());
    state.session.traded = true;
    state.entry_time = Some(now);
    state.entry_price = bar.close;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::TrendPullbackParams;
    use crate::ports::indicator_port::{Gauge, GaugeKind};
    use chrono::NaiveDate;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct ScriptedBroker {
        positions: HashMap<String, PositionView>,
        open_orders: HashMap<String, usize>,
        equity: f64,
        stop_orders: Vec<(String, i64, f64)>,
        limit_orders: Vec<(String, i64, f64)>,
        market_orders: Vec<(String, i64)>,
        cancels: Vec<String>,
        liquidations: Vec<(String, String)>,
    }

    impl ScriptedBroker {
        fn new(equity: f64) -> Self {
            ScriptedBroker {
                equity,
                ..Default::default()
            }
        }

        fn set_position(&mut self, symbol: &str, quantity: i64, average_price: f64) {
            self.positions.insert(
                symbol.to_string(),
                PositionView {
                    invested: quantity != 0,
                    quantity,
                    average_price,
                },
            );
        }

        fn clear_position(&mut self, symbol: &str) {
            self.positions.remove(symbol);
        }
    }

    impl BrokerPort for ScriptedBroker {
        fn position(&self, symbol: &str) -> PositionView {
            self.positions.get(symbol).copied().unwrap_or_default()
        }
        fn open_order_count(&self, symbol: &str) -> usize {
            self.open_orders.get(symbol).copied().unwrap_or(0)
        }
        fn total_open_orders(&self) -> usize {
            self.open_orders.values().sum()
        }
        fn invested_count(&self) -> usize {
            self.positions.values().filter(|p| p.invested).count()
        }
        fn equity(&self) -> f64 {
            self.equity
        }
        fn submit_stop_order(&mut self, symbol: &str, quantity: i64, stop_price: f64) {
            self.stop_orders
                .push((symbol.to_string(), quantity, stop_price));
            *self.open_orders.entry(symbol.to_string()).or_insert(0) += 1;
        }
        fn submit_limit_order(&mut self, symbol: &str, quantity: i64, limit_price: f64) {
            self.limit_orders
                .push((symbol.to_string(), quantity, limit_price));
            *self.open_orders.entry(symbol.to_string()).or_insert(0) += 1;
        }
        fn submit_market_order(&mut self, symbol: &str, quantity: i64) {
            self.market_orders.push((symbol.to_string(), quantity));
        }
        fn cancel_open_orders(&mut self, symbol: &str) {
            self.cancels.push(symbol.to_string());
            self.open_orders.remove(symbol);
        }
        fn liquidate(&mut self, symbol: &str, reason: &str) {
            self.liquidations
                .push((symbol.to_string(), reason.to_string()));
        }
    }

    #[derive(Clone, Default)]
    struct SharedHost {
        values: Rc<RefCell<HashMap<(String, GaugeKind), f64>>>,
        ready: Rc<Cell<bool>>,
    }

    impl SharedHost {
        fn ready() -> Self {
            let host = SharedHost::default();
            host.ready.set(true);
            host
        }

        fn set(&self, symbol: &str, kind: GaugeKind, value: f64) {
            self.values
                .borrow_mut()
                .insert((symbol.to_string(), kind), value);
        }
    }

    struct SharedGauge {
        key: (String, GaugeKind),
        values: Rc<RefCell<HashMap<(String, GaugeKind), f64>>>,
        ready: Rc<Cell<bool>>,
    }

    impl Gauge for SharedGauge {
        fn is_ready(&self) -> bool {
            self.ready.get()
        }
        fn value(&self) -> f64 {
            self.values.borrow().get(&self.key).copied().unwrap_or(0.0)
        }
    }

    impl IndicatorHost for SharedHost {
        fn gauge(&self, symbol: &str, kind: &GaugeKind) -> Box<dyn Gauge> {
            Box::new(SharedGauge {
                key: (symbol.to_string(), kind.clone()),
                values: Rc::clone(&self.values),
                ready: Rc::clone(&self.ready),
            })
        }
    }

    fn settings(max_positions: usize) -> EngineSettings {
        EngineSettings {
            max_positions,
            rule: RuleParams::TrendPullback(TrendPullbackParams::default()),
            ..EngineSettings::default()
        }
    }

    fn added(symbols: &[&str]) -> SecurityChanges {
        SecurityChanges {
            added: symbols.iter().map(|s| s.to_string()).collect(),
            removed: vec![],
        }
    }

    fn removed(symbols: &[&str]) -> SecurityChanges {
        SecurityChanges {
            added: vec![],
            removed: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn bar(symbol: &str, day: u32, low: f64, high: f64, close: f64) -> Bar {
        Bar {
            symbol: symbol.to_string(),
            time: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 100_000,
        }
    }

    fn event(bars: Vec<Bar>) -> DataEvent {
        let mut e = DataEvent::new(bars[0].time);
        for b in bars {
            e.bars.insert(b.symbol.clone(), b);
        }
        e
    }

    /// Gauge values that make the trend-pullback rule fire against a bar
    /// whose low sits on the EMA.
    fn arm_signal(host: &SharedHost, symbol: &str, ema: f64) {
        host.set(symbol, GaugeKind::Adx(14), 35.0);
        host.set(symbol, GaugeKind::PlusDi(14), 30.0);
        host.set(symbol, GaugeKind::MinusDi(14), 10.0);
        host.set(symbol, GaugeKind::Ema(20), ema);
    }

    #[test]
    fn universe_refresh_applies_filter() {
        let mut engine = Engine::new(settings(5));
        let snapshots = vec![
            InstrumentSnapshot {
                symbol: "THIN".into(),
                price: 50.0,
                dollar_volume: 1_000.0,
                has_fundamental_data: true,
            },
            InstrumentSnapshot {
                symbol: "DEEP".into(),
                price: 50.0,
                dollar_volume: 9_000.0,
                has_fundamental_data: true,
            },
        ];
        let universe = engine.on_universe_refresh(&snapshots);
        assert_eq!(universe, vec!["DEEP", "THIN"]);
    }

    #[test]
    fn securities_changed_creates_and_removes_trackers() {
        let mut engine = Engine::new(settings(5));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::ready();

        engine.on_securities_changed(&added(&["SPY", "AAPL"]), &mut broker, &host);
        assert!(engine.is_tracked("SPY"));
        assert!(engine.is_tracked("AAPL"));
        assert!(engine.is_active("SPY"));

        engine.on_securities_changed(&removed(&["SPY"]), &mut broker, &host);
        assert!(!engine.is_tracked("SPY"));
        assert!(!engine.is_active("SPY"));
        assert!(engine.is_tracked("AAPL"));
        assert_eq!(broker.cancels, vec!["SPY"]);
    }

    #[test]
    fn tracker_creation_is_idempotent() {
        let mut engine = Engine::new(settings(5));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::ready();

        engine.on_securities_changed(&added(&["SPY"]), &mut broker, &host);
        engine.on_securities_changed(&added(&["SPY"]), &mut broker, &host);
        assert_eq!(engine.tracked_count(), 1);
    }

    #[test]
    fn invested_symbol_is_orphaned_not_removed() {
        let mut engine = Engine::new(settings(5));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::ready();

        engine.on_securities_changed(&added(&["SPY"]), &mut broker, &host);
        broker.set_position("SPY", 100, 100.0);

        engine.on_securities_changed(&removed(&["SPY"]), &mut broker, &host);
        assert!(engine.is_tracked("SPY"));
        assert!(!engine.is_active("SPY"));
        assert!(engine.tracker("SPY").unwrap().orphaned);
    }

    #[test]
    fn orphan_pruned_one_cycle_after_going_flat() {
        let mut engine = Engine::new(settings(5));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::ready();

        engine.on_securities_changed(&added(&["SPY"]), &mut broker, &host);
        broker.set_position("SPY", 100, 100.0);
        engine.on_securities_changed(&removed(&["SPY"]), &mut broker, &host);

        // still invested: the data event must not prune it
        engine.on_data_event(&event(vec![bar("SPY", 1, 99.0, 103.0, 102.0)]), &mut broker);
        assert!(engine.is_tracked("SPY"));

        // position closed externally; next cycle prunes the tracker
        broker.clear_position("SPY");
        engine.on_data_event(&event(vec![bar("SPY", 2, 99.0, 103.0, 102.0)]), &mut broker);
        assert!(!engine.is_tracked("SPY"));
    }

    #[test]
    fn entry_places_stop_order_and_records_protective_stop() {
        let mut engine = Engine::new(settings(5));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::ready();
        arm_signal(&host, "SPY", 100.0);

        engine.on_securities_changed(&added(&["SPY"]), &mut broker, &host);

        // first bar only fills the two-bar window
        engine.on_data_event(&event(vec![bar("SPY", 1, 99.5, 102.0, 101.0)]), &mut broker);
        assert!(broker.stop_orders.is_empty());

        engine.on_data_event(&event(vec![bar("SPY", 2, 99.0, 103.0, 102.0)]), &mut broker);
        assert_eq!(broker.stop_orders.len(), 1);

        let (symbol, quantity, stop_price) = &broker.stop_orders[0];
        assert_eq!(symbol, "SPY");
        assert!((stop_price - 103.05).abs() < 1e-9);
        // risk 1000 / distance 4.1 = 243, capped to 25_000 notional
        assert_eq!(*quantity, 242);

        let state = engine.tracker("SPY").unwrap();
        assert!((state.pending_stop_price - 98.95).abs() < 1e-9);
    }

    #[test]
    fn capacity_limits_concurrent_entries() {
        let mut engine = Engine::new(settings(1));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::ready();
        arm_signal(&host, "AAA", 100.0);
        arm_signal(&host, "BBB", 100.0);

        engine.on_securities_changed(&added(&["AAA", "BBB"]), &mut broker, &host);

        let bars = |day| {
            event(vec![
                bar("AAA", day, 99.0, 103.0, 102.0),
                bar("BBB", day, 99.0, 103.0, 102.0),
            ])
        };
        engine.on_data_event(&bars(1), &mut broker);
        engine.on_data_event(&bars(2), &mut broker);

        // only the first symbol got an order; capacity blocked the second
        assert_eq!(broker.stop_orders.len(), 1);
        assert_eq!(broker.total_open_orders(), 1);

        // the stale order is cancelled but still counts against capacity
        // for the rest of the bar
        engine.on_data_event(&bars(3), &mut broker);
        assert_eq!(broker.total_open_orders(), 0);

        // freed capacity lets a single entry through again next bar
        engine.on_data_event(&bars(4), &mut broker);
        assert_eq!(broker.stop_orders.len(), 2);
        assert_eq!(broker.total_open_orders(), 1);
    }

    #[test]
    fn invested_symbol_runs_exits_not_entries() {
        let mut engine = Engine::new(settings(5));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::ready();
        arm_signal(&host, "SPY", 100.0);

        engine.on_securities_changed(&added(&["SPY"]), &mut broker, &host);
        engine.on_data_event(&event(vec![bar("SPY", 1, 99.0, 103.0, 102.0)]), &mut broker);
        engine.on_data_event(&event(vec![bar("SPY", 2, 99.0, 103.0, 102.0)]), &mut broker);
        broker.set_position("SPY", 242, 103.05);
        broker.open_orders.clear();

        // price holds above the trigger: no exit, no fresh entry order
        engine.on_data_event(&event(vec![bar("SPY", 3, 101.0, 104.0, 103.0)]), &mut broker);
        assert!(broker.liquidations.is_empty());
        assert_eq!(broker.stop_orders.len(), 1);

        // price drops through the recorded protective stop
        engine.on_data_event(&event(vec![bar("SPY", 4, 95.0, 99.0, 96.0)]), &mut broker);
        assert_eq!(broker.liquidations.len(), 1);
        assert_eq!(broker.liquidations[0], ("SPY".to_string(), "Stop Loss".to_string()));
        assert_eq!(engine.tracker("SPY").unwrap().pending_stop_price, 0.0);
    }

    #[test]
    fn missing_bar_skips_symbol() {
        let mut engine = Engine::new(settings(5));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::ready();
        arm_signal(&host, "SPY", 100.0);

        engine.on_securities_changed(&added(&["SPY"]), &mut broker, &host);
        engine.on_data_event(&event(vec![bar("SPY", 1, 99.0, 103.0, 102.0)]), &mut broker);

        // event carries a bar for a different symbol only
        engine.on_data_event(&event(vec![bar("QQQ", 2, 99.0, 103.0, 102.0)]), &mut broker);
        assert!(broker.stop_orders.is_empty());
    }

    #[test]
    fn unwarmed_gauges_skip_symbol() {
        let mut engine = Engine::new(settings(5));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::default(); // never ready
        arm_signal(&host, "SPY", 100.0);

        engine.on_securities_changed(&added(&["SPY"]), &mut broker, &host);
        engine.on_data_event(&event(vec![bar("SPY", 1, 99.0, 103.0, 102.0)]), &mut broker);
        engine.on_data_event(&event(vec![bar("SPY", 2, 99.0, 103.0, 102.0)]), &mut broker);
        assert!(broker.stop_orders.is_empty());
    }

    #[test]
    fn inactive_symbol_places_no_entries() {
        let mut engine = Engine::new(settings(5));
        let mut broker = ScriptedBroker::new(100_000.0);
        let host = SharedHost::ready();
        arm_signal(&host, "SPY", 100.0);

        engine.on_securities_changed(&added(&["SPY"]), &mut broker, &host);
        broker.set_position("SPY", 100, 100.0);
        engine.on_securities_changed(&removed(&["SPY"]), &mut broker, &host);

        // orphaned and invested: exits may run, entries may not
        engine.on_data_event(&event(vec![bar("SPY", 1, 99.0, 103.0, 102.0)]), &mut broker);
        engine.on_data_event(&event(vec![bar("SPY", 2, 99.0, 103.0, 102.0)]), &mut broker);
        assert!(broker.stop_orders.is_empty());
    }
}
