#![allow(dead_code)]

use chrono::NaiveDate;
use rudder::domain::bar::Bar;
use rudder::domain::universe::SecurityChanges;
use rudder::ports::broker_port::{BrokerPort, PositionView};
use rudder::ports::event_port::DataEvent;
use rudder::ports::indicator_port::{Gauge, GaugeKind, IndicatorHost};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Broker double that records every engine request and lets tests script
/// positions and fills by hand.
#[derive(Default)]
pub struct RecordingBroker {
    pub positions: HashMap<String, PositionView>,
    pub open_orders: HashMap<String, usize>,
    pub equity: f64,
    pub stop_orders: Vec<(String, i64, f64)>,
    pub limit_orders: Vec<(String, i64, f64)>,
    pub market_orders: Vec<(String, i64)>,
    pub cancels: Vec<String>,
    pub liquidations: Vec<(String, String)>,
}

impl RecordingBroker {
    pub fn new(equity: f64) -> Self {
        RecordingBroker {
            equity,
            ..Default::default()
        }
    }

    pub fn set_position(&mut self, symbol: &str, quantity: i64, average_price: f64) {
        self.positions.insert(
            symbol.to_string(),
            PositionView {
                invested: quantity != 0,
                quantity,
                average_price,
            },
        );
    }

    pub fn clear_position(&mut self, symbol: &str) {
        self.positions.remove(symbol);
    }
}

impl BrokerPort for RecordingBroker {
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

/// Indicator host whose gauge values tests can change between events.
#[derive(Clone, Default)]
pub struct SharedHost {
    values: Rc<RefCell<HashMap<(String, GaugeKind), f64>>>,
    ready: Rc<Cell<bool>>,
}

impl SharedHost {
    pub fn ready() -> Self {
        let host = SharedHost::default();
        host.ready.set(true);
        host
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.set(ready);
    }

    pub fn set(&self, symbol: &str, kind: GaugeKind, value: f64) {
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

pub fn daily_bar(symbol: &str, day: u32, low: f64, high: f64, close: f64) -> Bar {
    Bar {
        symbol: symbol.to_string(),
        time: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(day as u64))
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

pub fn minute_bar(symbol: &str, day: u32, hour: u32, minute: u32, low: f64, high: f64, close: f64) -> Bar {
    Bar {
        symbol: symbol.to_string(),
        time: NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap(),
        open: close,
        high,
        low,
        close,
        volume: 5_000,
    }
}

pub fn event(bars: Vec<Bar>) -> DataEvent {
    let mut e = DataEvent::new(bars[0].time);
    for b in bars {
        e.bars.insert(b.symbol.clone(), b);
    }
    e
}

pub fn added(symbols: &[&str]) -> SecurityChanges {
    SecurityChanges {
        added: symbols.iter().map(|s| s.to_string()).collect(),
        removed: vec![],
    }
}

pub fn removed(symbols: &[&str]) -> SecurityChanges {
    SecurityChanges {
        added: vec![],
        removed: symbols.iter().map(|s| s.to_string()).collect(),
    }
}
