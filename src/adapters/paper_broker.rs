//! Minimal in-memory broker.
//!
//! Deterministic test double behind [`BrokerPort`] for the replay harness
//! and the integration tests. Market orders and liquidations fill at the
//! last marked price; stop and limit orders rest until a later bar touches
//! them. No commissions, slippage, or margin — order matching belongs to
//! the real host.

use crate::domain::bar::Bar;
use crate::ports::broker_port::{BrokerPort, PositionView};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderKind {
    Stop(f64),
    Limit(f64),
}

#[derive(Debug, Clone)]
pub struct RestingOrder {
    pub symbol: String,
    pub quantity: i64,
    pub kind: OrderKind,
}

#[derive(Debug, Clone)]
pub struct Fill {
    pub symbol: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct PaperPosition {
    quantity: i64,
    average_price: f64,
}

#[derive(Debug, Default)]
pub struct PaperBroker {
    cash: f64,
    positions: HashMap<String, PaperPosition>,
    resting: Vec<RestingOrder>,
    last_price: HashMap<String, f64>,
    pub fills: Vec<Fill>,
    pub liquidations: Vec<(String, String)>,
}

impl PaperBroker {
    pub fn new(cash: f64) -> Self {
        PaperBroker {
            cash,
            ..Default::default()
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Record the latest traded prices. Call once per event, before the
    /// engine runs, so market orders and liquidations fill at this bar.
    pub fn mark(&mut self, bars: &HashMap<String, Bar>) {
        for (symbol, bar) in bars {
            self.last_price.insert(symbol.clone(), bar.close);
        }
    }

    /// Fill resting stop/limit orders against the given bars. Call with
    /// each new bar before the engine's event handling, so orders placed on
    /// one bar fill no earlier than the next.
    pub fn settle(&mut self, bars: &HashMap<String, Bar>) {
        let resting = std::mem::take(&mut self.resting);
        for order in resting {
            let Some(bar) = bars.get(&order.symbol) else {
                self.resting.push(order);
                continue;
            };
            match fill_price(&order, bar) {
                Some(price) => self.fill(&order.symbol, order.quantity, price),
                None => self.resting.push(order),
            }
        }
    }

    fn fill(&mut self, symbol: &str, quantity: i64, price: f64) {
        self.cash -= quantity as f64 * price;

        let old = self.positions.get(symbol).copied().unwrap_or_default();
        let new_quantity = old.quantity + quantity;

        if new_quantity == 0 {
            self.positions.remove(symbol);
        } else {
            let average_price = if old.quantity == 0
                || old.quantity.signum() != new_quantity.signum()
            {
                price
            } else if quantity.signum() == old.quantity.signum() {
                // adding to the position: volume-weighted average entry
                let old_value = old.quantity.abs() as f64 * old.average_price;
                let added_value = quantity.abs() as f64 * price;
                (old_value + added_value) / new_quantity.abs() as f64
            } else {
                // partial reduction keeps the entry price
                old.average_price
            };
            self.positions.insert(
                symbol.to_string(),
                PaperPosition {
                    quantity: new_quantity,
                    average_price,
                },
            );
        }

        self.fills.push(Fill {
            symbol: symbol.to_string(),
            quantity,
            price,
        });
    }
}

fn fill_price(order: &RestingOrder, bar: &Bar) -> Option<f64> {
    let buying = order.quantity > 0;
    match order.kind {
        OrderKind::Stop(stop) => {
            if buying && bar.high >= stop {
                Some(bar.open.max(stop))
            } else if !buying && bar.low <= stop {
                Some(bar.open.min(stop))
            } else {
                None
            }
        }
        OrderKind::Limit(limit) => {
            if buying && bar.low <= limit {
                Some(bar.open.min(limit))
            } else if !buying && bar.high >= limit {
                Some(bar.open.max(limit))
            } else {
                None
            }
        }
    }
}

impl BrokerPort for PaperBroker {
    fn position(&self, symbol: &str) -> PositionView {
        match self.positions.get(symbol) {
            Some(p) => PositionView {
                invested: p.quantity != 0,
                quantity: p.quantity,
                average_price: p.average_price,
            },
            None => PositionView::default(),
        }
    }

    fn open_order_count(&self, symbol: &str) -> usize {
        self.resting.iter().filter(|o| o.symbol == symbol).count()
    }

    fn total_open_orders(&self) -> usize {
        self.resting.len()
    }

    fn invested_count(&self) -> usize {
        self.positions.values().filter(|p| p.quantity != 0).count()
    }

    fn equity(&self) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .map(|(symbol, p)| {
                let price = self
                    .last_price
                    .get(symbol)
                    .copied()
                    .unwrap_or(p.average_price);
                p.quantity as f64 * price
            })
            .sum();
        self.cash + position_value
    }

    fn submit_stop_order(&mut self, symbol: &str, quantity: i64, stop_price: f64) {
        self.resting.push(RestingOrder {
            symbol: symbol.to_string(),
            quantity,
            kind: OrderKind::Stop(stop_price),
        });
    }

    fn submit_limit_order(&mut self, symbol: &str, quantity: i64, limit_price: f64) {
        self.resting.push(RestingOrder {
            symbol: symbol.to_string(),
            quantity,
            kind: OrderKind::Limit(limit_price),
        });
    }

    fn submit_market_order(&mut self, symbol: &str, quantity: i64) {
        if quantity == 0 {
            return;
        }
        if let Some(price) = self.last_price.get(symbol).copied() {
            self.fill(symbol, quantity, price);
        }
    }

    fn cancel_open_orders(&mut self, symbol: &str) {
        self.resting.retain(|o| o.symbol != symbol);
    }

    fn liquidate(&mut self, symbol: &str, reason: &str) {
        self.resting.retain(|o| o.symbol != symbol);
        if let Some(position) = self.positions.get(symbol).copied() {
            if position.quantity != 0 {
                let price = self
                    .last_price
                    .get(symbol)
                    .copied()
                    .unwrap_or(position.average_price);
                self.fill(symbol, -position.quantity, price);
            }
        }
        self.liquidations
            .push((symbol.to_string(), reason.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(symbol: &str, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            symbol: symbol.to_string(),
            time: NaiveDate::from_ymd_opt(2024, 5, 6)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
            open,
            high,
            low,
            close,
            volume: 10_000,
        }
    }

    fn bars(list: Vec<Bar>) -> HashMap<String, Bar> {
        list.into_iter().map(|b| (b.symbol.clone(), b)).collect()
    }

    #[test]
    fn market_order_fills_at_marked_price() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.mark(&bars(vec![bar("SPY", 99.0, 101.0, 98.0, 100.0)]));

        broker.submit_market_order("SPY", 100);

        let view = broker.position("SPY");
        assert!(view.invested);
        assert_eq!(view.quantity, 100);
        assert_eq!(view.average_price, 100.0);
        assert_eq!(broker.cash(), 90_000.0);
        assert_eq!(broker.invested_count(), 1);
    }

    #[test]
    fn market_order_without_mark_is_dropped() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.submit_market_order("SPY", 100);
        assert!(!broker.position("SPY").invested);
        assert!(broker.fills.is_empty());
    }

    #[test]
    fn buy_stop_rests_until_touched() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.submit_stop_order("SPY", 100, 105.0);
        assert_eq!(broker.open_order_count("SPY"), 1);
        assert_eq!(broker.total_open_orders(), 1);

        // bar stays below the stop: still resting
        broker.settle(&bars(vec![bar("SPY", 100.0, 104.0, 99.0, 103.0)]));
        assert_eq!(broker.open_order_count("SPY"), 1);
        assert!(!broker.position("SPY").invested);

        // bar trades through the stop: filled at the stop (no gap)
        broker.settle(&bars(vec![bar("SPY", 104.0, 106.0, 103.0, 105.5)]));
        assert_eq!(broker.open_order_count("SPY"), 0);
        let view = broker.position("SPY");
        assert_eq!(view.quantity, 100);
        assert_eq!(view.average_price, 105.0);
    }

    #[test]
    fn buy_stop_gap_open_fills_at_open() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.submit_stop_order("SPY", 100, 105.0);
        broker.settle(&bars(vec![bar("SPY", 108.0, 110.0, 107.0, 109.0)]));
        assert_eq!(broker.position("SPY").average_price, 108.0);
    }

    #[test]
    fn buy_limit_fills_at_or_below_limit() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.submit_limit_order("SPY", 100, 95.0);

        broker.settle(&bars(vec![bar("SPY", 98.0, 99.0, 96.0, 97.0)]));
        assert_eq!(broker.open_order_count("SPY"), 1);

        broker.settle(&bars(vec![bar("SPY", 96.0, 97.0, 94.0, 95.5)]));
        let view = broker.position("SPY");
        assert_eq!(view.quantity, 100);
        assert_eq!(view.average_price, 95.0);
    }

    #[test]
    fn orders_for_other_symbols_keep_resting() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.submit_stop_order("SPY", 100, 105.0);
        broker.settle(&bars(vec![bar("QQQ", 100.0, 110.0, 90.0, 100.0)]));
        assert_eq!(broker.open_order_count("SPY"), 1);
    }

    #[test]
    fn cancel_open_orders_removes_only_that_symbol() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.submit_stop_order("SPY", 100, 105.0);
        broker.submit_limit_order("QQQ", 50, 300.0);

        broker.cancel_open_orders("SPY");
        assert_eq!(broker.open_order_count("SPY"), 0);
        assert_eq!(broker.open_order_count("QQQ"), 1);
    }

    #[test]
    fn liquidate_closes_position_and_tags_reason() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.mark(&bars(vec![bar("SPY", 99.0, 101.0, 98.0, 100.0)]));
        broker.submit_market_order("SPY", 100);

        broker.mark(&bars(vec![bar("SPY", 109.0, 111.0, 108.0, 110.0)]));
        broker.liquidate("SPY", "Take Profit");

        assert!(!broker.position("SPY").invested);
        assert_eq!(broker.cash(), 101_000.0);
        assert_eq!(
            broker.liquidations,
            vec![("SPY".to_string(), "Take Profit".to_string())]
        );
    }

    #[test]
    fn liquidate_cancels_resting_orders_too() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.mark(&bars(vec![bar("SPY", 99.0, 101.0, 98.0, 100.0)]));
        broker.submit_market_order("SPY", 100);
        broker.submit_stop_order("SPY", -100, 95.0);

        broker.liquidate("SPY", "Time Stop");
        assert_eq!(broker.total_open_orders(), 0);
    }

    #[test]
    fn short_position_and_equity() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.mark(&bars(vec![bar("SPY", 99.0, 101.0, 98.0, 100.0)]));
        broker.submit_market_order("SPY", -100);

        let view = broker.position("SPY");
        assert!(view.invested);
        assert_eq!(view.quantity, -100);
        // shorting credits cash, position value is negative
        assert_eq!(broker.cash(), 110_000.0);
        assert_eq!(broker.equity(), 100_000.0);

        // price falls: the short gains
        broker.mark(&bars(vec![bar("SPY", 91.0, 92.0, 89.0, 90.0)]));
        assert_eq!(broker.equity(), 101_000.0);
    }

    #[test]
    fn averaging_into_a_position() {
        let mut broker = PaperBroker::new(100_000.0);
        broker.mark(&bars(vec![bar("SPY", 99.0, 101.0, 98.0, 100.0)]));
        broker.submit_market_order("SPY", 100);
        broker.mark(&bars(vec![bar("SPY", 109.0, 111.0, 108.0, 110.0)]));
        broker.submit_market_order("SPY", 100);

        let view = broker.position("SPY");
        assert_eq!(view.quantity, 200);
        assert_eq!(view.average_price, 105.0);
    }
}
