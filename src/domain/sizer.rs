//! Risk-based position sizing.
//!
//! Quantity is the risk budget divided by the stop distance, floored to
//! whole shares and capped by a maximum notional exposure. A degenerate
//! stop distance suppresses the order for the cycle; there is no fallback
//! distance unless a rule opts into the stop floor.

/// Risk budget per trade: a fixed dollar amount or a fraction of equity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskBudget {
    Dollars(f64),
    EquityFraction(f64),
}

impl RiskBudget {
    pub fn dollars(&self, equity: f64) -> f64 {
        match self {
            RiskBudget::Dollars(amount) => *amount,
            RiskBudget::EquityFraction(fraction) => equity * fraction,
        }
    }
}

/// Policy knob: a protective stop tighter than `min_fraction` of the entry
/// price is widened to `widened_fraction` below it instead of rejected.
#[derive(Debug, Clone, Copy)]
pub struct StopFloor {
    pub min_fraction: f64,
    pub widened_fraction: f64,
}

impl StopFloor {
    pub fn apply(&self, entry_price: f64, raw_stop: f64) -> f64 {
        let distance = entry_price - raw_stop;
        if distance < entry_price * self.min_fraction {
            entry_price * (1.0 - self.widened_fraction)
        } else {
            raw_stop
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SizeRequest {
    pub risk_dollars: f64,
    pub stop_distance: f64,
    pub price: f64,
    pub max_notional: f64,
}

/// Whole-share quantity for the request, or `None` when no order should be
/// placed this cycle.
pub fn size_order(request: &SizeRequest) -> Option<i64> {
    if request.stop_distance <= 0.0 || request.price <= 0.0 {
        return None;
    }

    let mut quantity = (request.risk_dollars / request.stop_distance).floor() as i64;

    if quantity as f64 * request.price > request.max_notional {
        quantity = (request.max_notional / request.price).floor() as i64;
    }

    if quantity > 0 {
        Some(quantity)
    } else {
        None
    }
}
