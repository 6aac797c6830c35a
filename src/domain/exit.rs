//! Exit policy: ordered evaluation of exit conditions.
//!
//! When several exit conditions are true on the same bar, exactly one
//! liquidation request goes out. Evaluation order is fixed: stop-loss,
//! then take-profit, then time-stop. The intraday end-of-session flatten
//! is handled separately by the engine before any rule logic runs.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TimeStop,
    EndOfSession,
}

impl ExitReason {
    /// Tag passed to the broker's liquidate call.
    pub fn label(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "Stop Loss",
            ExitReason::TakeProfit => "Take Profit",
            ExitReason::TimeStop => "Time Stop",
            ExitReason::EndOfSession => "End Of Session",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Price levels and horizons for an open position. `None` disables a
/// condition. Levels are interpreted relative to the position direction:
/// a long exits below its stop and at or above its target, a short
/// mirrors both.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitLevels {
    pub stop: Option<f64>,
    pub target: Option<f64>,
    pub time_stop_days: Option<i64>,
}

/// First true condition wins; later ones are not evaluated.
pub fn evaluate_exit(
    levels: &ExitLevels,
    price: f64,
    is_long: bool,
    days_in_trade: i64,
) -> Option<ExitReason> {
    if let Some(stop) = levels.stop {
        let hit = if is_long { price < stop } else { price > stop };
        if hit {
            return Some(ExitReason::StopLoss);
        }
    }

    if let Some(target) = levels.target {
        let hit = if is_long {
            price >= target
        } else {
            price <= target
        };
        if hit {
            return Some(ExitReason::TakeProfit);
        }
    }

    if let Some(horizon) = levels.time_stop_days {
        if days_in_trade >= horizon {
            return Some(ExitReason::TimeStop);
        }
    }

    None
}
