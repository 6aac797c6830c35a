//! Indicator capability traits.
//!
//! Indicator math lives in the host. The engine sees each indicator output
//! as an opaque gauge: a readiness flag and a current value. Multi-output
//! indicators (ADX with its directional lines, Bollinger bands) are exposed
//! as one gauge per output.

use std::fmt;

/// A single externally computed indicator output.
pub trait Gauge {
    /// True once the indicator has enough history behind it.
    fn is_ready(&self) -> bool;

    /// Current value. Only meaningful when `is_ready()` is true.
    fn value(&self) -> f64;
}

/// Indicator identity + parameters, used to request gauges from the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GaugeKind {
    Sma(usize),
    Ema(usize),
    Atr(usize),
    /// Trend strength (the smoothed DX line).
    Adx(usize),
    PlusDi(usize),
    MinusDi(usize),
    BollingerUpper {
        period: usize,
        stddev_mult_x100: u32,
    },
    BollingerMiddle {
        period: usize,
        stddev_mult_x100: u32,
    },
    BollingerLower {
        period: usize,
        stddev_mult_x100: u32,
    },
    /// Connors RSI (momentum period, streak period, rank period).
    Crsi {
        rsi: usize,
        streak: usize,
        rank: usize,
    },
}

impl fmt::Display for GaugeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GaugeKind::Sma(period) => write!(f, "SMA({})", period),
            GaugeKind::Ema(period) => write!(f, "EMA({})", period),
            GaugeKind::Atr(period) => write!(f, "ATR({})", period),
            GaugeKind::Adx(period) => write!(f, "ADX({})", period),
            GaugeKind::PlusDi(period) => write!(f, "+DI({})", period),
            GaugeKind::MinusDi(period) => write!(f, "-DI({})", period),
            GaugeKind::BollingerUpper {
                period,
                stddev_mult_x100,
            } => write!(f, "BB_UPPER({},{})", period, *stddev_mult_x100 as f64 / 100.0),
            GaugeKind::BollingerMiddle {
                period,
                stddev_mult_x100,
            } => write!(f, "BB_MID({},{})", period, *stddev_mult_x100 as f64 / 100.0),
            GaugeKind::BollingerLower {
                period,
                stddev_mult_x100,
            } => write!(f, "BB_LOWER({},{})", period, *stddev_mult_x100 as f64 / 100.0),
            GaugeKind::Crsi { rsi, streak, rank } => {
                write!(f, "CRSI({},{},{})", rsi, streak, rank)
            }
        }
    }
}

/// Host-side factory for per-symbol gauges.
pub trait IndicatorHost {
    fn gauge(&self, symbol: &str, kind: &GaugeKind) -> Box<dyn Gauge>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_simple_kinds() {
        assert_eq!(GaugeKind::Sma(200).to_string(), "SMA(200)");
        assert_eq!(GaugeKind::Ema(20).to_string(), "EMA(20)");
        assert_eq!(GaugeKind::Atr(14).to_string(), "ATR(14)");
        assert_eq!(GaugeKind::PlusDi(14).to_string(), "+DI(14)");
    }

    #[test]
    fn display_bollinger() {
        let lower = GaugeKind::BollingerLower {
            period: 20,
            stddev_mult_x100: 200,
        };
        assert_eq!(lower.to_string(), "BB_LOWER(20,2)");
    }

    #[test]
    fn display_crsi() {
        let crsi = GaugeKind::Crsi {
            rsi: 3,
            streak: 2,
            rank: 100,
        };
        assert_eq!(crsi.to_string(), "CRSI(3,2,100)");
    }

    #[test]
    fn gauge_kind_hash_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(GaugeKind::Sma(50), "fast");
        map.insert(GaugeKind::Sma(200), "slow");

        assert_eq!(map.get(&GaugeKind::Sma(50)), Some(&"fast"));
        assert_eq!(map.get(&GaugeKind::Sma(200)), Some(&"slow"));
        assert_eq!(map.get(&GaugeKind::Sma(5)), None);
    }
}
