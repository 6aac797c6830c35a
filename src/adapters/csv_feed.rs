//! CSV market data and indicator feed.
//!
//! One `SYMBOL.csv` per instrument: `time,open,high,low,close,volume`
//! followed by optional indicator columns, precomputed upstream and named
//! per [`gauge_column`]. The engine never recomputes indicator math; an
//! empty cell simply reads as "not ready yet". `time` accepts
//! `YYYY-MM-DD HH:MM` for intraday data or a bare date for daily bars
//! (stamped at the session close).

use crate::domain::bar::Bar;
use crate::domain::error::RudderError;
use crate::domain::universe::InstrumentSnapshot;
use crate::ports::indicator_port::{Gauge, GaugeKind, IndicatorHost};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Column name an indicator value is expected under.
pub fn gauge_column(kind: &GaugeKind) -> String {
    match kind {
        GaugeKind::Sma(period) => format!("sma_{}", period),
        GaugeKind::Ema(period) => format!("ema_{}", period),
        GaugeKind::Atr(period) => format!("atr_{}", period),
        GaugeKind::Adx(period) => format!("adx_{}", period),
        GaugeKind::PlusDi(period) => format!("plus_di_{}", period),
        GaugeKind::MinusDi(period) => format!("minus_di_{}", period),
        GaugeKind::BollingerUpper {
            period,
            stddev_mult_x100,
        } => format!("bb_upper_{}_{}", period, stddev_mult_x100),
        GaugeKind::BollingerMiddle {
            period,
            stddev_mult_x100,
        } => format!("bb_middle_{}_{}", period, stddev_mult_x100),
        GaugeKind::BollingerLower {
            period,
            stddev_mult_x100,
        } => format!("bb_lower_{}_{}", period, stddev_mult_x100),
        GaugeKind::Crsi { rsi, streak, rank } => format!("crsi_{}_{}_{}", rsi, streak, rank),
    }
}

#[derive(Debug, Clone)]
struct FeedRow {
    time: NaiveDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    dollar_volume: f64,
    has_fundamental_data: bool,
    gauges: HashMap<String, f64>,
}

#[derive(Debug, Default)]
struct FeedStore {
    rows: HashMap<String, Vec<FeedRow>>,
    /// Index of each symbol's row at the current cursor time, if any.
    current: HashMap<String, usize>,
}

#[derive(Debug)]
pub struct CsvFeed {
    store: Rc<RefCell<FeedStore>>,
}

impl CsvFeed {
    pub fn load(dir: &Path) -> Result<Self, RudderError> {
        let entries = fs::read_dir(dir).map_err(|e| RudderError::Feed {
            reason: format!("failed to read directory {}: {}", dir.display(), e),
        })?;

        let mut store = FeedStore::default();
        for entry in entries {
            let entry = entry.map_err(|e| RudderError::Feed {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let symbol = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_uppercase(),
                None => continue,
            };
            let rows = load_rows(&path, &symbol)?;
            if !rows.is_empty() {
                store.rows.insert(symbol, rows);
            }
        }

        if store.rows.is_empty() {
            return Err(RudderError::Feed {
                reason: format!("no CSV data files in {}", dir.display()),
            });
        }

        Ok(CsvFeed {
            store: Rc::new(RefCell::new(store)),
        })
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.store.borrow().rows.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Sorted union of all row timestamps.
    pub fn timeline(&self) -> Vec<NaiveDateTime> {
        let store = self.store.borrow();
        let times: BTreeSet<NaiveDateTime> = store
            .rows
            .values()
            .flat_map(|rows| rows.iter().map(|r| r.time))
            .collect();
        times.into_iter().collect()
    }

    /// Move the feed cursor. Gauges read from the row at exactly this time;
    /// symbols without one report not-ready until the cursor moves again.
    pub fn advance_to(&self, time: NaiveDateTime) {
        let mut store = self.store.borrow_mut();
        let mut current = HashMap::new();
        for (symbol, rows) in &store.rows {
            if let Ok(index) = rows.binary_search_by_key(&time, |r| r.time) {
                current.insert(symbol.clone(), index);
            }
        }
        store.current = current;
    }

    /// Completed bars at exactly this time.
    pub fn bars_at(&self, time: NaiveDateTime) -> HashMap<String, Bar> {
        let store = self.store.borrow();
        let mut bars = HashMap::new();
        for (symbol, rows) in &store.rows {
            if let Ok(index) = rows.binary_search_by_key(&time, |r| r.time) {
                let row = &rows[index];
                bars.insert(
                    symbol.clone(),
                    Bar {
                        symbol: symbol.clone(),
                        time: row.time,
                        open: row.open,
                        high: row.high,
                        low: row.low,
                        close: row.close,
                        volume: row.volume,
                    },
                );
            }
        }
        bars
    }

    /// Universe-refresh snapshot built from the rows at this time.
    pub fn snapshots_at(&self, time: NaiveDateTime) -> Vec<InstrumentSnapshot> {
        let store = self.store.borrow();
        let mut snapshots = Vec::new();
        for (symbol, rows) in &store.rows {
            if let Ok(index) = rows.binary_search_by_key(&time, |r| r.time) {
                let row = &rows[index];
                snapshots.push(InstrumentSnapshot {
                    symbol: symbol.clone(),
                    price: row.close,
                    dollar_volume: row.dollar_volume,
                    has_fundamental_data: row.has_fundamental_data,
                });
            }
        }
        snapshots.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        snapshots
    }

    /// First/last timestamp and row count for a symbol.
    pub fn coverage(&self, symbol: &str) -> Option<(NaiveDateTime, NaiveDateTime, usize)> {
        let store = self.store.borrow();
        let rows = store.rows.get(symbol)?;
        let first = rows.first()?.time;
        let last = rows.last()?.time;
        Some((first, last, rows.len()))
    }
}

impl IndicatorHost for CsvFeed {
    fn gauge(&self, symbol: &str, kind: &GaugeKind) -> Box<dyn Gauge> {
        Box::new(CsvGauge {
            store: Rc::clone(&self.store),
            symbol: symbol.to_string(),
            column: gauge_column(kind),
        })
    }
}

struct CsvGauge {
    store: Rc<RefCell<FeedStore>>,
    symbol: String,
    column: String,
}

impl CsvGauge {
    fn read(&self) -> Option<f64> {
        let store = self.store.borrow();
        let index = *store.current.get(&self.symbol)?;
        let row = store.rows.get(&self.symbol)?.get(index)?;
        row.gauges.get(&self.column).copied()
    }
}

impl Gauge for CsvGauge {
    fn is_ready(&self) -> bool {
        self.read().is_some()
    }

    fn value(&self) -> f64 {
        self.read().unwrap_or(0.0)
    }
}

fn load_rows(path: &Path, symbol: &str) -> Result<Vec<FeedRow>, RudderError> {
    let content = fs::read_to_string(path).map_err(|e| RudderError::Feed {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| RudderError::Feed {
            reason: format!("{}: bad header: {}", path.display(), e),
        })?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let time_idx = column("time")
        .or_else(|| column("date"))
        .ok_or_else(|| RudderError::Feed {
            reason: format!("{}: missing time column", path.display()),
        })?;

    let required = |name: &str| {
        column(name).ok_or_else(|| RudderError::Feed {
            reason: format!("{}: missing {} column", path.display(), name),
        })
    };
    let open_idx = required("open")?;
    let high_idx = required("high")?;
    let low_idx = required("low")?;
    let close_idx = required("close")?;
    let volume_idx = required("volume")?;
    let dollar_volume_idx = column("dollar_volume");
    let fundamentals_idx = column("has_fundamentals");

    let reserved = [
        Some(time_idx),
        Some(open_idx),
        Some(high_idx),
        Some(low_idx),
        Some(close_idx),
        Some(volume_idx),
        dollar_volume_idx,
        fundamentals_idx,
    ];

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| RudderError::Feed {
            reason: format!("{}: CSV parse error: {}", path.display(), e),
        })?;

        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let number = |idx: usize, name: &str| -> Result<f64, RudderError> {
            field(idx).parse().map_err(|_| RudderError::Feed {
                reason: format!(
                    "{}: invalid {} value '{}' for {}",
                    path.display(),
                    name,
                    field(idx),
                    symbol
                ),
            })
        };

        let time = parse_time(field(time_idx)).ok_or_else(|| RudderError::Feed {
            reason: format!("{}: invalid time '{}'", path.display(), field(time_idx)),
        })?;
        let open = number(open_idx, "open")?;
        let high = number(high_idx, "high")?;
        let low = number(low_idx, "low")?;
        let close = number(close_idx, "close")?;
        let volume = number(volume_idx, "volume")? as i64;

        let dollar_volume = match dollar_volume_idx {
            Some(idx) if !field(idx).is_empty() => number(idx, "dollar_volume")?,
            _ => close * volume as f64,
        };
        let has_fundamental_data = match fundamentals_idx {
            Some(idx) => matches!(field(idx), "1" | "true" | "yes"),
            None => true,
        };

        let mut gauges = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if reserved.contains(&Some(idx)) {
                continue;
            }
            let raw = field(idx);
            if raw.is_empty() {
                continue;
            }
            let value: f64 = raw.parse().map_err(|_| RudderError::Feed {
                reason: format!(
                    "{}: invalid {} value '{}' for {}",
                    path.display(),
                    header,
                    raw,
                    symbol
                ),
            })?;
            gauges.insert(header.clone(), value);
        }

        rows.push(FeedRow {
            time,
            open,
            high,
            low,
            close,
            volume,
            dollar_volume,
            has_fundamental_data,
            gauges,
        });
    }

    rows.sort_by_key(|r| r.time);
    Ok(rows)
}

fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(time) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Some(time);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::from_hms_opt(16, 0, 0).unwrap()))
}
