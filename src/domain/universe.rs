//! Liquidity-ranked universe selection.
//!
//! The host delivers a full-market snapshot once per refresh cycle; the
//! filter picks a bounded top-K subset by dollar volume. Pure function,
//! no state.

/// One instrument in a universe-refresh snapshot.
#[derive(Debug, Clone)]
pub struct InstrumentSnapshot {
    pub symbol: String,
    pub price: f64,
    pub dollar_volume: f64,
    pub has_fundamental_data: bool,
}

#[derive(Debug, Clone)]
pub struct UniverseConfig {
    pub top_k: usize,
    pub min_price: f64,
    pub require_fundamental_data: bool,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        UniverseConfig {
            top_k: 50,
            min_price: 10.0,
            require_fundamental_data: false,
        }
    }
}

/// Select at most `top_k` symbols: filter by minimum price (and the
/// fundamental-data flag when required), then rank by dollar volume
/// descending. The sort is stable, so ties keep their input order.
pub fn select_universe(snapshots: &[InstrumentSnapshot], config: &UniverseConfig) -> Vec<String> {
    let mut selected: Vec<&InstrumentSnapshot> = snapshots
        .iter()
        .filter(|s| s.price > config.min_price)
        .filter(|s| !config.require_fundamental_data || s.has_fundamental_data)
        .collect();

    selected.sort_by(|a, b| {
        b.dollar_volume
            .partial_cmp(&a.dollar_volume)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    selected
        .into_iter()
        .take(config.top_k)
        .map(|s| s.symbol.clone())
        .collect()
}

/// Added/removed diff between two universe selections, preserving the
/// rank order of the new selection for additions.
#[derive(Debug, Clone, Default)]
pub struct SecurityChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SecurityChanges {
    pub fn diff(previous: &[String], current: &[String]) -> Self {
        let added = current
            .iter()
            .filter(|s| !previous.contains(s))
            .cloned()
            .collect();
        let removed = previous
            .iter()
            .filter(|s| !current.contains(s))
            .cloned()
            .collect();
        SecurityChanges { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
