use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::Row;
use crate::source::Table;

#[derive(Debug, Clone)]
struct CachedTable {
    rows: Vec<Row>,
    fetched_at: Instant,
}

/// Fetched tables kept for a bounded time window.
///
/// Starts empty; entries expire after `ttl`; `invalidate_all` drops
/// everything so the next render cycle fetches again.
#[derive(Debug)]
pub struct TableCache {
    ttl: Duration,
    entries: HashMap<Table, CachedTable>,
}

impl TableCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Rows for `table` if they were fetched less than `ttl` before `now`.
    pub fn get(&self, table: Table, now: Instant) -> Option<&[Row]> {
        self.entries
            .get(&table)
            .filter(|entry| now.saturating_duration_since(entry.fetched_at) < self.ttl)
            .map(|entry| entry.rows.as_slice())
    }

    pub fn insert(&mut self, table: Table, rows: Vec<Row>, fetched_at: Instant) {
        self.entries.insert(table, CachedTable { rows, fetched_at });
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Row> {
        vec![json!({"Reclutador": "Ana", "Firmaron": 2})
            .as_object()
            .cloned()
            .unwrap_or_default()]
    }

    #[test]
    fn starts_empty() {
        let cache = TableCache::new(Duration::from_secs(300));
        assert!(cache.is_empty());
        assert!(cache.get(Table::DailyMetrics, Instant::now()).is_none());
    }

    #[test]
    fn serves_fresh_entries_and_expires_stale_ones() {
        let mut cache = TableCache::new(Duration::from_secs(300));
        let fetched_at = Instant::now();
        cache.insert(Table::DailyMetrics, rows(), fetched_at);

        let fresh = cache.get(Table::DailyMetrics, fetched_at + Duration::from_secs(299));
        assert_eq!(fresh.map(<[Row]>::len), Some(1));
        assert!(cache.get(Table::WeeklyGoals, fetched_at).is_none());
        assert!(cache
            .get(Table::DailyMetrics, fetched_at + Duration::from_secs(300))
            .is_none());
    }

    #[test]
    fn invalidate_all_clears_every_table() {
        let mut cache = TableCache::new(Duration::from_secs(300));
        let now = Instant::now();
        cache.insert(Table::DailyMetrics, rows(), now);
        cache.insert(Table::WorkingDays, rows(), now);
        assert_eq!(cache.len(), 2);

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert!(cache.get(Table::DailyMetrics, now).is_none());
    }
}
