//! Structured read-through cache for normalized records.
//!
//! Payloads are opaque JSON blobs keyed by source id + entity id, each with
//! a `complete` flag. A payload that fails to deserialize is treated as a
//! cache miss, never as an error: the pipeline simply re-resolves from the
//! source and the next write supersedes the bad row (last-writer-wins).

use std::path::Path;

use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

use crate::records::{GcdIssue, GcdSeries};

const CACHE_DB_FILE_NAME: &str = "gcd_cache.db";

pub struct CacheManager {
    conn: Connection,
}

impl CacheManager {
    pub fn new(cache_dir: &Path) -> Result<Self, rusqlite::Error> {
        if !cache_dir.exists() {
            if let Err(error) = std::fs::create_dir_all(cache_dir) {
                warn!("Could not create cache directory {}: {error}", cache_dir.display());
            }
        }
        let conn = Connection::open(cache_dir.join(CACHE_DB_FILE_NAME))?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, rusqlite::Error> {
        let cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS series (
                source TEXT NOT NULL,
                id INTEGER NOT NULL,
                data BLOB NOT NULL,
                complete INTEGER NOT NULL,
                PRIMARY KEY(source, id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS issues (
                source TEXT NOT NULL,
                id INTEGER NOT NULL,
                series_id INTEGER NOT NULL,
                data BLOB NOT NULL,
                complete INTEGER NOT NULL,
                PRIMARY KEY(source, id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS series_search (
                source TEXT NOT NULL,
                query TEXT NOT NULL,
                series_id INTEGER NOT NULL,
                data BLOB NOT NULL,
                PRIMARY KEY(source, query, series_id)
            )",
            [],
        )?;
        Ok(())
    }

    /// Raw payload lookup; `None` on absence or read failure.
    pub fn series_payload(&self, source: &str, series_id: i64) -> Option<(Vec<u8>, bool)> {
        self.payload("SELECT data, complete FROM series WHERE source = ?1 AND id = ?2", source, series_id)
    }

    pub fn issue_payload(&self, source: &str, issue_id: i64) -> Option<(Vec<u8>, bool)> {
        self.payload("SELECT data, complete FROM issues WHERE source = ?1 AND id = ?2", source, issue_id)
    }

    fn payload(&self, sql: &str, source: &str, entity_id: i64) -> Option<(Vec<u8>, bool)> {
        let result = self
            .conn
            .query_row(sql, params![source, entity_id], |row| {
                Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, bool>(1)?))
            })
            .optional();
        match result {
            Ok(found) => found,
            Err(error) => {
                warn!("Cache read failed for {source}/{entity_id}: {error}");
                None
            }
        }
    }

    pub fn store_series_payload(
        &self,
        source: &str,
        series_id: i64,
        payload: &[u8],
        complete: bool,
    ) {
        let result = self.conn.execute(
            "INSERT OR REPLACE INTO series (source, id, data, complete) VALUES (?1, ?2, ?3, ?4)",
            params![source, series_id, payload, complete],
        );
        if let Err(error) = result {
            warn!("Cache write failed for series {source}/{series_id}: {error}");
        }
    }

    pub fn store_issue_payload(
        &self,
        source: &str,
        issue_id: i64,
        series_id: i64,
        payload: &[u8],
        complete: bool,
    ) {
        let result = self.conn.execute(
            "INSERT OR REPLACE INTO issues (source, id, series_id, data, complete) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![source, issue_id, series_id, payload, complete],
        );
        if let Err(error) = result {
            warn!("Cache write failed for issue {source}/{issue_id}: {error}");
        }
    }

    /// Cached series record with its complete flag. Malformed payloads
    /// decode to `None` (miss).
    pub fn series(&self, source: &str, series_id: i64) -> Option<(GcdSeries, bool)> {
        let (payload, complete) = self.series_payload(source, series_id)?;
        match serde_json::from_slice(&payload) {
            Ok(series) => Some((series, complete)),
            Err(error) => {
                warn!("Discarding malformed cached series {source}/{series_id}: {error}");
                None
            }
        }
    }

    pub fn store_series(&self, source: &str, series: &GcdSeries, complete: bool) {
        match serde_json::to_vec(series) {
            Ok(payload) => self.store_series_payload(source, series.id, &payload, complete),
            Err(error) => warn!("Could not encode series {}: {error}", series.id),
        }
    }

    /// Cached single issue with its complete flag; malformed payload is a miss.
    pub fn issue(&self, source: &str, issue_id: i64) -> Option<(GcdIssue, bool)> {
        let (payload, complete) = self.issue_payload(source, issue_id)?;
        match serde_json::from_slice(&payload) {
            Ok(issue) => Some((issue, complete)),
            Err(error) => {
                warn!("Discarding malformed cached issue {source}/{issue_id}: {error}");
                None
            }
        }
    }

    /// Every cached issue of a series, skipping malformed entries. The
    /// caller gates usability on the entry count, so a skipped entry makes
    /// the whole collection count as stale.
    pub fn series_issues(&self, source: &str, series_id: i64) -> Vec<GcdIssue> {
        let mut stmt = match self
            .conn
            .prepare("SELECT data FROM issues WHERE source = ?1 AND series_id = ?2 ORDER BY id")
        {
            Ok(stmt) => stmt,
            Err(error) => {
                warn!("Cache read failed for series issues {source}/{series_id}: {error}");
                return Vec::new();
            }
        };
        let rows = match stmt.query_map(params![source, series_id], |row| row.get::<_, Vec<u8>>(0))
        {
            Ok(rows) => rows,
            Err(error) => {
                warn!("Cache read failed for series issues {source}/{series_id}: {error}");
                return Vec::new();
            }
        };

        let mut issues = Vec::new();
        for row in rows {
            let payload = match row {
                Ok(payload) => payload,
                Err(error) => {
                    warn!("Cache row read failed for series {source}/{series_id}: {error}");
                    continue;
                }
            };
            match serde_json::from_slice::<GcdIssue>(&payload) {
                Ok(issue) => issues.push(issue),
                Err(error) => {
                    warn!("Discarding malformed cached issue in series {series_id}: {error}")
                }
            }
        }
        issues
    }

    pub fn store_issues(&self, source: &str, issues: &[GcdIssue], complete: bool) {
        for issue in issues {
            match serde_json::to_vec(issue) {
                Ok(payload) => {
                    self.store_issue_payload(source, issue.id, issue.series_id, &payload, complete)
                }
                Err(error) => warn!("Could not encode issue {}: {error}", issue.id),
            }
        }
    }

    pub fn search_results(&self, source: &str, query: &str) -> Vec<GcdSeries> {
        let mut stmt = match self.conn.prepare(
            "SELECT data FROM series_search WHERE source = ?1 AND query = ?2 ORDER BY series_id",
        ) {
            Ok(stmt) => stmt,
            Err(error) => {
                warn!("Cache read failed for search '{query}': {error}");
                return Vec::new();
            }
        };
        let rows = match stmt.query_map(params![source, query], |row| row.get::<_, Vec<u8>>(0)) {
            Ok(rows) => rows,
            Err(error) => {
                warn!("Cache read failed for search '{query}': {error}");
                return Vec::new();
            }
        };

        let mut results = Vec::new();
        for row in rows {
            let payload = match row {
                Ok(payload) => payload,
                Err(_) => continue,
            };
            match serde_json::from_slice::<GcdSeries>(&payload) {
                Ok(series) => results.push(series),
                Err(error) => warn!("Discarding malformed cached search result: {error}"),
            }
        }
        results
    }

    pub fn store_search_results(&self, source: &str, query: &str, results: &[GcdSeries]) {
        for series in results {
            let payload = match serde_json::to_vec(series) {
                Ok(payload) => payload,
                Err(error) => {
                    warn!("Could not encode search result {}: {error}", series.id);
                    continue;
                }
            };
            let result = self.conn.execute(
                "INSERT OR REPLACE INTO series_search (source, query, series_id, data) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![source, query, series.id, payload],
            );
            if let Err(error) = result {
                warn!("Cache write failed for search '{query}': {error}");
            }
        }
    }
}

/// Cache consistency gate: a cached issue list is usable only when its entry
/// count exactly equals the authoritative series issue count. Coarse by
/// design: it catches an obviously incomplete cache, not per-row staleness,
/// and usability is all-or-nothing per series.
pub fn issue_list_is_usable(cached_len: usize, count_of_issues: Option<i64>) -> bool {
    match count_of_issues {
        Some(count) => count == cached_len as i64,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{issue_list_is_usable, CacheManager};
    use crate::records::{GcdIssue, GcdSeries};

    fn sample_series(id: i64) -> GcdSeries {
        GcdSeries {
            id,
            name: "Test Series".to_string(),
            count_of_issues: Some(2),
            ..GcdSeries::default()
        }
    }

    fn sample_issue(id: i64, series_id: i64) -> GcdIssue {
        GcdIssue {
            id,
            series_id,
            number: id.to_string(),
            ..GcdIssue::default()
        }
    }

    #[test]
    fn test_series_round_trip_preserves_complete_flag() {
        let cache = CacheManager::in_memory().expect("cache should open");
        cache.store_series("gcd", &sample_series(12), true);

        let (cached, complete) = cache.series("gcd", 12).expect("series should be cached");
        assert_eq!(cached, sample_series(12));
        assert!(complete);
        assert!(cache.series("gcd", 99).is_none());
    }

    #[test]
    fn test_issue_store_is_last_writer_wins() {
        let cache = CacheManager::in_memory().expect("cache should open");
        cache.store_issues("gcd", &[sample_issue(5, 1)], false);
        let mut updated = sample_issue(5, 1);
        updated.title = "Refreshed".to_string();
        cache.store_issues("gcd", &[updated.clone()], true);

        let (cached, complete) = cache.issue("gcd", 5).expect("issue should be cached");
        assert_eq!(cached, updated);
        assert!(complete);
        assert_eq!(cache.series_issues("gcd", 1).len(), 1);
    }

    #[test]
    fn test_malformed_payload_is_a_miss_not_an_error() {
        let cache = CacheManager::in_memory().expect("cache should open");
        cache.store_series_payload("gcd", 3, b"{not json", true);
        cache.store_issue_payload("gcd", 4, 3, b"\xff\xfe", true);

        assert!(cache.series("gcd", 3).is_none());
        assert!(cache.issue("gcd", 4).is_none());
        // The raw payload is still there; only typed decoding misses.
        assert!(cache.series_payload("gcd", 3).is_some());
    }

    #[test]
    fn test_consistency_gate_requires_exact_count() {
        assert!(issue_list_is_usable(10, Some(10)));
        assert!(!issue_list_is_usable(9, Some(10)));
        assert!(!issue_list_is_usable(11, Some(10)));
        assert!(!issue_list_is_usable(0, None));
        // Zero cached entries and an authoritative zero agree.
        assert!(issue_list_is_usable(0, Some(0)));
    }

    #[test]
    fn test_search_results_round_trip() {
        let cache = CacheManager::in_memory().expect("cache should open");
        let results = vec![sample_series(1), sample_series(2)];
        cache.store_search_results("gcd", "Test%", &results);
        assert_eq!(cache.search_results("gcd", "Test%"), results);
        assert!(cache.search_results("gcd", "Other%").is_empty());
    }
}
