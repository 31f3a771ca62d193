use pronord_core::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Persistent handle -> pronoun-sets mapping, shared between the
/// fetch pipeline (writer) and whatever renders badges (reader).
///
/// Entries keep their insertion position for the lifetime of the
/// row: the sweeper evicts oldest-first (FIFO), and neither reads
/// nor upserts refresh a row's position.
#[derive(Clone)]
pub struct PronounCache {
    inner: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl PronounCache {
    /// Open (or create) the cache database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Cache(format!("Failed to create db directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| Error::Cache(format!("Failed to open pronoun db: {}", e)))?;

        // WAL for concurrent readers
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

        let cache = Self {
            inner: Arc::new(Mutex::new(conn)),
            db_path: db_path.to_path_buf(),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    /// In-memory cache, used by tests and one-shot CLI runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self {
            inner: Arc::new(Mutex::new(conn)),
            db_path: PathBuf::from(":memory:"),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS pronouns (
                seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                handle     TEXT NOT NULL UNIQUE,
                pronouns   TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.inner
            .lock()
            .map_err(|e| Error::Cache(format!("Lock error: {}", e)))
    }

    /// Upsert one handle's pronoun sets, last write wins. An existing
    /// row keeps its insertion position. An empty pronoun list is
    /// rejected: entries only exist for users that matched something.
    pub fn set(&self, handle: &str, pronouns: &[String]) -> Result<()> {
        if pronouns.is_empty() {
            return Err(Error::Cache(format!(
                "refusing to store empty pronoun list for @{}",
                handle
            )));
        }
        let json = serde_json::to_string(pronouns)?;
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO pronouns (handle, pronouns, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(handle) DO UPDATE SET pronouns = excluded.pronouns",
            params![handle, json, now],
        )?;
        Ok(())
    }

    /// Fetch the stored mapping. `None` returns everything; `Some`
    /// returns a map with at most the requested handle.
    pub fn get(&self, handle: Option<&str>) -> Result<HashMap<String, Vec<String>>> {
        let conn = self.lock()?;
        let mut result = HashMap::new();

        match handle {
            Some(h) => {
                let row: Option<String> = conn
                    .query_row(
                        "SELECT pronouns FROM pronouns WHERE handle = ?1",
                        params![h],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(json) = row {
                    result.insert(h.to_string(), parse_pronouns(&json)?);
                }
            }
            None => {
                let mut stmt =
                    conn.prepare("SELECT handle, pronouns FROM pronouns ORDER BY seq")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;
                for row in rows {
                    let (handle, json) = row?;
                    result.insert(handle, parse_pronouns(&json)?);
                }
            }
        }

        Ok(result)
    }

    pub fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pronouns", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM pronouns", [])?;
        Ok(())
    }

    /// Evict oldest entries (by insertion order) until at most
    /// `max_entries` remain. Returns how many rows were removed.
    pub fn sweep(&self, max_entries: usize) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pronouns", [], |row| row.get(0))?;
        let excess = (count as usize).saturating_sub(max_entries);
        if excess == 0 {
            return Ok(0);
        }
        let removed = conn.execute(
            "DELETE FROM pronouns WHERE seq IN
             (SELECT seq FROM pronouns ORDER BY seq ASC LIMIT ?1)",
            params![excess as i64],
        )?;
        debug!(removed, "cache sweep evicted oldest entries");
        Ok(removed)
    }
}

fn parse_pronouns(json: &str) -> Result<Vec<String>> {
    let parsed: Vec<String> = serde_json::from_str(json)?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache() -> PronounCache {
        PronounCache::open_in_memory().unwrap()
    }

    fn sets(sets: &[&str]) -> Vec<String> {
        sets.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_and_get_single() {
        let cache = cache();
        cache.set("alice", &sets(&["they/them"])).unwrap();

        let found = cache.get(Some("alice")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["alice"], sets(&["they/them"]));

        let missing = cache.get(Some("nobody")).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_get_all() {
        let cache = cache();
        cache.set("a", &sets(&["she/her"])).unwrap();
        cache.set("b", &sets(&["he/him", "they/them"])).unwrap();

        let all = cache.get(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["b"], sets(&["he/him", "they/them"]));
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let cache = cache();
        cache.set("a", &sets(&["she/her"])).unwrap();
        cache.set("a", &sets(&["they/them"])).unwrap();

        let all = cache.get(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["a"], sets(&["they/them"]));
    }

    #[test]
    fn test_empty_pronoun_list_rejected() {
        let cache = cache();
        assert!(cache.set("a", &[]).is_err());
        assert_eq!(cache.len().unwrap(), 0);
    }

    #[test]
    fn test_fifo_eviction_exact_counts() {
        let cache = cache();
        for i in 0..6512 {
            cache
                .set(&format!("user{:05}", i), &sets(&["they/them"]))
                .unwrap();
        }
        let removed = cache.sweep(5000).unwrap();
        assert_eq!(removed, 1512);
        assert_eq!(cache.len().unwrap(), 5000);

        let all = cache.get(None).unwrap();
        // Exactly the oldest 1512 are gone.
        assert!(!all.contains_key("user00000"));
        assert!(!all.contains_key("user01511"));
        assert!(all.contains_key("user01512"));
        assert!(all.contains_key("user06511"));
    }

    #[test]
    fn test_sweep_under_ceiling_is_noop() {
        let cache = cache();
        cache.set("a", &sets(&["she/her"])).unwrap();
        assert_eq!(cache.sweep(5000).unwrap(), 0);
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_upsert_keeps_insertion_position() {
        let cache = cache();
        cache.set("old", &sets(&["she/her"])).unwrap();
        cache.set("mid", &sets(&["he/him"])).unwrap();
        cache.set("new", &sets(&["it/its"])).unwrap();
        // Rewriting "old" must not move it to the back of the queue.
        cache.set("old", &sets(&["they/them"])).unwrap();

        cache.sweep(2).unwrap();
        let all = cache.get(None).unwrap();
        assert!(!all.contains_key("old"));
        assert!(all.contains_key("mid"));
        assert!(all.contains_key("new"));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pronouns.db");
        {
            let cache = PronounCache::open(&path).unwrap();
            cache.set("alice", &sets(&["xe/xem"])).unwrap();
        }
        let cache = PronounCache::open(&path).unwrap();
        assert_eq!(cache.get(Some("alice")).unwrap()["alice"], sets(&["xe/xem"]));
    }

    #[test]
    fn test_clear() {
        let cache = cache();
        cache.set("a", &sets(&["she/her"])).unwrap();
        cache.clear().unwrap();
        assert!(cache.is_empty().unwrap());
    }
}
