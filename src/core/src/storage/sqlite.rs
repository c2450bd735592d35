use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::KvStore;

/// SQLite-backed key-value store.
///
/// Uses a `Mutex<Connection>` for thread-safe interior mutability.
/// The `kv` table is created on `open()`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a sqlite database at the given path.
    pub fn open(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| format!("sqlite open: {e}"))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory().map_err(|e| format!("sqlite open: {e}"))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), String> {
        let conn = self.conn.lock().map_err(|e| format!("lock: {e}"))?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key    TEXT PRIMARY KEY,
                value  TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| format!("migrate: {e}"))?;

        Ok(())
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let conn = self.conn.lock().map_err(|e| format!("lock: {e}"))?;
        conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| format!("kv get {key}: {e}"))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        let conn = self.conn.lock().map_err(|e| format!("lock: {e}"))?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| format!("kv set {key}: {e}"))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        let conn = self.conn.lock().map_err(|e| format!("lock: {e}"))?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| format!("kv remove {key}: {e}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> SqliteStore {
        SqliteStore::open_memory().unwrap()
    }

    #[test]
    fn set_and_get() {
        let store = make_store();
        store.set("carriers", r#"["au"]"#).unwrap();
        assert_eq!(store.get("carriers").unwrap().as_deref(), Some(r#"["au"]"#));
    }

    #[test]
    fn set_replaces_existing_value() {
        let store = make_store();
        store.set("people", r#"["Sato"]"#).unwrap();
        store.set("people", r#"["Sato","Ito"]"#).unwrap();
        assert_eq!(
            store.get("people").unwrap().as_deref(),
            Some(r#"["Sato","Ito"]"#)
        );
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let store = make_store();
        assert!(store.get("mobileLines").unwrap().is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let store = make_store();
        store.set("owners", "[]").unwrap();
        store.remove("owners").unwrap();
        store.remove("owners").unwrap();
        assert!(store.get("owners").unwrap().is_none());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = std::env::temp_dir().join(format!("linebook-sqlite-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kv.db");
        let _ = std::fs::remove_file(&path);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("carriers", r#"["Rakuten"]"#).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get("carriers").unwrap().as_deref(),
            Some(r#"["Rakuten"]"#)
        );

        drop(store);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
