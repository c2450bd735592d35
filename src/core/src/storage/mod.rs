mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Primary line data.
pub const KEY_MOBILE_LINES: &str = "mobileLines";
/// Carrier option pool.
pub const KEY_CARRIERS: &str = "carriers";
/// Shared owner/user option pool.
pub const KEY_PEOPLE: &str = "people";
/// Legacy owner pool, folded into `people` by migration.
pub const KEY_LEGACY_OWNERS: &str = "owners";
/// Legacy user pool, folded into `people` by migration.
pub const KEY_LEGACY_USERS: &str = "users";

/// Abstract key-value storage for persisted state.
///
/// Values are serialized strings (JSON in practice). All methods use
/// `&self`; implementations handle interior mutability.
pub trait KvStore: Send + Sync + 'static {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), String>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), String>;
}

/// Read and decode the JSON value under `key`.
///
/// Missing keys, read failures and decode failures all yield `None`; the
/// latter two are logged.
pub fn read_json<T: serde::de::DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(%key, "failed to read stored value: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(%key, "failed to decode stored value: {e}");
            None
        }
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn write_json<T: serde::Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value).map_err(|e| format!("encode {key}: {e}"))?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_json_fails_soft() {
        let store = MemoryStore::with_entries([
            (KEY_CARRIERS, r#"["au","Rakuten"]"#),
            (KEY_PEOPLE, "{not json"),
        ]);
        let carriers: Option<Vec<String>> = read_json(&store, KEY_CARRIERS);
        assert_eq!(carriers, Some(vec!["au".to_string(), "Rakuten".to_string()]));

        let people: Option<Vec<String>> = read_json(&store, KEY_PEOPLE);
        assert_eq!(people, None);

        let lines: Option<Vec<String>> = read_json(&store, KEY_MOBILE_LINES);
        assert_eq!(lines, None);
    }

    #[test]
    fn write_json_round_trips() {
        let store = MemoryStore::new();
        write_json(&store, KEY_PEOPLE, &["Sato", "Ito"]).unwrap();
        assert_eq!(
            store.get(KEY_PEOPLE).unwrap().as_deref(),
            Some(r#"["Sato","Ito"]"#)
        );
    }
}
