use std::collections::HashSet;

use serde_json::Value;

use crate::storage::{read_json, KvStore};

/// Drop blank and repeated entries, keeping the first occurrence.
pub fn dedup_pool(pool: &mut Vec<String>) {
    let mut seen = HashSet::new();
    pool.retain(|value| !value.trim().is_empty() && seen.insert(value.clone()));
}

/// Read a stored pool, keeping its string entries.
///
/// Other element types are skipped so one odd entry does not empty the pool.
pub fn load_pool(store: &dyn KvStore, key: &str) -> Vec<String> {
    let raw: Vec<Value> = read_json(store, key).unwrap_or_default();
    let total = raw.len();
    let pool: Vec<String> = raw
        .into_iter()
        .filter_map(|value| match value {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect();
    if pool.len() < total {
        tracing::warn!(%key, skipped = total - pool.len(), "ignored non-string pool entries");
    }
    pool
}

/// Pool contents as presented in a selection list.
pub fn sorted_options(pool: &[String]) -> Vec<String> {
    let mut options = pool.to_vec();
    dedup_pool(&mut options);
    options.sort();
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn pool(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut values = pool(&["au", "Rakuten", "au", " ", "SoftBank", "Rakuten"]);
        dedup_pool(&mut values);
        assert_eq!(values, pool(&["au", "Rakuten", "SoftBank"]));
    }

    #[test]
    fn options_are_sorted() {
        assert_eq!(
            sorted_options(&pool(&["Sato", "Ito", "Sato"])),
            pool(&["Ito", "Sato"])
        );
    }

    #[test]
    fn load_keeps_strings_from_mixed_pool() {
        let store = MemoryStore::with_entries([
            ("carriers", r#"["au", null, 3, "Rakuten", {"name":"x"}]"#),
            ("people", r#"{"Sato":true}"#),
        ]);
        assert_eq!(load_pool(&store, "carriers"), pool(&["au", "Rakuten"]));
        assert!(load_pool(&store, "people").is_empty());
        assert!(load_pool(&store, "missing").is_empty());
    }
}
