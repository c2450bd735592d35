//! One-time upgrade of the legacy stored layout.
//!
//! Older data kept separate `owners` and `users` pools and predates the
//! `hasBullet` flag. Both are folded into the current layout here, before
//! anything else reads the store.

use linebook_protocol::LineRecord;
use serde_json::Value;

use crate::storage::{
    write_json, KvStore, KEY_LEGACY_OWNERS, KEY_LEGACY_USERS, KEY_MOBILE_LINES, KEY_PEOPLE,
};

use super::pool::{dedup_pool, load_pool};

/// What a migration pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// People added to the shared pool from legacy keys.
    pub people_merged: usize,
    /// Whether legacy keys were present and removed.
    pub legacy_consumed: bool,
    /// Records whose stored form lacked `hasBullet`.
    pub flags_backfilled: usize,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        !self.legacy_consumed && self.flags_backfilled == 0
    }
}

/// Count stored records that have no boolean `hasBullet`.
pub fn count_missing_flags(raw_lines: &[Value]) -> usize {
    raw_lines
        .iter()
        .filter(|line| !matches!(line.get("hasBullet"), Some(Value::Bool(_))))
        .count()
}

/// Apply the migration against `store`.
///
/// `lines` are the already-decoded records (with `hasBullet` defaulted), or
/// `None` when the stored key could not be decoded in full; it is then left
/// untouched. `flags_missing` is how many stored records lacked the flag.
/// Non-string legacy pool entries are skipped. Write failures are logged and
/// do not stop the load.
pub fn migrate(
    store: &dyn KvStore,
    people: &mut Vec<String>,
    lines: Option<&[LineRecord]>,
    flags_missing: usize,
) -> MigrationReport {
    let flags_missing = if lines.is_some() { flags_missing } else { 0 };
    let owners_present = legacy_key_present(store, KEY_LEGACY_OWNERS);
    let users_present = legacy_key_present(store, KEY_LEGACY_USERS);
    let legacy_consumed = owners_present || users_present;
    let mut report = MigrationReport {
        legacy_consumed,
        flags_backfilled: flags_missing,
        ..Default::default()
    };

    if legacy_consumed {
        let owners = load_pool(store, KEY_LEGACY_OWNERS);
        let users = load_pool(store, KEY_LEGACY_USERS);

        let before = people.len();
        people.extend(owners);
        people.extend(users);
        dedup_pool(people);
        report.people_merged = people.len().saturating_sub(before);

        if let Err(e) = write_json(store, KEY_PEOPLE, people.as_slice()) {
            tracing::warn!("failed to persist migrated people pool: {e}");
        }
        for key in [KEY_LEGACY_OWNERS, KEY_LEGACY_USERS] {
            if let Err(e) = store.remove(key) {
                tracing::warn!(%key, "failed to remove legacy key: {e}");
            }
        }
    }

    match lines {
        Some(lines) if legacy_consumed || flags_missing > 0 => {
            if let Err(e) = write_json(store, KEY_MOBILE_LINES, lines) {
                tracing::warn!("failed to persist migrated lines: {e}");
            }
        }
        None if legacy_consumed => {
            tracing::warn!("stored lines not fully decoded; leaving them unmigrated");
        }
        _ => {}
    }

    if !report.is_noop() {
        tracing::info!(
            people_merged = report.people_merged,
            flags_backfilled = report.flags_backfilled,
            legacy_consumed = report.legacy_consumed,
            "migrated legacy line data"
        );
    }
    report
}

fn legacy_key_present(store: &dyn KvStore, key: &str) -> bool {
    match store.get(key) {
        Ok(value) => value.is_some(),
        Err(e) => {
            tracing::warn!(%key, "failed to probe legacy key: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{read_json, MemoryStore};
    use serde_json::json;

    fn stored_people(store: &MemoryStore) -> Vec<String> {
        read_json(store, KEY_PEOPLE).unwrap_or_default()
    }

    #[test]
    fn merges_legacy_pools_and_removes_keys() {
        let store = MemoryStore::with_entries([
            (KEY_LEGACY_OWNERS, r#"["Sato","Ito"]"#),
            (KEY_LEGACY_USERS, r#"["Ito","Kato"]"#),
        ]);
        let mut people = vec!["Sato".to_string()];

        let report = migrate(&store, &mut people, Some(&[]), 0);

        assert_eq!(people, vec!["Sato", "Ito", "Kato"]);
        assert_eq!(report.people_merged, 2);
        assert!(report.legacy_consumed);
        assert_eq!(stored_people(&store), people);
        assert!(store.get(KEY_LEGACY_OWNERS).unwrap().is_none());
        assert!(store.get(KEY_LEGACY_USERS).unwrap().is_none());
    }

    #[test]
    fn second_run_is_noop() {
        let store = MemoryStore::with_entries([(KEY_LEGACY_OWNERS, r#"["Sato"]"#)]);
        let mut people = Vec::new();
        migrate(&store, &mut people, Some(&[]), 0);

        let snapshot = people.clone();
        let report = migrate(&store, &mut people, Some(&[]), 0);
        assert!(report.is_noop());
        assert_eq!(people, snapshot);
    }

    #[test]
    fn malformed_legacy_entries_are_skipped() {
        let store = MemoryStore::with_entries([
            (KEY_LEGACY_OWNERS, "not json"),
            (KEY_LEGACY_USERS, r#"["Ito", null, 5]"#),
        ]);
        let mut people = vec!["Sato".to_string()];

        let report = migrate(&store, &mut people, Some(&[]), 0);

        assert_eq!(people, vec!["Sato", "Ito"]);
        assert_eq!(report.people_merged, 1);
        assert!(store.get(KEY_LEGACY_OWNERS).unwrap().is_none());
        assert!(store.get(KEY_LEGACY_USERS).unwrap().is_none());
    }

    #[test]
    fn backfills_missing_flags() {
        let raw = vec![
            json!({ "id": "1", "hasBullet": true }),
            json!({ "id": "2" }),
            json!({ "id": "3", "hasBullet": null }),
        ];
        assert_eq!(count_missing_flags(&raw), 2);

        let lines: Vec<LineRecord> = serde_json::from_value(json!([
            { "id": "1", "hasBullet": true },
            { "id": "2" },
        ]))
        .unwrap();
        let store = MemoryStore::new();
        let report = migrate(&store, &mut Vec::new(), Some(&lines), 1);

        assert_eq!(report.flags_backfilled, 1);
        let stored: Vec<Value> = read_json(&store, KEY_MOBILE_LINES).unwrap();
        assert_eq!(stored[1]["hasBullet"], json!(false));
        assert_eq!(count_missing_flags(&stored), 0);
    }

    #[test]
    fn undecoded_lines_are_never_rewritten() {
        let original = r#"[{"id":"1"},42]"#;
        let store = MemoryStore::with_entries([
            (KEY_MOBILE_LINES, original),
            (KEY_LEGACY_OWNERS, r#"["Sato"]"#),
        ]);
        let mut people = Vec::new();

        let report = migrate(&store, &mut people, None, 2);

        assert_eq!(people, vec!["Sato"]);
        assert_eq!(report.flags_backfilled, 0);
        assert_eq!(store.get(KEY_MOBILE_LINES).unwrap().as_deref(), Some(original));
    }
}
