use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use linebook_protocol::{FilterChoices, LineRecord, LineView, PoolKind, Role};
use serde_json::Value;

use crate::error::LineBookError;
use crate::storage::{write_json, KvStore, KEY_CARRIERS, KEY_MOBILE_LINES, KEY_PEOPLE};

use super::migration::{count_missing_flags, migrate, MigrationReport};
use super::phone::validate_phone_number;
use super::pool::{dedup_pool, load_pool, sorted_options};
use super::view::{self, ViewRequest};

/// The resident record store.
///
/// Owns the line records and both option pools. Every mutation is written
/// through to the backing [`KvStore`] before the method returns.
pub struct LineBook {
    store: Arc<dyn KvStore>,
    lines: Vec<LineRecord>,
    carriers: Vec<String>,
    people: Vec<String>,
    last_issued_id: u64,
}

impl LineBook {
    /// Load state from `store`, applying the legacy migration.
    ///
    /// Never fails: unreadable or undecodable keys load as empty.
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        Self::load_with_report(store).0
    }

    /// Load and also return what the migration step did.
    pub fn load_with_report(store: Arc<dyn KvStore>) -> (Self, MigrationReport) {
        let loaded = load_lines(store.as_ref());
        let mut carriers = load_pool(store.as_ref(), KEY_CARRIERS);
        let mut people = load_pool(store.as_ref(), KEY_PEOPLE);

        let intact = loaded.intact.then_some(loaded.lines.as_slice());
        let report = migrate(store.as_ref(), &mut people, intact, loaded.flags_missing);
        let lines = loaded.lines;
        dedup_pool(&mut carriers);
        dedup_pool(&mut people);

        tracing::info!(
            lines = lines.len(),
            carriers = carriers.len(),
            people = people.len(),
            migrated = !report.is_noop(),
            "line book loaded"
        );

        let book = Self {
            store,
            lines,
            carriers,
            people,
            last_issued_id: 0,
        };
        (book, report)
    }

    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LineRecord> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn carriers(&self) -> &[String] {
        &self.carriers
    }

    pub fn people(&self) -> &[String] {
        &self.people
    }

    /// Raw pool contents backing `role`.
    pub fn pool(&self, role: Role) -> &[String] {
        match role.pool() {
            PoolKind::Carriers => &self.carriers,
            PoolKind::People => &self.people,
        }
    }

    /// Pool contents for a selection list: unique and sorted.
    pub fn pool_options(&self, role: Role) -> Vec<String> {
        sorted_options(self.pool(role))
    }

    /// Replace the record with a matching id, or insert it under a new id.
    ///
    /// Returns the id the record is stored under.
    pub fn add_or_update(&mut self, mut record: LineRecord) -> Result<String, LineBookError> {
        let existing = if record.is_new() {
            None
        } else {
            self.lines.iter().position(|line| line.id == record.id)
        };

        let id = match existing {
            Some(index) => {
                let id = record.id.clone();
                self.lines[index] = record;
                tracing::info!(%id, "line updated");
                id
            }
            None => {
                let id = self.next_id();
                record.id = id.clone();
                self.lines.push(record);
                tracing::info!(%id, "line added");
                id
            }
        };

        self.persist_lines()?;
        Ok(id)
    }

    /// Remove a record. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool, LineBookError> {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        if self.lines.len() == before {
            return Ok(false);
        }
        tracing::info!(%id, "line deleted");
        self.persist_lines()?;
        Ok(true)
    }

    /// Flip the bullet flag. Returns the new value, or `None` if absent.
    pub fn toggle_flag(&mut self, id: &str) -> Result<Option<bool>, LineBookError> {
        let Some(line) = self.lines.iter_mut().find(|line| line.id == id) else {
            return Ok(None);
        };
        line.has_bullet = !line.has_bullet;
        let flagged = line.has_bullet;
        tracing::debug!(%id, flagged, "line flag toggled");
        self.persist_lines()?;
        Ok(Some(flagged))
    }

    /// Copy of a record with the id cleared, to seed a new entry.
    pub fn duplicate(&self, id: &str) -> Option<LineRecord> {
        self.get(id).map(|line| LineRecord {
            id: String::new(),
            ..line.clone()
        })
    }

    /// Add `value` to the pool for `role` if it is missing.
    ///
    /// Returns whether the pool changed.
    pub fn ensure_pool_membership(&mut self, role: Role, value: &str) -> Result<bool, LineBookError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(false);
        }
        let kind = role.pool();
        let pool = self.pool_mut(kind);
        if pool.iter().any(|existing| existing == value) {
            return Ok(false);
        }
        pool.push(value.to_string());
        dedup_pool(pool);
        tracing::debug!(%role, %value, "pool entry added");
        self.persist_pool(kind)?;
        Ok(true)
    }

    /// Remove `value` from the pool for `role`.
    ///
    /// Records that still reference the value keep it.
    pub fn delete_from_pool(&mut self, role: Role, value: &str) -> Result<bool, LineBookError> {
        let value = value.trim();
        let kind = role.pool();
        let pool = self.pool_mut(kind);
        let before = pool.len();
        pool.retain(|existing| existing.trim() != value);
        if pool.len() == before {
            return Ok(false);
        }
        dedup_pool(pool);
        tracing::debug!(%role, %value, "pool entry deleted");
        self.persist_pool(kind)?;
        Ok(true)
    }

    /// Make sure every non-empty carrier/owner/user on `record` is present in
    /// its pool, so an edit or duplicate form can select it.
    pub fn seed_for_edit(&mut self, record: &LineRecord) -> Result<(), LineBookError> {
        for role in Role::ALL {
            self.ensure_pool_membership(role, record.role_value(role))?;
        }
        Ok(())
    }

    /// The form-submit command.
    ///
    /// Validates the phone number, repairs pool membership, refreshes the
    /// cached cancellation date and stores the record. A validation failure
    /// leaves the book untouched.
    pub fn submit(&mut self, mut form: LineRecord) -> Result<String, LineBookError> {
        form.phone_number = form.phone_number.trim().to_string();
        validate_phone_number(&form.phone_number)?;

        form.carrier = form.carrier.trim().to_string();
        form.owner = form.owner.trim().to_string();
        form.user = form.user.trim().to_string();
        form.notes = form.notes.trim().to_string();
        form.cancellation_date = view::cancellation_date(&form)
            .map(view::format_display_date)
            .unwrap_or_default();

        self.seed_for_edit(&form)?;
        self.add_or_update(form)
    }

    /// Filtered, sorted projection with derived fields.
    pub fn view(&self, request: &ViewRequest, today: NaiveDate) -> Vec<LineView> {
        view::build_view(&self.lines, request, today)
    }

    pub fn filter_choices(&self) -> FilterChoices {
        view::filter_choices(&self.lines)
    }

    fn pool_mut(&mut self, kind: PoolKind) -> &mut Vec<String> {
        match kind {
            PoolKind::Carriers => &mut self.carriers,
            PoolKind::People => &mut self.people,
        }
    }

    /// Time-based token, strictly increasing within this book and never
    /// colliding with an existing id.
    fn next_id(&mut self) -> String {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let mut candidate = now.max(self.last_issued_id + 1);
        while self.lines.iter().any(|line| line.id == candidate.to_string()) {
            candidate += 1;
        }
        self.last_issued_id = candidate;
        candidate.to_string()
    }

    fn persist_lines(&self) -> Result<(), LineBookError> {
        self.persist(KEY_MOBILE_LINES, self.lines.as_slice())
    }

    fn persist_pool(&self, kind: PoolKind) -> Result<(), LineBookError> {
        match kind {
            PoolKind::Carriers => self.persist(KEY_CARRIERS, self.carriers.as_slice()),
            PoolKind::People => self.persist(KEY_PEOPLE, self.people.as_slice()),
        }
    }

    fn persist<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), LineBookError> {
        write_json(self.store.as_ref(), key, value).map_err(|e| {
            tracing::warn!(%key, "failed to persist: {e}");
            LineBookError::Storage(e)
        })
    }
}

struct StoredLines {
    lines: Vec<LineRecord>,
    /// Records whose stored form lacked `hasBullet`.
    flags_missing: usize,
    /// False when the key was unreadable or an element was dropped, so
    /// writing `lines` back would lose data.
    intact: bool,
}

/// Decode stored lines element by element.
fn load_lines(store: &dyn KvStore) -> StoredLines {
    let raw = match store.get(KEY_MOBILE_LINES) {
        Ok(None) => None,
        Ok(Some(text)) => match serde_json::from_str::<Vec<Value>>(&text) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!(key = KEY_MOBILE_LINES, "failed to decode stored lines: {e}");
                return StoredLines::unreadable();
            }
        },
        Err(e) => {
            tracing::warn!(key = KEY_MOBILE_LINES, "failed to read stored lines: {e}");
            return StoredLines::unreadable();
        }
    };
    let raw = raw.unwrap_or_default();

    let flags_missing = count_missing_flags(&raw);
    let total = raw.len();
    let lines: Vec<LineRecord> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(line) => Some(line),
            Err(e) => {
                tracing::warn!(key = KEY_MOBILE_LINES, index, "skipping undecodable line: {e}");
                None
            }
        })
        .collect();
    let intact = lines.len() == total;
    StoredLines {
        lines,
        flags_missing,
        intact,
    }
}

impl StoredLines {
    fn unreadable() -> Self {
        Self {
            lines: Vec::new(),
            flags_missing: 0,
            intact: false,
        }
    }
}
