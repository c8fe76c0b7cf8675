//! Session state
//!
//! A [`Session`] holds the loaded table and the filter parameters for one
//! user. It is only changed through its mutator methods, each of which keeps
//! the parameters consistent with the current table. [`SessionStore`] keeps
//! many isolated sessions for the HTTP server.

use crate::dashboard::{render, resolve_city, Dashboard};
use crate::error::{DashError, DashResult};
use crate::filter::{normalize_selection, parse_threshold, FilterParams};
use crate::ingest;
use crate::types::{Table, CITY_COLUMN};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// Result of an upload attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Nothing was uploaded; state is unchanged
    NoFile,
    /// Same bytes as the table already loaded; nothing re-parsed
    Unchanged,
    Loaded { rows: usize, columns: usize },
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Last time the session was looked up; drives idle expiry in the store
    pub last_active: DateTime<Utc>,
    table: Option<Table>,
    params: FilterParams,
    source_digest: Option<u64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_active: now,
            table: None,
            params: FilterParams::default(),
            source_digest: None,
        }
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    fn require_table(&self) -> DashResult<&Table> {
        self.table.as_ref().ok_or(DashError::NoTable)
    }

    /// Distinct cities of the loaded table, first-appearance order
    pub fn cities(&self) -> Vec<String> {
        self.table
            .as_ref()
            .map(|t| t.distinct_texts(CITY_COLUMN))
            .unwrap_or_default()
    }

    /// Ingest uploaded workbook bytes.
    ///
    /// An absent or empty upload is [`UploadOutcome::NoFile`]. A failed load
    /// leaves the session exactly as it was.
    pub fn upload(&mut self, upload: Option<&[u8]>) -> DashResult<UploadOutcome> {
        let Some(bytes) = upload.filter(|b| !b.is_empty()) else {
            return Ok(UploadOutcome::NoFile);
        };

        let digest = upload_digest(bytes);
        if self.is_current(digest) {
            return Ok(UploadOutcome::Unchanged);
        }

        let table = ingest::load_bytes(bytes)?;
        Ok(self.install_upload(table, digest))
    }

    /// Whether the loaded table came from bytes with this digest
    pub fn is_current(&self, digest: u64) -> bool {
        let current = self.table.is_some() && self.source_digest == Some(digest);
        if current {
            debug!(session = %self.id, "upload unchanged, keeping table");
        }
        current
    }

    /// Swap in a table parsed from uploaded bytes with the given digest
    pub fn install_upload(&mut self, table: Table, digest: u64) -> UploadOutcome {
        let outcome = UploadOutcome::Loaded {
            rows: table.row_count(),
            columns: table.column_count(),
        };
        self.replace_table(table);
        self.source_digest = Some(digest);
        outcome
    }

    /// Replace the table wholesale, then drop selected columns the new table
    /// lacks and fall back to its first city if the selection is gone.
    pub fn replace_table(&mut self, table: Table) {
        self.params
            .selected_columns
            .retain(|name| table.has_column(name));

        let cities = table.distinct_texts(CITY_COLUMN);
        self.params.selected_city = resolve_city(&cities, self.params.selected_city.as_deref());

        info!(
            session = %self.id,
            rows = table.row_count(),
            city = ?self.params.selected_city,
            "table replaced"
        );
        self.table = Some(table);
        self.source_digest = None;
    }

    pub fn select_columns(&mut self, columns: &[String]) -> DashResult<()> {
        let selection = normalize_selection(self.require_table()?, columns)?;
        self.params.selected_columns = selection;
        Ok(())
    }

    /// Store the threshold text. The text is kept even when it is not a
    /// number, so the user sees what they typed; filtering keeps using the
    /// last valid value until it is corrected.
    pub fn set_threshold(&mut self, text: &str) -> DashResult<f64> {
        self.params.threshold_text = text.to_string();
        let value = parse_threshold(text)?;
        self.params.last_valid_threshold = Some(value);
        Ok(value)
    }

    pub fn select_city(&mut self, city: &str) -> DashResult<()> {
        if !self.cities().iter().any(|c| c == city) {
            return Err(DashError::UnknownCity(city.to_string()));
        }
        self.params.selected_city = Some(city.to_string());
        Ok(())
    }

    pub fn render(&self) -> DashResult<Dashboard> {
        render(self.require_table()?, &self.params)
    }

    pub fn export_csv(&self) -> DashResult<Vec<u8>> {
        self.render()?.export_csv()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            created_at: self.created_at,
            last_active: self.last_active,
            has_table: self.table.is_some(),
            rows: self.table.as_ref().map_or(0, Table::row_count),
            columns: self
                .table
                .as_ref()
                .map(Table::column_names)
                .unwrap_or_default(),
            cities: self.cities(),
            params: self.params.clone(),
        }
    }
}

/// Serializable snapshot of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub has_table: bool,
    pub rows: usize,
    pub columns: Vec<String>,
    pub cities: Vec<String>,
    pub params: FilterParams,
}

/// Digest identifying uploaded bytes for the unchanged-upload check
pub fn upload_digest(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Idle minutes after which a session is dropped, unless configured
pub const DEFAULT_IDLE_TTL_MINUTES: u64 = 30;

/// Upper bound on the configurable idle time (one year)
const MAX_IDLE_TTL_MINUTES: u64 = 60 * 24 * 365;

/// Isolated sessions keyed by id.
///
/// A session not looked up for longer than the idle TTL is removed the next
/// time the store is touched.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl_minutes(DEFAULT_IDLE_TTL_MINUTES)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl_minutes(minutes: u64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl: Duration::minutes(minutes.min(MAX_IDLE_TTL_MINUTES) as i64),
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        // Mutators validate before writing, so a poisoned map is still consistent
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lock the map with expired sessions already removed
    fn lock_live(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        let mut sessions = self.lock();
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, session| now - session.last_active < self.idle_ttl);

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "expired sessions removed");
        }
        sessions
    }

    pub fn create(&self) -> SessionSummary {
        let session = Session::new();
        let summary = session.summary();
        self.lock_live().insert(session.id, session);
        info!(session = %summary.id, "session created");
        summary
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.lock_live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against one session
    pub fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&Session) -> DashResult<R>,
    ) -> DashResult<R> {
        self.with_session_mut(id, |session| f(session))
    }

    /// Run `f` against one session with mutable access. The lookup counts as
    /// activity for idle expiry.
    pub fn with_session_mut<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> DashResult<R>,
    ) -> DashResult<R> {
        let mut sessions = self.lock_live();
        let session = sessions
            .get_mut(&id)
            .ok_or(DashError::SessionNotFound(id))?;
        session.last_active = Utc::now();
        f(session)
    }
}
