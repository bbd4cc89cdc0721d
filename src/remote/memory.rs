//! In-process data service.
//!
//! Behaves like the hosted service from the client's point of view:
//! credentials are hashed, sessions are tokens, tables enforce their
//! unique constraints. Faults and latency can be injected for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuthChange, DataService, Identity, Query, RemoteError, Row, SignUpOutcome, Table};
use crate::auth::{hash_password, verify_password};

const EVENT_CAPACITY: usize = 16;

struct StoredUser {
    identity: Identity,
    password_hash: String,
}

#[derive(Default)]
struct Faults {
    sign_out: bool,
    inserts: HashSet<Table>,
    selects: HashSet<Table>,
    offline: bool,
}

#[derive(Default)]
struct State {
    /// Users keyed by lowercased email.
    users: HashMap<String, StoredUser>,
    /// Valid session tokens and their user ids.
    sessions: HashMap<String, Uuid>,
    /// Token held by this client.
    current: Option<String>,
    tables: HashMap<Table, Vec<Row>>,
    /// Sign-up creates the identity without a session.
    confirm_email: bool,
    faults: Faults,
}

impl State {
    fn identity_for(&self, user_id: Uuid) -> Option<Identity> {
        self.users
            .values()
            .find(|u| u.identity.id == user_id)
            .map(|u| u.identity.clone())
    }

    fn current_identity(&self) -> Option<Identity> {
        let token = self.current.as_ref()?;
        let user_id = self.sessions.get(token)?;
        self.identity_for(*user_id)
    }

    fn start_session(&mut self, user_id: Uuid) {
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), user_id);
        if let Some(old) = self.current.replace(token) {
            self.sessions.remove(&old);
        }
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.faults.offline {
            return Err(RemoteError::Service("data service unreachable".to_string()));
        }
        Ok(())
    }
}

struct Inner {
    state: Mutex<State>,
    events: broadcast::Sender<AuthChange>,
    latency: Duration,
}

/// In-process implementation of [`DataService`].
///
/// Clones share the same state, so a test can keep a handle for fault
/// injection while a session store owns another.
#[derive(Clone)]
pub struct MemoryDataService {
    inner: Arc<Inner>,
}

impl Default for MemoryDataService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDataService {
    /// Create an empty service that answers immediately.
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Create an empty service that delays every remote call.
    pub fn with_latency(latency: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                events,
                latency,
            }),
        }
    }

    /// Make the next sign-out fail remotely. The token stays valid on the
    /// service side.
    pub async fn fail_next_sign_out(&self) {
        self.inner.state.lock().await.faults.sign_out = true;
    }

    /// Make every insert into `table` fail with a service error.
    pub async fn fail_inserts_into(&self, table: Table) {
        self.inner.state.lock().await.faults.inserts.insert(table);
    }

    /// Make every select from `table` fail with a service error.
    pub async fn fail_selects_from(&self, table: Table) {
        self.inner.state.lock().await.faults.selects.insert(table);
    }

    /// Hold sessions back on sign-up until the email would be confirmed.
    /// Sign-up then reports [`SignUpOutcome::ConfirmationPending`].
    pub async fn require_email_confirmation(&self, required: bool) {
        self.inner.state.lock().await.confirm_email = required;
    }

    /// Make every remote call fail as if the service were unreachable.
    pub async fn set_offline(&self, offline: bool) {
        self.inner.state.lock().await.faults.offline = offline;
    }

    /// Remove all injected faults.
    pub async fn clear_faults(&self) {
        self.inner.state.lock().await.faults = Faults::default();
    }

    /// Invalidate the client's session on the service side and notify
    /// subscribers, as the hosted service does when a token is revoked.
    pub async fn expire_current_session(&self) {
        {
            let mut state = self.inner.state.lock().await;
            if let Some(token) = state.current.clone() {
                state.sessions.remove(&token);
            }
        }
        info!("Session expired by data service");
        self.emit(AuthChange::SessionExpired);
    }

    /// Snapshot of every row in a table.
    pub async fn rows(&self, table: Table) -> Vec<Row> {
        self.inner
            .state
            .lock()
            .await
            .tables
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of credential identities.
    pub async fn identity_count(&self) -> usize {
        self.inner.state.lock().await.users.len()
    }

    fn emit(&self, change: AuthChange) {
        // No subscribers is fine.
        let _ = self.inner.events.send(change);
    }

    async fn delay(&self) {
        if !self.inner.latency.is_zero() {
            tokio::time::sleep(self.inner.latency).await;
        }
    }
}

/// Build a comparable key from the unique-constraint columns of a row.
fn unique_key(table: Table, row: &Row) -> Option<String> {
    let columns = table.unique_key();
    if columns.is_empty() {
        return None;
    }
    let values: Vec<Value> = columns
        .iter()
        .map(|c| row.get(*c).cloned().unwrap_or(Value::Null))
        .collect();
    Some(Value::Array(values).to_string())
}

/// Check the id and unique-key constraints over a full table.
fn violates_unique(table: Table, rows: &[Row]) -> bool {
    let mut ids = HashSet::new();
    let mut keys = HashSet::new();
    for row in rows {
        if let Some(id) = row.get("id") {
            if !ids.insert(id.to_string()) {
                return true;
            }
        }
        if let Some(key) = unique_key(table, row) {
            if !keys.insert(key) {
                return true;
            }
        }
    }
    false
}

impl DataService for MemoryDataService {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError> {
        self.delay().await;
        let identity = {
            let mut state = self.inner.state.lock().await;
            state.check_online()?;

            let key = email.to_lowercase();
            if state.users.contains_key(&key) {
                return Err(RemoteError::EmailTaken);
            }

            let password_hash =
                hash_password(password).map_err(|e| RemoteError::Service(e.to_string()))?;
            let identity = Identity {
                id: Uuid::new_v4(),
                email: email.to_string(),
            };
            state.users.insert(
                key,
                StoredUser {
                    identity: identity.clone(),
                    password_hash,
                },
            );
            if state.confirm_email {
                debug!(user_id = %identity.id, "Identity created, confirmation pending");
                return Ok(SignUpOutcome::ConfirmationPending(identity));
            }
            state.start_session(identity.id);
            identity
        };

        debug!(user_id = %identity.id, "Identity created");
        self.emit(AuthChange::SignedIn);
        Ok(SignUpOutcome::SignedIn(identity))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, RemoteError> {
        self.delay().await;
        let identity = {
            let mut state = self.inner.state.lock().await;
            state.check_online()?;

            let user = state
                .users
                .get(&email.to_lowercase())
                .ok_or(RemoteError::InvalidCredentials)?;
            verify_password(password, &user.password_hash)
                .map_err(|_| RemoteError::InvalidCredentials)?;

            let identity = user.identity.clone();
            state.start_session(identity.id);
            identity
        };

        self.emit(AuthChange::SignedIn);
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.delay().await;
        let result = {
            let mut state = self.inner.state.lock().await;
            let token = state.current.take();
            if std::mem::take(&mut state.faults.sign_out) || state.faults.offline {
                Err(RemoteError::Service("sign-out request failed".to_string()))
            } else {
                if let Some(token) = token {
                    state.sessions.remove(&token);
                }
                Ok(())
            }
        };

        self.emit(AuthChange::SignedOut);
        result
    }

    async fn get_current_session(&self) -> Result<Option<Identity>, RemoteError> {
        self.delay().await;
        let mut state = self.inner.state.lock().await;
        state.check_online()?;

        let identity = state.current_identity();
        if identity.is_none() {
            state.current = None;
        }
        Ok(identity)
    }

    async fn current_identity(&self) -> Option<Identity> {
        self.inner.state.lock().await.current_identity()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.inner.events.subscribe()
    }

    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Row>, RemoteError> {
        self.delay().await;
        let state = self.inner.state.lock().await;
        state.check_online()?;
        if state.faults.selects.contains(&table) {
            return Err(RemoteError::Service(format!("select from {table} failed")));
        }

        let rows = state.tables.get(&table).cloned().unwrap_or_default();
        Ok(query.apply(rows))
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, RemoteError> {
        self.delay().await;
        let mut state = self.inner.state.lock().await;
        state.check_online()?;
        if state.faults.inserts.contains(&table) {
            return Err(RemoteError::Service(format!("insert into {table} failed")));
        }

        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let rows = state.tables.entry(table).or_default();
        rows.push(row.clone());
        if violates_unique(table, rows) {
            rows.pop();
            return Err(RemoteError::UniqueViolation(table));
        }

        Ok(row)
    }

    async fn update(&self, table: Table, query: &Query, patch: Row) -> Result<Vec<Row>, RemoteError> {
        self.delay().await;
        let mut state = self.inner.state.lock().await;
        state.check_online()?;

        let rows = state.tables.entry(table).or_default();
        let mut candidate = rows.clone();
        let mut updated = Vec::new();
        for row in candidate.iter_mut().filter(|r| query.matches(r)) {
            for (column, value) in &patch {
                row.insert(column.clone(), value.clone());
            }
            updated.push(row.clone());
        }

        if violates_unique(table, &candidate) {
            return Err(RemoteError::UniqueViolation(table));
        }
        *rows = candidate;
        Ok(updated)
    }

    async fn delete(&self, table: Table, query: &Query) -> Result<u64, RemoteError> {
        self.delay().await;
        let mut state = self.inner.state.lock().await;
        state.check_online()?;

        let rows = state.tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| !query.matches(r));
        Ok((before - rows.len()) as u64)
    }
}
