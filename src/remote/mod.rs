//! Remote data service access for AlumniConnect.
//!
//! The hosted service provides credential authentication, session tokens
//! and a row-oriented table interface guarded by server-side access rules.
//! Everything else in the crate talks to it through [`DataService`].

mod memory;
mod query;
mod rest;
mod table;
mod token_store;

pub use memory::MemoryDataService;
pub use query::{Direction, Filter, FilterOp, Order, Query};
pub use rest::RestDataService;
pub use table::Table;
pub use token_store::{StoredSession, TokenStore};

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A table row as exchanged with the data service.
pub type Row = Map<String, Value>;

/// Authenticated principal issued by the data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque unique user id.
    pub id: Uuid,
    /// Email the identity signed up with.
    pub email: String,
}

/// What a successful sign-up produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The identity was created and a session was started for it.
    SignedIn(Identity),
    /// The identity was created but the service holds the session back until
    /// the email address is confirmed.
    ConfirmationPending(Identity),
}

impl SignUpOutcome {
    pub fn identity(&self) -> &Identity {
        match self {
            SignUpOutcome::SignedIn(identity) | SignUpOutcome::ConfirmationPending(identity) => {
                identity
            }
        }
    }

    pub fn into_identity(self) -> Identity {
        match self {
            SignUpOutcome::SignedIn(identity) | SignUpOutcome::ConfirmationPending(identity) => {
                identity
            }
        }
    }

    /// Whether the service issued a session.
    pub fn has_session(&self) -> bool {
        matches!(self, SignUpOutcome::SignedIn(_))
    }
}

/// Notification that the client's authentication state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    /// The service rejected the session token.
    SessionExpired,
}

/// Errors reported by a data service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Sign-up with an email that is already registered.
    #[error("email already registered")]
    EmailTaken,

    /// The session token is no longer accepted.
    #[error("session expired")]
    SessionExpired,

    /// A write violated the table's unique constraint.
    #[error("duplicate row in {0}")]
    UniqueViolation(Table),

    /// Transport or service failure.
    #[error("{0}")]
    Service(String),
}

/// Client interface of the hosted data service.
///
/// Implementations own the session token: signing in stores it, signing out
/// discards it and table operations are issued on behalf of it.
pub trait DataService: Send + Sync {
    /// Create a credential identity. A session is started for it unless the
    /// service requires email confirmation first.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<SignUpOutcome, RemoteError>> + Send;

    /// Authenticate with credentials and start a session.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, RemoteError>> + Send;

    /// Invalidate the current session. The local token is discarded even
    /// when the remote call fails.
    fn sign_out(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Ask the service whether a previously issued session is still valid.
    fn get_current_session(
        &self,
    ) -> impl Future<Output = Result<Option<Identity>, RemoteError>> + Send;

    /// Identity of the locally held session, without a remote round trip.
    fn current_identity(&self) -> impl Future<Output = Option<Identity>> + Send;

    /// Subscribe to authentication state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;

    fn select(
        &self,
        table: Table,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<Row>, RemoteError>> + Send;

    /// Insert a row and return it as stored.
    fn insert(
        &self,
        table: Table,
        row: Row,
    ) -> impl Future<Output = Result<Row, RemoteError>> + Send;

    /// Merge `patch` into every matching row and return the updated rows.
    fn update(
        &self,
        table: Table,
        query: &Query,
        patch: Row,
    ) -> impl Future<Output = Result<Vec<Row>, RemoteError>> + Send;

    /// Delete matching rows and return how many were removed.
    fn delete(
        &self,
        table: Table,
        query: &Query,
    ) -> impl Future<Output = Result<u64, RemoteError>> + Send;
}

/// Serialize a value into a row.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, RemoteError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(RemoteError::Service(format!(
            "expected an object row, got {other}"
        ))),
        Err(e) => Err(RemoteError::Service(format!("row encoding failed: {e}"))),
    }
}

/// Deserialize a row into a typed record.
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, RemoteError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| RemoteError::Service(format!("malformed row: {e}")))
}

/// Read a nullable column as its type's default when it is null.
///
/// Use with `#[serde(default, deserialize_with = "...")]` so an absent
/// column is handled too.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize every row of a result set.
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, RemoteError> {
    rows.into_iter().map(from_row).collect()
}
