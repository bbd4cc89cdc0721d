//! Connection request types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of a connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of `connection_requests`. Sender and receiver are identity ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[serde(default)]
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a connection request.
#[derive(Debug, Clone, Serialize)]
pub struct NewConnectionRequest {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: ConnectionStatus,
}

impl NewConnectionRequest {
    /// A pending request from `sender_id` to `receiver_id`.
    pub fn new(sender_id: Uuid, receiver_id: Uuid) -> Self {
        Self {
            sender_id,
            receiver_id,
            status: ConnectionStatus::Pending,
        }
    }
}
