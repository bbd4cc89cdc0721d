//! Alumni directory service.

use tracing::info;
use uuid::Uuid;

use crate::auth::permission::require_signed_in;
use crate::auth::{SessionStore, ValidationError};
use crate::db::{Profile, ProfileRepository};
use crate::remote::{from_row, from_rows, to_row, DataService, Query, Table};
use crate::Result;

use super::filter::{filter_alumni, DirectoryFilter};
use super::types::{ConnectionRequest, NewConnectionRequest};

/// Service for browsing alumni and connecting with them.
pub struct DirectoryService<'a, S> {
    store: &'a SessionStore<S>,
}

impl<'a, S: DataService> DirectoryService<'a, S> {
    pub fn new(store: &'a SessionStore<S>) -> Self {
        Self { store }
    }

    /// Approved alumni ordered by name. Visible to everyone.
    pub async fn list_alumni(&self) -> Result<Vec<Profile>> {
        ProfileRepository::new(self.store.service())
            .list_approved_alumni()
            .await
    }

    /// Approved alumni matching `filter`.
    pub async fn search(&self, filter: &DirectoryFilter) -> Result<Vec<Profile>> {
        let alumni = self.list_alumni().await?;
        Ok(filter_alumni(&alumni, filter))
    }

    /// Send a pending connection request to the identity `receiver_id`.
    ///
    /// A repeated request fails with a uniqueness error.
    pub async fn send_connection_request(&self, receiver_id: Uuid) -> Result<ConnectionRequest> {
        let snapshot = self.store.snapshot();
        let sender = require_signed_in(snapshot.profile())?;
        if sender.user_id == receiver_id {
            return Err(ValidationError::SelfConnection.into());
        }

        let request = NewConnectionRequest::new(sender.user_id, receiver_id);
        let row = self
            .store
            .service()
            .insert(Table::ConnectionRequests, to_row(&request)?)
            .await?;
        info!(sender_id = %sender.user_id, %receiver_id, "Connection request sent");
        Ok(from_row(row)?)
    }

    /// Connection requests sent by the signed-in user.
    pub async fn sent_requests(&self) -> Result<Vec<ConnectionRequest>> {
        let snapshot = self.store.snapshot();
        let sender = require_signed_in(snapshot.profile())?;
        let query = Query::new().eq("sender_id", sender.user_id.to_string());
        let rows = self
            .store
            .service()
            .select(Table::ConnectionRequests, &query)
            .await?;
        Ok(from_rows(rows)?)
    }
}
