//! Content management for administrators.
//!
//! Events are created and deleted here; jobs can be listed (active or not)
//! and deleted.

use tracing::info;
use uuid::Uuid;

use crate::auth::permission::require_admin;
use crate::auth::SessionStore;
use crate::events::{Event, NewEvent};
use crate::jobs::Job;
use crate::remote::{from_row, from_rows, to_row, DataService, Direction, Query, Table};
use crate::Result;

/// Admin service for events and jobs.
pub struct ContentAdminService<'a, S> {
    store: &'a SessionStore<S>,
}

impl<'a, S: DataService> ContentAdminService<'a, S> {
    pub fn new(store: &'a SessionStore<S>) -> Self {
        Self { store }
    }

    /// Every event, latest date first.
    pub async fn list_events(&self) -> Result<Vec<Event>> {
        require_admin(self.store.snapshot().profile())?;
        let query = Query::new().order("event_date", Direction::Desc);
        let rows = self.store.service().select(Table::Events, &query).await?;
        Ok(from_rows(rows)?)
    }

    /// Create an event owned by the signed-in admin.
    pub async fn create_event(&self, mut new_event: NewEvent) -> Result<Event> {
        let snapshot = self.store.snapshot();
        let admin = require_admin(snapshot.profile())?;
        new_event.validate()?;

        new_event.created_by = Some(admin.user_id);
        new_event.registration_count = 0;
        let row = self
            .store
            .service()
            .insert(Table::Events, to_row(&new_event)?)
            .await?;
        let event: Event = from_row(row)?;
        info!(event_id = %event.id, admin_id = %admin.user_id, "Event created");
        Ok(event)
    }

    /// Delete an event. Returns whether it existed.
    pub async fn delete_event(&self, event_id: Uuid) -> Result<bool> {
        let snapshot = self.store.snapshot();
        let admin = require_admin(snapshot.profile())?;
        let removed = self
            .store
            .service()
            .delete(Table::Events, &Query::new().eq("id", event_id.to_string()))
            .await?;
        if removed > 0 {
            info!(%event_id, admin_id = %admin.user_id, "Event deleted");
        }
        Ok(removed > 0)
    }

    /// Every job including inactive ones, newest first.
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        require_admin(self.store.snapshot().profile())?;
        let query = Query::new().order("created_at", Direction::Desc);
        let rows = self.store.service().select(Table::Jobs, &query).await?;
        Ok(from_rows(rows)?)
    }

    /// Delete a job. Returns whether it existed.
    pub async fn delete_job(&self, job_id: Uuid) -> Result<bool> {
        let snapshot = self.store.snapshot();
        let admin = require_admin(snapshot.profile())?;
        let removed = self
            .store
            .service()
            .delete(Table::Jobs, &Query::new().eq("id", job_id.to_string()))
            .await?;
        if removed > 0 {
            info!(%job_id, admin_id = %admin.user_id, "Job deleted");
        }
        Ok(removed > 0)
    }
}
