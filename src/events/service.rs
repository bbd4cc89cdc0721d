//! Event listing and registration service.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::permission::require_signed_in;
use crate::auth::{SessionStore, ValidationError};
use crate::remote::{from_row, from_rows, to_row, DataService, Direction, Query, Row, Table};
use crate::{AlumniError, Result};

use super::types::{Event, EventRegistration, NewEventRegistration};

/// Service for browsing events and registering for them.
pub struct EventService<'a, S> {
    store: &'a SessionStore<S>,
}

impl<'a, S: DataService> EventService<'a, S> {
    pub fn new(store: &'a SessionStore<S>) -> Self {
        Self { store }
    }

    /// Events on or after `now`, soonest first.
    pub async fn list_upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let query = Query::new()
            .gte("event_date", now.to_rfc3339())
            .order("event_date", Direction::Asc);
        let rows = self.store.service().select(Table::Events, &query).await?;
        Ok(from_rows(rows)?)
    }

    pub async fn get(&self, event_id: Uuid) -> Result<Option<Event>> {
        let query = Query::new().eq("id", event_id.to_string()).limit(1);
        let rows = self.store.service().select(Table::Events, &query).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Ids of the events the signed-in user is registered for. Empty when
    /// nobody is signed in.
    pub async fn registered_event_ids(&self) -> Result<HashSet<Uuid>> {
        let snapshot = self.store.snapshot();
        let Some(profile) = snapshot.profile() else {
            return Ok(HashSet::new());
        };

        let query = Query::new().eq("user_id", profile.user_id.to_string());
        let rows = self
            .store
            .service()
            .select(Table::EventRegistrations, &query)
            .await?;
        let registrations: Vec<EventRegistration> = from_rows(rows)?;
        Ok(registrations.into_iter().map(|r| r.event_id).collect())
    }

    /// Register the signed-in user for an event.
    ///
    /// A second registration fails with a uniqueness error and leaves the
    /// event untouched. After a successful registration the event's
    /// `registration_count` is incremented; that step is a read followed by
    /// a write and is not atomic.
    pub async fn register_for_event(&self, event_id: Uuid) -> Result<EventRegistration> {
        let snapshot = self.store.snapshot();
        let profile = require_signed_in(snapshot.profile())?;

        let event = self
            .get(event_id)
            .await?
            .ok_or_else(|| AlumniError::NotFound(format!("event {event_id}")))?;
        if event.is_fully_booked() {
            return Err(ValidationError::EventFullyBooked.into());
        }

        let registration = NewEventRegistration {
            event_id,
            user_id: profile.user_id,
        };
        let row = self
            .store
            .service()
            .insert(Table::EventRegistrations, to_row(&registration)?)
            .await?;
        let registration: EventRegistration = from_row(row)?;
        info!(user_id = %profile.user_id, %event_id, "Registered for event");

        if let Err(e) = self.increment_registration_count(event_id).await {
            warn!(%event_id, error = %e, "Failed to update registration count");
        }
        Ok(registration)
    }

    async fn increment_registration_count(&self, event_id: Uuid) -> Result<()> {
        let event = self
            .get(event_id)
            .await?
            .ok_or_else(|| AlumniError::NotFound(format!("event {event_id}")))?;

        let mut patch = Row::new();
        patch.insert(
            "registration_count".to_string(),
            Value::from(event.registration_count.saturating_add(1)),
        );
        self.store
            .service()
            .update(
                Table::Events,
                &Query::new().eq("id", event_id.to_string()),
                patch,
            )
            .await?;
        Ok(())
    }
}
