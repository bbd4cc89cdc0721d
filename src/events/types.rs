//! Event types for AlumniConnect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::validation::{
    validate_optional_text, validate_required, validate_url, ValidationError,
};
use crate::remote::null_as_default;

/// Maximum length for event titles.
pub const MAX_EVENT_TITLE_LENGTH: usize = 200;

/// Maximum length for event descriptions.
pub const MAX_EVENT_DESCRIPTION_LENGTH: usize = 5000;

/// A row of `events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    /// Maximum attendees. Zero or null means unlimited.
    #[serde(default, deserialize_with = "null_as_default")]
    pub capacity: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub registration_count: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Seats left, or `None` when capacity is unlimited.
    pub fn spots_left(&self) -> Option<u32> {
        if self.capacity == 0 {
            return None;
        }
        Some(self.capacity.saturating_sub(self.registration_count))
    }

    pub fn is_fully_booked(&self) -> bool {
        self.spots_left() == Some(0)
    }
}

/// Data for creating a new event.
#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub location: String,
    pub capacity: u32,
    pub registration_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
}

impl NewEvent {
    /// Create an event with unlimited capacity.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        event_date: DateTime<Utc>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            event_date,
            location: location.into(),
            capacity: 0,
            registration_count: 0,
            image_url: None,
            created_by: None,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("title", &self.title)?;
        validate_optional_text("title", Some(self.title.as_str()), MAX_EVENT_TITLE_LENGTH)?;
        validate_required("description", &self.description)?;
        validate_optional_text(
            "description",
            Some(self.description.as_str()),
            MAX_EVENT_DESCRIPTION_LENGTH,
        )?;
        validate_required("location", &self.location)?;
        validate_url("image_url", self.image_url.as_deref())?;
        Ok(())
    }
}

/// A row of `event_registrations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Data for registering an identity for an event.
#[derive(Debug, Clone, Serialize)]
pub struct NewEventRegistration {
    pub event_id: Uuid,
    pub user_id: Uuid,
}
