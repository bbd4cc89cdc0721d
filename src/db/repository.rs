//! Profile repository for AlumniConnect.
//!
//! This module provides CRUD operations for rows of the `profiles` table.

use serde_json::Value;
use uuid::Uuid;

use super::profile::{NewProfile, Profile, ProfileUpdate, Role};
use crate::remote::{from_row, from_rows, to_row, DataService, Direction, Query, Row, Table};
use crate::Result;

/// Repository for profile CRUD operations.
pub struct ProfileRepository<'a, S> {
    service: &'a S,
}

impl<'a, S: DataService> ProfileRepository<'a, S> {
    /// Create a new ProfileRepository over the given data service.
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Get the profile of an identity.
    pub async fn get_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let query = Query::new().eq("user_id", user_id.to_string()).limit(1);
        let rows = self.service.select(Table::Profiles, &query).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Get a profile by its row id.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        let query = Query::new().eq("id", id.to_string()).limit(1);
        let rows = self.service.select(Table::Profiles, &query).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Create a profile and return it as stored.
    pub async fn create(&self, new_profile: &NewProfile) -> Result<Profile> {
        let row = self
            .service
            .insert(Table::Profiles, to_row(new_profile)?)
            .await?;
        Ok(from_row(row)?)
    }

    /// Update the profile of an identity.
    ///
    /// Returns the updated profile, or None if the identity has no profile.
    pub async fn update_by_user_id(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>> {
        if update.is_empty() {
            return self.get_by_user_id(user_id).await;
        }
        self.patch(
            Query::new().eq("user_id", user_id.to_string()),
            to_row(update)?,
        )
        .await
    }

    /// Set the approval flag of an identity's profile.
    pub async fn set_approval(&self, user_id: Uuid, is_approved: bool) -> Result<Option<Profile>> {
        let mut patch = Row::new();
        patch.insert("is_approved".to_string(), Value::Bool(is_approved));
        self.patch(Query::new().eq("user_id", user_id.to_string()), patch)
            .await
    }

    /// Change the role of an identity's profile. Only reachable from admin
    /// operations.
    pub(crate) async fn set_role(&self, user_id: Uuid, role: Role) -> Result<Option<Profile>> {
        let mut patch = Row::new();
        patch.insert(
            "role".to_string(),
            Value::String(role.as_str().to_string()),
        );
        self.patch(Query::new().eq("user_id", user_id.to_string()), patch)
            .await
    }

    /// List every profile, newest first.
    pub async fn list_all(&self) -> Result<Vec<Profile>> {
        let query = Query::new().order("created_at", Direction::Desc);
        let rows = self.service.select(Table::Profiles, &query).await?;
        Ok(from_rows(rows)?)
    }

    /// List approved alumni by name.
    pub async fn list_approved_alumni(&self) -> Result<Vec<Profile>> {
        let query = Query::new()
            .eq("role", Role::Alumni.as_str())
            .eq("is_approved", true)
            .order("full_name", Direction::Asc);
        let rows = self.service.select(Table::Profiles, &query).await?;
        Ok(from_rows(rows)?)
    }

    async fn patch(&self, query: Query, patch: Row) -> Result<Option<Profile>> {
        let rows = self.service.update(Table::Profiles, &query, patch).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }
}
