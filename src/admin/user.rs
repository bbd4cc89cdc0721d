//! User moderation for administrators.
//!
//! - List every profile
//! - Split profiles into pending and approved
//! - Approve or revoke alumni
//! - Change a member's role

use tracing::info;
use uuid::Uuid;

use crate::auth::permission::{require_admin, PermissionError};
use crate::auth::SessionStore;
use crate::db::{Profile, ProfileRepository, Role};
use crate::remote::DataService;
use crate::{AlumniError, Result};

/// Profiles split for the moderation screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedUsers {
    /// Alumni waiting for approval.
    pub pending: Vec<Profile>,
    /// Approved alumni and every non-alumni profile.
    pub approved: Vec<Profile>,
}

/// Split profiles into pending and approved, preserving order.
pub fn partition_users(users: &[Profile]) -> PartitionedUsers {
    let (pending, approved) = users.iter().cloned().partition(Profile::is_pending);
    PartitionedUsers { pending, approved }
}

/// Admin service for user moderation.
pub struct UserAdminService<'a, S> {
    store: &'a SessionStore<S>,
}

impl<'a, S: DataService> UserAdminService<'a, S> {
    pub fn new(store: &'a SessionStore<S>) -> Self {
        Self { store }
    }

    /// Every profile, newest first.
    pub async fn list_users(&self) -> Result<Vec<Profile>> {
        require_admin(self.store.snapshot().profile())?;
        ProfileRepository::new(self.store.service()).list_all().await
    }

    /// Approve the alumnus with identity `user_id`.
    ///
    /// The member sees the change after their session refreshes its profile.
    pub async fn approve_user(&self, user_id: Uuid) -> Result<Profile> {
        self.set_approval(user_id, true).await
    }

    /// Withdraw approval from the alumnus with identity `user_id`.
    pub async fn revoke_approval(&self, user_id: Uuid) -> Result<Profile> {
        self.set_approval(user_id, false).await
    }

    /// Change the role of the member with identity `user_id`.
    ///
    /// This is the only path by which a role changes after sign-up.
    pub async fn change_role(&self, user_id: Uuid, role: Role) -> Result<Profile> {
        let snapshot = self.store.snapshot();
        let admin = require_admin(snapshot.profile())?;
        if admin.user_id == user_id {
            return Err(PermissionError::CannotModifySelf.into());
        }

        let profile = ProfileRepository::new(self.store.service())
            .set_role(user_id, role)
            .await?
            .ok_or_else(|| not_found(user_id))?;
        info!(admin_id = %admin.user_id, %user_id, %role, "Role changed");
        Ok(profile)
    }

    async fn set_approval(&self, user_id: Uuid, is_approved: bool) -> Result<Profile> {
        let snapshot = self.store.snapshot();
        let admin = require_admin(snapshot.profile())?;
        if admin.user_id == user_id {
            return Err(PermissionError::CannotModifySelf.into());
        }

        let profile = ProfileRepository::new(self.store.service())
            .set_approval(user_id, is_approved)
            .await?
            .ok_or_else(|| not_found(user_id))?;
        info!(admin_id = %admin.user_id, %user_id, is_approved, "Approval changed");
        Ok(profile)
    }
}

fn not_found(user_id: Uuid) -> AlumniError {
    AlumniError::NotFound(format!("profile for user {user_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(role: &str, is_approved: bool) -> Profile {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "full_name": "Member",
            "email": "m@example.com",
            "role": role,
            "is_approved": is_approved,
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn test_partition_users() {
        let users = vec![
            profile("alumni", false),
            profile("alumni", true),
            profile("student", false),
            profile("admin", true),
            profile("alumni", false),
        ];
        let split = partition_users(&users);
        assert_eq!(split.pending.len(), 2);
        assert_eq!(split.approved.len(), 3);
        assert_eq!(split.pending[0].id, users[0].id);
        assert_eq!(split.pending[1].id, users[4].id);
    }

    #[test]
    fn test_partition_empty() {
        assert_eq!(partition_users(&[]), PartitionedUsers::default());
    }
}
