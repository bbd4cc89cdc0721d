//! Profile model for AlumniConnect.
//!
//! This module defines the Profile row and the Role enum. A profile's role
//! is fixed when the row is created; [`ProfileUpdate`] cannot carry one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a member of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Graduate. Needs admin approval before appearing in the directory.
    Alumni,
    /// Current student.
    Student,
    /// Administrator.
    Admin,
}

impl Role {
    /// Convert role to its stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Alumni => "alumni",
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    /// Get display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Alumni => "Alumni",
            Role::Student => "Student",
            Role::Admin => "Admin",
        }
    }

    /// Approval state a new profile with this role starts in.
    ///
    /// ```
    /// use alumni_connect::db::Role;
    ///
    /// assert!(!Role::Alumni.initial_approval());
    /// assert!(Role::Student.initial_approval());
    /// ```
    pub fn initial_approval(&self) -> bool {
        *self != Role::Alumni
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alumni" => Ok(Role::Alumni),
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Application profile of an identity, as stored in `profiles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Row id.
    pub id: Uuid,
    /// Identity this profile belongs to.
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    role: Role,
    /// Admin approval. Only meaningful for alumni.
    #[serde(default)]
    pub is_approved: bool,
    /// Graduation year.
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Role assigned at creation.
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_alumni(&self) -> bool {
        self.role == Role::Alumni
    }

    /// Alumni waiting for admin approval.
    pub fn is_pending(&self) -> bool {
        self.role == Role::Alumni && !self.is_approved
    }

    /// Approval with the role taken into account: only alumni can be unapproved.
    pub fn is_effectively_approved(&self) -> bool {
        self.role != Role::Alumni || self.is_approved
    }
}

/// Data for creating a new profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    role: Role,
    is_approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl NewProfile {
    /// Create a profile for `user_id`. Approval follows the role.
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        full_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            user_id,
            full_name: full_name.into(),
            email: email.into(),
            role,
            is_approved: role.initial_approval(),
            batch: None,
            branch: None,
        }
    }

    /// Set the graduation year.
    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = Some(batch.into());
        self
    }

    /// Set the branch of study.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_approved(&self) -> bool {
        self.is_approved
    }
}

/// Changes a member may make to their own profile.
///
/// Fields left `None` are untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<Option<String>>,
}

impl ProfileUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn batch(mut self, batch: Option<String>) -> Self {
        self.batch = Some(batch);
        self
    }

    pub fn branch(mut self, branch: Option<String>) -> Self {
        self.branch = Some(branch);
        self
    }

    pub fn profession(mut self, profession: Option<String>) -> Self {
        self.profession = Some(profession);
        self
    }

    pub fn company(mut self, company: Option<String>) -> Self {
        self.company = Some(company);
        self
    }

    pub fn location(mut self, location: Option<String>) -> Self {
        self.location = Some(location);
        self
    }

    pub fn bio(mut self, bio: Option<String>) -> Self {
        self.bio = Some(bio);
        self
    }

    pub fn linkedin_url(mut self, url: Option<String>) -> Self {
        self.linkedin_url = Some(url);
        self
    }

    pub fn resume_url(mut self, url: Option<String>) -> Self {
        self.resume_url = Some(url);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_profile(role: &str, is_approved: bool) -> Profile {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "full_name": "Test User",
            "email": "test@example.com",
            "role": role,
            "is_approved": is_approved,
            "batch": "2022",
            "created_at": "2024-01-01T00:00:00+00:00",
        }))
        .unwrap()
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("alumni").unwrap(), Role::Alumni);
        assert_eq!(Role::from_str("Student").unwrap(), Role::Student);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert!(Role::from_str("sysop").is_err());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_value(Role::Alumni).unwrap(), json!("alumni"));
        let role: Role = serde_json::from_value(json!("admin")).unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(format!("{}", Role::Student), "student");
    }

    #[test]
    fn test_initial_approval() {
        assert!(!Role::Alumni.initial_approval());
        assert!(Role::Student.initial_approval());
        assert!(Role::Admin.initial_approval());
    }

    #[test]
    fn test_profile_deserialize_with_missing_optionals() {
        let profile = sample_profile("alumni", false);
        assert_eq!(profile.role(), Role::Alumni);
        assert_eq!(profile.batch.as_deref(), Some("2022"));
        assert!(profile.company.is_none());
        assert!(profile.is_pending());
        assert!(!profile.is_effectively_approved());
    }

    #[test]
    fn test_student_is_effectively_approved() {
        let profile = sample_profile("student", false);
        assert!(!profile.is_pending());
        assert!(profile.is_effectively_approved());
    }

    #[test]
    fn test_new_profile_serializes_approval() {
        let user_id = Uuid::new_v4();
        let new_profile =
            NewProfile::new(user_id, "a@x.com", "A", Role::Alumni).with_batch("2022");
        let value = serde_json::to_value(&new_profile).unwrap();

        assert_eq!(value["role"], json!("alumni"));
        assert_eq!(value["is_approved"], json!(false));
        assert_eq!(value["batch"], json!("2022"));
        assert!(value.get("branch").is_none());

        let student = NewProfile::new(user_id, "s@x.com", "S", Role::Student);
        assert!(student.is_approved());
    }

    #[test]
    fn test_profile_update_serialization() {
        let update = ProfileUpdate::new()
            .full_name("New Name")
            .company(None)
            .profession(Some("Engineer".to_string()));
        let value = serde_json::to_value(&update).unwrap();

        assert_eq!(
            value,
            json!({"full_name": "New Name", "profession": "Engineer", "company": null})
        );
        assert!(value.get("role").is_none());
        assert!(!update.is_empty());
        assert!(ProfileUpdate::new().is_empty());
    }
}
