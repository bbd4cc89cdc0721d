//! Sign-up requests for AlumniConnect.
//!
//! The request is validated in full before the session store makes any
//! remote call; the profile it describes is created right after the
//! identity.

use uuid::Uuid;

use crate::auth::validation::{
    validate_batch, validate_email, validate_full_name, validate_optional_text,
    validate_password, ValidationError,
};
use crate::db::{NewProfile, Role};

/// Maximum branch name length.
pub const MAX_BRANCH_LENGTH: usize = 100;

/// Sign-up request data.
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    /// Graduation year, e.g. "2022".
    pub batch: Option<String>,
    pub branch: Option<String>,
}

impl SignUpRequest {
    /// Create a new sign-up request.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            full_name: full_name.into(),
            role,
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

    /// Validate every field. Returns the first error encountered.
    ///
    /// # Examples
    ///
    /// ```
    /// use alumni_connect::auth::SignUpRequest;
    /// use alumni_connect::db::Role;
    ///
    /// let request = SignUpRequest::new("a@x.com", "secret1", "Ada", Role::Alumni)
    ///     .with_batch("2022");
    /// assert!(request.validate().is_ok());
    ///
    /// let request = SignUpRequest::new("a@x.com", "secret1", "Ada", Role::Alumni)
    ///     .with_batch("22");
    /// assert!(request.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(self.email.trim())?;
        validate_password(&self.password)?;
        validate_full_name(&self.full_name)?;
        if let Some(batch) = non_empty(&self.batch) {
            validate_batch(batch)?;
        }
        validate_optional_text("branch", non_empty(&self.branch), MAX_BRANCH_LENGTH)?;
        Ok(())
    }

    /// Email as sent to the auth service.
    pub fn normalized_email(&self) -> &str {
        self.email.trim()
    }

    /// Profile row to create for the identity `user_id`.
    pub fn to_new_profile(&self, user_id: Uuid) -> NewProfile {
        let mut profile = NewProfile::new(
            user_id,
            self.normalized_email(),
            self.full_name.trim(),
            self.role,
        );
        if let Some(batch) = non_empty(&self.batch) {
            profile = profile.with_batch(batch);
        }
        if let Some(branch) = non_empty(&self.branch) {
            profile = profile.with_branch(branch);
        }
        profile
    }
}

/// Treat blank optional form fields as absent.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
