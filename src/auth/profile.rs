//! Editing the signed-in user's own profile.

use tracing::{info, warn};

use crate::auth::permission::require_signed_in;
use crate::auth::session::SessionStore;
use crate::auth::validation::{
    validate_batch, validate_full_name, validate_optional_text, validate_url, ValidationError,
};
use crate::db::{Profile, ProfileRepository, ProfileUpdate};
use crate::remote::DataService;
use crate::AlumniError;

/// Maximum length for the bio.
pub const MAX_BIO_LENGTH: usize = 1000;

/// Maximum length for short text fields (branch, profession, company, location).
pub const MAX_FIELD_LENGTH: usize = 100;

/// Validate every field set in `update`.
pub fn validate_profile_update(
    update: &ProfileUpdate,
) -> std::result::Result<(), ValidationError> {
    if let Some(ref full_name) = update.full_name {
        validate_full_name(full_name)?;
    }
    if let Some(Some(ref batch)) = update.batch {
        validate_batch(batch)?;
    }

    let short_fields = [
        ("branch", &update.branch),
        ("profession", &update.profession),
        ("company", &update.company),
        ("location", &update.location),
    ];
    for (field, value) in short_fields {
        validate_optional_text(field, value.as_ref().and_then(|v| v.as_deref()), MAX_FIELD_LENGTH)?;
    }
    validate_optional_text(
        "bio",
        update.bio.as_ref().and_then(|v| v.as_deref()),
        MAX_BIO_LENGTH,
    )?;

    validate_url(
        "linkedin_url",
        update.linkedin_url.as_ref().and_then(|v| v.as_deref()),
    )?;
    validate_url(
        "resume_url",
        update.resume_url.as_ref().and_then(|v| v.as_deref()),
    )?;
    Ok(())
}

/// Update the signed-in user's profile and refresh the session copy.
///
/// The role is not part of [`ProfileUpdate`] and cannot change here. Once
/// the row is written the update counts as done; a failed refresh is only
/// logged and the written row is returned.
pub async fn update_own_profile<S: DataService>(
    store: &SessionStore<S>,
    update: ProfileUpdate,
) -> crate::Result<Profile> {
    validate_profile_update(&update)?;
    let snapshot = store.snapshot();
    let current = require_signed_in(snapshot.profile())?;

    let repo = ProfileRepository::new(store.service());
    let updated = repo
        .update_by_user_id(current.user_id, &update)
        .await?
        .ok_or(AlumniError::ProfileMissing(current.user_id))?;
    info!(user_id = %current.user_id, "Profile updated");

    match store.refresh_profile().await {
        Ok(Some(refreshed)) => Ok(refreshed),
        Ok(None) => Ok(updated),
        Err(e) => {
            warn!(user_id = %current.user_id, error = %e, "Session refresh after profile update failed");
            Ok(updated)
        }
    }
}
