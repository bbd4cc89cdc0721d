//! Permission checking for AlumniConnect.
//!
//! Stateless predicates over a profile snapshot. Callers recompute them on
//! every session change; the data service's row-level rules remain the
//! authoritative check.

use thiserror::Error;

use crate::db::{Profile, Role};

/// Permission-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// User does not have the role an operation needs.
    #[error("this action requires the {0} role")]
    InsufficientRole(String),

    /// User is not signed in, or has no profile.
    #[error("you must be signed in to do this")]
    NotAuthenticated,

    /// Administrators cannot change their own role or approval.
    #[error("you cannot perform this action on your own account")]
    CannotModifySelf,
}

/// Top-level pages of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Directory,
    Events,
    Jobs,
    Profile,
    Admin,
    About,
    Contact,
}

impl Page {
    /// All pages in navigation order.
    pub const ALL: [Page; 8] = [
        Page::Home,
        Page::Directory,
        Page::Events,
        Page::Jobs,
        Page::Profile,
        Page::Admin,
        Page::About,
        Page::Contact,
    ];

    /// Route path of the page.
    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Directory => "/directory",
            Page::Events => "/events",
            Page::Jobs => "/jobs",
            Page::Profile => "/profile",
            Page::Admin => "/admin",
            Page::About => "/about",
            Page::Contact => "/contact",
        }
    }
}

/// Profile present and role is admin.
///
/// # Examples
///
/// ```
/// use alumni_connect::auth::permission::is_admin;
///
/// assert!(!is_admin(None));
/// ```
pub fn is_admin(profile: Option<&Profile>) -> bool {
    profile.is_some_and(|p| p.role() == Role::Admin)
}

/// Profile present, role is alumni and an admin has approved it.
pub fn is_approved_alumni(profile: Option<&Profile>) -> bool {
    profile.is_some_and(|p| p.role() == Role::Alumni && p.is_approved)
}

/// Alumni may post jobs. Approval is not required.
pub fn can_post_job(profile: Option<&Profile>) -> bool {
    profile.is_some_and(|p| p.role() == Role::Alumni)
}

/// Approving, revoking and role changes are admin-only.
pub fn can_moderate_users(profile: Option<&Profile>) -> bool {
    is_admin(profile)
}

pub fn can_register_for_event(profile: Option<&Profile>) -> bool {
    profile.is_some()
}

pub fn can_apply_for_job(profile: Option<&Profile>) -> bool {
    profile.is_some()
}

pub fn can_send_connection_request(profile: Option<&Profile>) -> bool {
    profile.is_some()
}

/// Whether `page` is reachable from the navigation for this profile.
pub fn can_view_page(page: Page, profile: Option<&Profile>) -> bool {
    match page {
        Page::Admin => is_admin(profile),
        Page::Profile => profile.is_some(),
        _ => true,
    }
}

/// Pages shown in the navigation for this profile.
pub fn visible_pages(profile: Option<&Profile>) -> Vec<Page> {
    Page::ALL
        .into_iter()
        .filter(|page| can_view_page(*page, profile))
        .collect()
}

/// Require a signed-in user with a profile, returning it.
pub fn require_signed_in(profile: Option<&Profile>) -> Result<&Profile, PermissionError> {
    profile.ok_or(PermissionError::NotAuthenticated)
}

/// Require the admin role.
///
/// ```
/// use alumni_connect::auth::permission::{require_admin, PermissionError};
///
/// assert_eq!(require_admin(None).unwrap_err(), PermissionError::NotAuthenticated);
/// ```
pub fn require_admin(profile: Option<&Profile>) -> Result<&Profile, PermissionError> {
    let profile = require_signed_in(profile)?;
    if profile.role() != Role::Admin {
        return Err(PermissionError::InsufficientRole(
            Role::Admin.display_name().to_string(),
        ));
    }
    Ok(profile)
}

/// Require a profile allowed to post jobs.
pub fn require_job_poster(profile: Option<&Profile>) -> Result<&Profile, PermissionError> {
    let profile = require_signed_in(profile)?;
    if !can_post_job(Some(profile)) {
        return Err(PermissionError::InsufficientRole(
            Role::Alumni.display_name().to_string(),
        ));
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn create_test_profile(role: Role, is_approved: bool) -> Profile {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "full_name": "Test User",
            "email": "test@example.com",
            "role": role,
            "is_approved": is_approved,
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn test_is_admin() {
        assert!(!is_admin(None));
        assert!(is_admin(Some(&create_test_profile(Role::Admin, true))));
        assert!(!is_admin(Some(&create_test_profile(Role::Alumni, true))));
        assert!(!is_admin(Some(&create_test_profile(Role::Student, true))));
    }

    #[test]
    fn test_is_approved_alumni() {
        assert!(!is_approved_alumni(None));
        assert!(is_approved_alumni(Some(&create_test_profile(
            Role::Alumni,
            true
        ))));
        assert!(!is_approved_alumni(Some(&create_test_profile(
            Role::Alumni,
            false
        ))));
        assert!(!is_approved_alumni(Some(&create_test_profile(
            Role::Student,
            true
        ))));
    }

    #[test]
    fn test_can_post_job_ignores_approval() {
        assert!(!can_post_job(None));
        assert!(can_post_job(Some(&create_test_profile(Role::Alumni, false))));
        assert!(can_post_job(Some(&create_test_profile(Role::Alumni, true))));
        assert!(!can_post_job(Some(&create_test_profile(Role::Student, true))));
        assert!(!can_post_job(Some(&create_test_profile(Role::Admin, true))));
    }

    #[test]
    fn test_can_moderate_users() {
        assert!(!can_moderate_users(None));
        assert!(can_moderate_users(Some(&create_test_profile(
            Role::Admin,
            true
        ))));
        assert!(!can_moderate_users(Some(&create_test_profile(
            Role::Alumni,
            true
        ))));
    }

    #[test]
    fn test_signed_in_actions() {
        let student = create_test_profile(Role::Student, true);
        assert!(can_register_for_event(Some(&student)));
        assert!(can_apply_for_job(Some(&student)));
        assert!(can_send_connection_request(Some(&student)));
        assert!(!can_register_for_event(None));
        assert!(!can_apply_for_job(None));
        assert!(!can_send_connection_request(None));
    }

    #[test]
    fn test_visible_pages_anonymous() {
        let pages = visible_pages(None);
        assert!(pages.contains(&Page::Home));
        assert!(pages.contains(&Page::Directory));
        assert!(!pages.contains(&Page::Profile));
        assert!(!pages.contains(&Page::Admin));
    }

    #[test]
    fn test_visible_pages_by_role() {
        let student = create_test_profile(Role::Student, true);
        let pages = visible_pages(Some(&student));
        assert!(pages.contains(&Page::Profile));
        assert!(!pages.contains(&Page::Admin));

        let admin = create_test_profile(Role::Admin, true);
        assert_eq!(visible_pages(Some(&admin)).len(), Page::ALL.len());
    }

    #[test]
    fn test_require_admin() {
        assert_eq!(
            require_admin(None).unwrap_err(),
            PermissionError::NotAuthenticated
        );

        let alumni = create_test_profile(Role::Alumni, true);
        assert!(matches!(
            require_admin(Some(&alumni)),
            Err(PermissionError::InsufficientRole(_))
        ));

        let admin = create_test_profile(Role::Admin, true);
        assert_eq!(require_admin(Some(&admin)).unwrap().id, admin.id);
    }

    #[test]
    fn test_require_job_poster() {
        let pending = create_test_profile(Role::Alumni, false);
        assert!(require_job_poster(Some(&pending)).is_ok());

        let student = create_test_profile(Role::Student, true);
        assert_eq!(
            require_job_poster(Some(&student)).unwrap_err(),
            PermissionError::InsufficientRole("Alumni".to_string())
        );
    }

    #[test]
    fn test_page_paths() {
        assert_eq!(Page::Home.path(), "/");
        assert_eq!(Page::Admin.path(), "/admin");
    }
}
