//! Authentication module for AlumniConnect.
//!
//! This module provides the session store, sign-up requests, profile
//! editing, permission checks and input validation.

mod password;
pub mod permission;
mod profile;
mod registration;
mod session;
pub mod validation;

pub use password::{hash_password, verify_password, PasswordError};
pub use permission::{Page, PermissionError};
pub use profile::{update_own_profile, validate_profile_update};
pub use registration::SignUpRequest;
pub use session::{SessionSnapshot, SessionState, SessionStore};
pub use validation::ValidationError;
