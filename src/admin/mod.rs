//! Administration module for AlumniConnect.
//!
//! This module provides administrative functionality including:
//! - User moderation (list, approve, revoke, change role)
//! - Event management (list, create, delete)
//! - Job management (list, delete)
//!
//! Every operation requires the admin role on the signed-in profile.

mod content;
mod user;

pub use content::ContentAdminService;
pub use user::{partition_users, PartitionedUsers, UserAdminService};
