//! AlumniConnect - alumni networking client core
//!
//! Session, authentication and role authorization for an alumni network
//! backed by a hosted data service, plus the directory, events and jobs
//! features built on top of it.

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod events;
pub mod jobs;
pub mod logging;
pub mod remote;

pub use admin::{partition_users, ContentAdminService, PartitionedUsers, UserAdminService};
pub use auth::{
    hash_password, update_own_profile, verify_password, Page, PasswordError, PermissionError,
    SessionSnapshot, SessionState, SessionStore, SignUpRequest, ValidationError,
};
pub use config::Config;
pub use db::{NewProfile, Profile, ProfileRepository, ProfileUpdate, Role};
pub use directory::{DirectoryFilter, DirectoryService};
pub use error::{AlumniError, Result};
pub use events::{Event, EventService, NewEvent};
pub use jobs::{Job, JobFilter, JobKind, JobService, NewJob};
pub use remote::{
    AuthChange, DataService, Identity, MemoryDataService, RemoteError, RestDataService,
    SignUpOutcome, Table,
};
