//! Profile storage for AlumniConnect.
//!
//! Profiles live in the remote `profiles` table; this module holds the
//! typed model and the repository that reads and writes it.

mod profile;
mod repository;

pub use profile::{NewProfile, Profile, ProfileUpdate, Role};
pub use repository::ProfileRepository;
