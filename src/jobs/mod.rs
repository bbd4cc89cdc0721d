//! Job board for AlumniConnect.

mod service;
mod types;

pub use service::JobService;
pub use types::{
    Job, JobApplication, JobFilter, JobKind, NewJob, MAX_JOB_DESCRIPTION_LENGTH,
    MAX_JOB_FIELD_LENGTH,
};
