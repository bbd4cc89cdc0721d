//! Job board service.

use tracing::info;
use uuid::Uuid;

use crate::auth::permission::{require_job_poster, require_signed_in};
use crate::auth::SessionStore;
use crate::remote::{from_row, from_rows, to_row, DataService, Direction, Query, Table};
use crate::Result;

use super::types::{Job, JobApplication, JobFilter, NewJob, NewJobApplication};

/// Service for browsing, posting and applying to jobs.
pub struct JobService<'a, S> {
    store: &'a SessionStore<S>,
}

impl<'a, S: DataService> JobService<'a, S> {
    pub fn new(store: &'a SessionStore<S>) -> Self {
        Self { store }
    }

    /// Active jobs, newest first.
    pub async fn list_active(&self) -> Result<Vec<Job>> {
        let query = Query::new()
            .eq("is_active", true)
            .order("created_at", Direction::Desc);
        let rows = self.store.service().select(Table::Jobs, &query).await?;
        Ok(from_rows(rows)?)
    }

    /// Active jobs passing `filter`.
    pub async fn list_filtered(&self, filter: JobFilter) -> Result<Vec<Job>> {
        let jobs = self.list_active().await?;
        Ok(jobs.into_iter().filter(|j| filter.matches(j)).collect())
    }

    /// Post a job as the signed-in alumnus. Approval is not required.
    pub async fn post_job(&self, mut new_job: NewJob) -> Result<Job> {
        let snapshot = self.store.snapshot();
        let poster = require_job_poster(snapshot.profile())?;
        new_job.validate()?;

        new_job.posted_by = Some(poster.user_id);
        new_job.is_active = true;
        let row = self
            .store
            .service()
            .insert(Table::Jobs, to_row(&new_job)?)
            .await?;
        let job: Job = from_row(row)?;
        info!(job_id = %job.id, posted_by = %poster.user_id, "Job posted");
        Ok(job)
    }

    /// Apply to a job as the signed-in user. A second application fails
    /// with a uniqueness error.
    pub async fn apply_for_job(&self, job_id: Uuid) -> Result<JobApplication> {
        let snapshot = self.store.snapshot();
        let applicant = require_signed_in(snapshot.profile())?;

        let application = NewJobApplication {
            job_id,
            applicant_id: applicant.user_id,
        };
        let row = self
            .store
            .service()
            .insert(Table::JobApplications, to_row(&application)?)
            .await?;
        info!(%job_id, applicant_id = %applicant.user_id, "Applied for job");
        Ok(from_row(row)?)
    }
}
