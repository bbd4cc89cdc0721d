//! Job board types for AlumniConnect.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::validation::{validate_optional_text, validate_required, ValidationError};
use crate::remote::null_as_default;

/// Maximum length for job titles and company names.
pub const MAX_JOB_FIELD_LENGTH: usize = 200;

/// Maximum length for job descriptions and requirements.
pub const MAX_JOB_DESCRIPTION_LENGTH: usize = 5000;

/// Kind of position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Full-time position.
    #[default]
    Job,
    Internship,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Job => "job",
            JobKind::Internship => "internship",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            JobKind::Job => "Full-time",
            JobKind::Internship => "Internship",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of `jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: JobKind,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    /// Identity that posted the job.
    #[serde(default)]
    pub posted_by: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Data for posting a new job.
#[derive(Debug, Clone, Serialize)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: JobKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) posted_by: Option<Uuid>,
    pub(crate) is_active: bool,
}

impl NewJob {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        description: impl Into<String>,
        kind: JobKind,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            description: description.into(),
            kind,
            location: None,
            salary_range: None,
            requirements: None,
            posted_by: None,
            is_active: true,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_salary_range(mut self, salary_range: impl Into<String>) -> Self {
        self.salary_range = Some(salary_range.into());
        self
    }

    pub fn with_requirements(mut self, requirements: impl Into<String>) -> Self {
        self.requirements = Some(requirements.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("title", &self.title)?;
        validate_optional_text("title", Some(self.title.as_str()), MAX_JOB_FIELD_LENGTH)?;
        validate_required("company", &self.company)?;
        validate_optional_text("company", Some(self.company.as_str()), MAX_JOB_FIELD_LENGTH)?;
        validate_required("description", &self.description)?;
        validate_optional_text(
            "description",
            Some(self.description.as_str()),
            MAX_JOB_DESCRIPTION_LENGTH,
        )?;
        validate_optional_text(
            "requirements",
            self.requirements.as_deref(),
            MAX_JOB_DESCRIPTION_LENGTH,
        )?;
        validate_optional_text("location", self.location.as_deref(), MAX_JOB_FIELD_LENGTH)?;
        validate_optional_text(
            "salary_range",
            self.salary_range.as_deref(),
            MAX_JOB_FIELD_LENGTH,
        )?;
        Ok(())
    }
}

/// A row of `job_applications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewJobApplication {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
}

/// Job board tab filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobFilter {
    #[default]
    All,
    Only(JobKind),
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        match self {
            JobFilter::All => true,
            JobFilter::Only(kind) => job.kind == *kind,
        }
    }

    /// Number of jobs in `jobs` passing this filter.
    pub fn count(&self, jobs: &[Job]) -> usize {
        jobs.iter().filter(|j| self.matches(j)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(kind: &str) -> Job {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "title": "Backend Engineer",
            "company": "Acme",
            "description": "Build things",
            "type": kind,
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn test_kind_wire_name() {
        let new_job = NewJob::new("Intern", "Acme", "Learn", JobKind::Internship);
        let value = serde_json::to_value(&new_job).unwrap();
        assert_eq!(value["type"], json!("internship"));
        assert_eq!(value["is_active"], json!(true));
        assert!(value.get("posted_by").is_none());

        assert_eq!(job("job").kind, JobKind::Job);
        assert_eq!(JobKind::Internship.display_name(), "Internship");
    }

    #[test]
    fn test_job_with_null_columns() {
        let job: Job = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "title": "Backend Engineer",
            "company": "Acme",
            "description": null,
            "type": null,
            "location": null,
            "salary_range": null,
            "requirements": null,
            "posted_by": null,
            "is_active": null,
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(job.description, None);
        assert_eq!(job.location, None);
        assert_eq!(job.kind, JobKind::Job);
        assert!(!job.is_active);
    }

    #[test]
    fn test_validation() {
        assert!(NewJob::new("Engineer", "Acme", "Build", JobKind::Job)
            .validate()
            .is_ok());
        assert_eq!(
            NewJob::new("Engineer", " ", "Build", JobKind::Job).validate(),
            Err(ValidationError::RequiredField("company"))
        );
        assert_eq!(
            NewJob::new("Engineer", "Acme", "", JobKind::Job).validate(),
            Err(ValidationError::RequiredField("description"))
        );
    }

    #[test]
    fn test_filter() {
        let jobs = vec![job("job"), job("internship"), job("job")];
        assert_eq!(JobFilter::All.count(&jobs), 3);
        assert_eq!(JobFilter::Only(JobKind::Job).count(&jobs), 2);
        assert_eq!(JobFilter::Only(JobKind::Internship).count(&jobs), 1);
    }
}
