//! Client-side filtering of the alumni directory.

use std::collections::BTreeSet;

use crate::db::Profile;

/// Branches offered by the directory filter.
pub const BRANCHES: [&str; 5] = [
    "Computer Science",
    "Electrical Engineering",
    "Mechanical Engineering",
    "Civil Engineering",
    "Electronics",
];

/// Directory search and filter settings. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
    /// Case-insensitive substring of name, company or profession.
    pub search: Option<String>,
    /// Exact graduation year.
    pub batch: Option<String>,
    /// Exact branch.
    pub branch: Option<String>,
}

impl DirectoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = Some(batch.into());
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Whether `profile` passes every set criterion.
    pub fn matches(&self, profile: &Profile) -> bool {
        if let Some(term) = non_empty(&self.search) {
            let term = term.to_lowercase();
            let hit = |field: Option<&str>| field.is_some_and(|v| v.to_lowercase().contains(&term));
            if !(hit(Some(profile.full_name.as_str()))
                || hit(profile.company.as_deref())
                || hit(profile.profession.as_deref()))
            {
                return false;
            }
        }
        if let Some(batch) = non_empty(&self.batch) {
            if profile.batch.as_deref() != Some(batch) {
                return false;
            }
        }
        if let Some(branch) = non_empty(&self.branch) {
            if profile.branch.as_deref() != Some(branch) {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Keep the profiles matching `filter`, preserving order.
///
/// ```
/// use alumni_connect::directory::{filter_alumni, DirectoryFilter};
///
/// assert!(filter_alumni(&[], &DirectoryFilter::new().search("acme")).is_empty());
/// ```
pub fn filter_alumni(alumni: &[Profile], filter: &DirectoryFilter) -> Vec<Profile> {
    alumni
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect()
}

/// Distinct graduation years present in `alumni`, newest first.
pub fn batches(alumni: &[Profile]) -> Vec<String> {
    let years: BTreeSet<&str> = alumni.iter().filter_map(|p| p.batch.as_deref()).collect();
    years.into_iter().rev().map(str::to_string).collect()
}
