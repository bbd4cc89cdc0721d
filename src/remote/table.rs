//! Remote table names and their uniqueness constraints.

use std::fmt;
use std::str::FromStr;

/// Tables exposed by the data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// One profile row per identity.
    Profiles,
    /// Events published by admins.
    Events,
    /// (event, user) registrations.
    EventRegistrations,
    /// Job and internship postings.
    Jobs,
    /// (job, applicant) applications.
    JobApplications,
    /// (sender, receiver) connection requests.
    ConnectionRequests,
}

impl Table {
    /// All tables, in schema order.
    pub const ALL: [Table; 6] = [
        Table::Profiles,
        Table::Events,
        Table::EventRegistrations,
        Table::Jobs,
        Table::JobApplications,
        Table::ConnectionRequests,
    ];

    /// Name of the table as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Events => "events",
            Table::EventRegistrations => "event_registrations",
            Table::Jobs => "jobs",
            Table::JobApplications => "job_applications",
            Table::ConnectionRequests => "connection_requests",
        }
    }

    /// Columns covered by the table's unique constraint (besides `id`).
    pub fn unique_key(&self) -> &'static [&'static str] {
        match self {
            Table::Profiles => &["user_id"],
            Table::Events | Table::Jobs => &[],
            Table::EventRegistrations => &["event_id", "user_id"],
            Table::JobApplications => &["job_id", "applicant_id"],
            Table::ConnectionRequests => &["sender_id", "receiver_id"],
        }
    }

    /// User-facing message for a uniqueness violation on this table.
    pub fn duplicate_message(&self) -> &'static str {
        match self {
            Table::Profiles => "A profile already exists for this account",
            Table::Events => "This event already exists",
            Table::EventRegistrations => "You are already registered for this event",
            Table::Jobs => "This job already exists",
            Table::JobApplications => "You have already applied for this job",
            Table::ConnectionRequests => "Connection request already sent",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown table: {s}"))
    }
}
