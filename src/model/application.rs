use super::{ProjectId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ApplicationId(pub i64);

/// Lifecycle of an application: pending until a professor decides, then
/// accepted or rejected. Decisions overwrite unconditionally, so a decided
/// application can legally be re-decided.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FromStr for ApplicationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        })
    }
}

/// One student's request to join one project. At most one exists per
/// (student, project) pair, enforced by the store.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: UserId,
    pub project_id: ProjectId,
    pub status: ApplicationStatus,
    pub previous_experience: String,
    pub why_join: String,
    pub applied_at: DateTime<Utc>,
}

/// One row of a professor's flattened applicant list: applicant profile,
/// project title, status and both free-text answers in a single record.
/// `email` carries the applicant's username; accounts have no separate
/// email column.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRow {
    pub id: ApplicationId,
    pub name: String,
    pub email: String,
    pub project_id: ProjectId,
    pub project_title: String,
    pub status: ApplicationStatus,
    pub applied_date: String,
    pub university: Option<String>,
    pub batch: Option<i64>,
    pub department: Option<String>,
    pub previous_experience: String,
    pub why_join: String,
}
