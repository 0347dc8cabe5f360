use chrono::{DateTime, TimeZone, Utc};

use super::ClientRecord;
use crate::progress::{compute_deadline, compute_progress, DurationRules, ProgressError};

/// Construction stage of a client's project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectStatus {
    Deposit,
    Building,
    Built,
    Unknown(String),
}

impl ProjectStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "building" => ProjectStatus::Building,
            "deposit" => ProjectStatus::Deposit,
            "built" => ProjectStatus::Built,
            other => ProjectStatus::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Building => write!(f, "building"),
            ProjectStatus::Deposit => write!(f, "deposit"),
            ProjectStatus::Built => write!(f, "built"),
            ProjectStatus::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// Display-ready project derived from a client record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectViewModel {
    pub id: String,
    pub client_name: String,
    pub status: ProjectStatus,
    pub progress: f64,
    pub budget: f64,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub construction_days: i64,
}

impl ProjectViewModel {
    /// Derive the display fields of `record`.
    ///
    /// `construction_days` holds the duration after `rules` were applied, so
    /// the deadline is always that many calendar days after creation in `tz`.
    pub fn from_record<Tz: TimeZone>(
        record: ClientRecord,
        now: &DateTime<Utc>,
        rules: DurationRules,
        tz: &Tz,
    ) -> Result<Self, ProgressError> {
        let construction_days = rules.effective_days(record.construction_days)?;
        let progress = compute_progress(&record.created_at, construction_days, now, rules)?;
        let deadline = compute_deadline(&record.created_at.with_timezone(tz), construction_days, rules)?
            .with_timezone(&Utc);
        let client_name = record.full_name();

        Ok(Self {
            id: record.id,
            client_name,
            status: record.status,
            progress,
            budget: record.total_amount,
            deadline,
            created_at: record.created_at,
            construction_days,
        })
    }
}
