use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The coarse job states the reconciler distinguishes.
///
/// Flink reports many more lifecycle states (`CREATED`, `RESTARTING`,
/// `FINISHED`, ...); anything outside the three we act on collapses to
/// [`JobState::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Running,
    Failed,
    Canceled,
    NotFound,
    Unknown,
}

impl JobState {
    /// Map a raw Flink `state` string onto a [`JobState`].
    pub fn from_flink(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => JobState::Running,
            "FAILED" => JobState::Failed,
            "CANCELED" | "CANCELLED" => JobState::Canceled,
            _ => JobState::Unknown,
        }
    }

    /// States that warrant a restart attempt when entered.
    pub fn is_restartable(self) -> bool {
        matches!(
            self,
            JobState::Failed | JobState::Canceled | JobState::NotFound
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "RUNNING"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::Canceled => write!(f, "CANCELED"),
            JobState::NotFound => write!(f, "NOT_FOUND"),
            JobState::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Last-known observation of one monitored job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub state: JobState,
    pub observed_at: DateTime<Utc>,
    /// Human-readable job name as reported by Flink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    /// The untranslated Flink state, kept for alert context only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flink_state: Option<String>,
    /// When auto-restart last resubmitted this job. Cleared once the job is
    /// observed in a state that is not restartable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restarted_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    pub fn new(job_id: impl Into<String>, state: JobState) -> Self {
        Self {
            job_id: job_id.into(),
            state,
            observed_at: Utc::now(),
            job_name: None,
            flink_state: None,
            restarted_at: None,
        }
    }

    /// Build an observation from a Flink job details response.
    pub fn observed(job_id: impl Into<String>, name: Option<String>, raw_state: &str) -> Self {
        Self {
            job_name: name,
            flink_state: Some(raw_state.to_string()),
            ..Self::new(job_id, JobState::from_flink(raw_state))
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = Some(name.into());
        self
    }

    /// Name when known, otherwise the job id.
    pub fn display_name(&self) -> &str {
        self.job_name.as_deref().unwrap_or(&self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_flink_states() {
        assert_eq!(JobState::from_flink("RUNNING"), JobState::Running);
        assert_eq!(JobState::from_flink("FAILED"), JobState::Failed);
        assert_eq!(JobState::from_flink("CANCELED"), JobState::Canceled);
        assert_eq!(JobState::from_flink("running"), JobState::Running);
        assert_eq!(JobState::from_flink("RESTARTING"), JobState::Unknown);
        assert_eq!(JobState::from_flink("FINISHED"), JobState::Unknown);
        assert_eq!(JobState::from_flink(""), JobState::Unknown);
    }

    #[test]
    fn restartable_states() {
        assert!(JobState::Failed.is_restartable());
        assert!(JobState::Canceled.is_restartable());
        assert!(JobState::NotFound.is_restartable());
        assert!(!JobState::Running.is_restartable());
        assert!(!JobState::Unknown.is_restartable());
    }

    #[test]
    fn state_display() {
        assert_eq!(JobState::Running.to_string(), "RUNNING");
        assert_eq!(JobState::NotFound.to_string(), "NOT_FOUND");
    }

    #[test]
    fn state_serializes_screaming_snake() {
        let json = serde_json::to_string(&JobState::NotFound).unwrap();
        assert_eq!(json, r#""NOT_FOUND""#);
        let parsed: JobState = serde_json::from_str(r#""CANCELED""#).unwrap();
        assert_eq!(parsed, JobState::Canceled);
    }

    #[test]
    fn observed_keeps_raw_state() {
        let status = JobStatus::observed("abc", Some("cdc".into()), "RESTARTING");
        assert_eq!(status.state, JobState::Unknown);
        assert_eq!(status.flink_state.as_deref(), Some("RESTARTING"));
        assert_eq!(status.display_name(), "cdc");
    }

    #[test]
    fn optional_fields_are_omitted() {
        let status = JobStatus::new("abc", JobState::Running);
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("job_name"));
        assert!(!json.contains("flink_state"));
        assert!(!json.contains("restarted_at"));
        assert_eq!(status.display_name(), "abc");
    }
}
