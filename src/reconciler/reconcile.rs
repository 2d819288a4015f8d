use std::fmt;

use chrono::{DateTime, Utc};

use super::state::{JobState, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single notification, built and sent once, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub severity: Severity,
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(severity: Severity, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            body: body.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, body)
    }

    /// Append one line to the alert body.
    pub fn push_line(&mut self, line: impl AsRef<str>) {
        if !self.body.is_empty() {
            self.body.push('\n');
        }
        self.body.push_str(line.as_ref());
    }
}

/// Compare the previous and freshly observed status of one job.
///
/// Returns an alert only when the state changed (or when there is no
/// previous record), together with the status to persist. The returned
/// status is always `current`.
pub fn reconcile(
    previous: Option<&JobStatus>,
    current: JobStatus,
) -> (Option<AlertEvent>, JobStatus) {
    if let Some(prev) = previous
        && prev.state == current.state
    {
        return (None, current);
    }

    let alert = transition_alert(previous.map(|p| p.state), &current);
    (Some(alert), current)
}

fn transition_alert(from: Option<JobState>, current: &JobStatus) -> AlertEvent {
    let name = current.display_name();
    let mut alert = match current.state {
        JobState::Running => AlertEvent::info(
            format!("Flink job {name} running"),
            match from {
                None => "Job started".to_string(),
                Some(_) => "Job recovered".to_string(),
            },
        ),
        JobState::Failed | JobState::Canceled => AlertEvent::error(
            format!("Flink job {name} failed"),
            "Job stopped unexpectedly",
        ),
        JobState::NotFound => AlertEvent::error(
            format!("Flink job {name} not found"),
            "Job disappeared from the cluster",
        ),
        JobState::Unknown => AlertEvent::error(
            format!("Flink job {name} in unexpected state"),
            format!(
                "Flink reports state {}",
                current.flink_state.as_deref().unwrap_or("UNKNOWN")
            ),
        ),
    };

    alert.push_line(format!("job id: {}", current.job_id));
    if let Some(job_name) = &current.job_name {
        alert.push_line(format!("job name: {job_name}"));
    }
    match from {
        Some(prev) => alert.push_line(format!("state: {prev} -> {}", current.state)),
        None => alert.push_line(format!("state: {}", current.state)),
    }
    alert
}
