//! Automatic restart of a stopped job by resubmitting its SQL script.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::RestartConfig;
use crate::flink::JobControl;
use crate::reconciler::{JobState, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartOutcome {
    Restarted,
    /// Remediation is disabled.
    Skipped,
    Failed(String),
}

impl fmt::Display for RestartOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartOutcome::Restarted => write!(f, "auto restart: job resubmitted"),
            RestartOutcome::Skipped => write!(f, "auto restart: disabled"),
            RestartOutcome::Failed(reason) => {
                write!(f, "auto restart: failed ({reason}), manual action required")
            }
        }
    }
}

pub trait Restarter {
    /// Recreate the job described by `status` from `sql_file`.
    async fn restart(&self, status: &JobStatus, sql_file: &Path) -> RestartOutcome;
}

/// Remediation turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRestart;

impl Restarter for NoRestart {
    async fn restart(&self, _status: &JobStatus, _sql_file: &Path) -> RestartOutcome {
        RestartOutcome::Skipped
    }
}

/// Cancels what is left of the job, then runs `sql-client.sh -f <sql_file>`.
#[derive(Debug, Clone)]
pub struct SqlClientRestarter<C> {
    control: C,
    config: RestartConfig,
}

impl<C: JobControl> SqlClientRestarter<C> {
    pub fn new(control: C, config: RestartConfig) -> Self {
        Self { control, config }
    }

    async fn submit(&self, sql_file: &Path) -> Result<(), String> {
        if !sql_file.exists() {
            return Err(format!("SQL file not found: {}", sql_file.display()));
        }

        let mut command = Command::new(&self.config.sql_client);
        command
            .arg("-f")
            .arg(sql_file)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let timeout = Duration::from_secs(self.config.submit_timeout_secs);
        let output = match tokio::time::timeout(timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(format!(
                    "could not run {}: {e}",
                    self.config.sql_client.display()
                ));
            }
            Err(_) => {
                return Err(format!(
                    "submission timed out after {}s",
                    self.config.submit_timeout_secs
                ));
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr: String = stderr.trim().chars().take(500).collect();
            Err(format!("sql-client exited with {}: {stderr}", output.status))
        }
    }
}

impl<C: JobControl> Restarter for SqlClientRestarter<C> {
    async fn restart(&self, status: &JobStatus, sql_file: &Path) -> RestartOutcome {
        if matches!(status.state, JobState::Failed | JobState::Canceled) {
            match self.control.cancel_job(&status.job_id).await {
                Ok(()) => tracing::info!(job_id = %status.job_id, "job cancelled before resubmit"),
                // Terminal jobs usually reject cancellation; resubmit anyway.
                Err(e) => tracing::warn!(job_id = %status.job_id, error = %e, "cancel before resubmit failed"),
            }
            tokio::time::sleep(Duration::from_secs(self.config.cancel_wait_secs)).await;
        }

        match self.submit(sql_file).await {
            Ok(()) => {
                tracing::info!(job_id = %status.job_id, sql_file = %sql_file.display(), "job resubmitted");
                RestartOutcome::Restarted
            }
            Err(reason) => {
                tracing::error!(job_id = %status.job_id, %reason, "job resubmit failed");
                RestartOutcome::Failed(reason)
            }
        }
    }
}
