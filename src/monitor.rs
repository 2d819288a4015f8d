use std::collections::HashMap;

use chrono::Utc;
use tracing::Instrument;

use crate::alert::AlertSink;
use crate::config::{JobTarget, Selector};
use crate::flink::{FlinkError, JobControl, JobDetails};
use crate::reconciler::{AlertEvent, FailureDebounce, JobState, JobStatus, reconcile};
use crate::remediation::{RestartOutcome, Restarter};
use crate::scheduler::Cycle;
use crate::store::StatusStore;

const CLUSTER_KEY: &str = "<cluster>";

/// What one polling cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cluster_healthy: bool,
    pub jobs_checked: usize,
    pub fetch_failures: usize,
    pub alerts_sent: usize,
    pub alert_failures: usize,
    pub restarts: usize,
}

/// Polls the configured jobs and turns state changes into alerts.
pub struct JobMonitor<C, A, S, R> {
    control: C,
    sink: A,
    store: S,
    restarter: R,
    targets: Vec<JobTarget>,
    threshold: u32,
    debounces: HashMap<String, FailureDebounce>,
}

impl<C, A, S, R> JobMonitor<C, A, S, R>
where
    C: JobControl,
    A: AlertSink,
    S: StatusStore,
    R: Restarter,
{
    pub fn new(
        control: C,
        sink: A,
        store: S,
        restarter: R,
        targets: Vec<JobTarget>,
        threshold: u32,
    ) -> Self {
        Self {
            control,
            sink,
            store,
            restarter,
            targets,
            threshold,
            debounces: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one full cycle: cluster probe, then every target in order.
    pub async fn poll(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        let span = tracing::info_span!("poll_cycle", targets = self.targets.len());
        self.poll_into(&mut report).instrument(span).await;
        tracing::info!(
            healthy = report.cluster_healthy,
            checked = report.jobs_checked,
            fetch_failures = report.fetch_failures,
            alerts = report.alerts_sent,
            alert_failures = report.alert_failures,
            restarts = report.restarts,
            "poll cycle finished"
        );
        report
    }

    async fn poll_into(&mut self, report: &mut CycleReport) {
        if let Err(reason) = self.probe_cluster().await {
            tracing::warn!(%reason, "Flink cluster check failed, skipping job checks");
            if let Some(streak) = self.debounce(CLUSTER_KEY).record_failure() {
                let alert = AlertEvent::error(
                    "Flink cluster unreachable",
                    format!("Cluster health check failed {streak} consecutive times: {reason}"),
                );
                self.deliver(alert, report).await;
            }
            return;
        }
        self.debounce(CLUSTER_KEY).record_success();
        report.cluster_healthy = true;

        let targets = self.targets.clone();
        for target in &targets {
            self.check_target(target, report).await;
        }
    }

    async fn probe_cluster(&self) -> Result<(), String> {
        let overview = self
            .control
            .cluster_overview()
            .await
            .map_err(|e| e.to_string())?;
        tracing::debug!(
            taskmanagers = overview.taskmanagers,
            jobs_running = overview.jobs_running,
            jobs_failed = overview.jobs_failed,
            version = overview.flink_version.as_deref().unwrap_or("unknown"),
            "cluster overview"
        );
        if overview.is_healthy() {
            Ok(())
        } else {
            Err("no TaskManager available".to_string())
        }
    }

    async fn check_target(&mut self, target: &JobTarget, report: &mut CycleReport) {
        let key = target.fallback_key();

        let mut observed = match self.observe(target, &key).await {
            Ok(observed) => observed,
            Err(e) => {
                report.fetch_failures += 1;
                tracing::warn!(job = %key, error = %e, "job status fetch failed");
                if let Some(streak) = self.debounce(&key).record_failure() {
                    let alert = AlertEvent::error(
                        "Flink API unreachable",
                        format!(
                            "Status of job {key} could not be fetched {streak} consecutive times: {e}"
                        ),
                    );
                    self.deliver(alert, report).await;
                }
                return;
            }
        };
        self.debounce(&key).record_success();
        report.jobs_checked += 1;

        let previous = self.store.load(&key).unwrap_or_else(|e| {
            tracing::warn!(job = %key, error = %e, "could not load previous status");
            None
        });
        // A vanished job keeps the name it was last seen under.
        if observed.job_name.is_none()
            && let Some(name) = previous.as_ref().and_then(|p| p.job_name.clone())
        {
            observed.job_name = Some(name);
        }

        let (alert, mut current) = reconcile(previous.as_ref(), observed);
        tracing::info!(job = %key, state = %current.state, name = current.display_name(), "job state");

        // The restart mark survives until the target is seen healthy again.
        if current.state.is_restartable()
            && let Some(prev) = &previous
            && prev.state.is_restartable()
        {
            current.restarted_at = prev.restarted_at;
        }

        if let Some(mut alert) = alert {
            if current.state.is_restartable()
                && let Some(sql_file) = target.sql_file.as_deref()
            {
                match current.restarted_at {
                    Some(at) => {
                        tracing::info!(job = %key, restarted_at = %at, "job already resubmitted, not restarting again");
                        alert.push_line(format!(
                            "auto restart: already resubmitted at {}, not repeated",
                            at.format("%Y-%m-%d %H:%M:%S UTC")
                        ));
                    }
                    None => {
                        let outcome = self.restarter.restart(&current, sql_file).await;
                        if outcome == RestartOutcome::Restarted {
                            report.restarts += 1;
                            current.restarted_at = Some(Utc::now());
                        }
                        if outcome != RestartOutcome::Skipped {
                            alert.push_line(outcome.to_string());
                        }
                    }
                }
            }
            self.deliver(alert, report).await;
        }

        if let Err(e) = self.store.save(&key, &current) {
            tracing::error!(job = %key, error = %e, "could not persist status");
        }
    }

    async fn observe(&self, target: &JobTarget, key: &str) -> Result<JobStatus, FlinkError> {
        let label = target.label.as_deref();
        let found = match target.selector() {
            Ok(Selector::Id(id)) => self.control.job_details(id).await?,
            Ok(Selector::NameContains(needle)) => self.find_by_name(needle).await?,
            // Targets are validated at startup.
            Err(_) => None,
        };

        let status = match found {
            Some(details) => {
                log_job_metrics(&details);
                let name = Some(details.name.clone())
                    .filter(|n| !n.is_empty())
                    .or_else(|| label.map(str::to_string));
                JobStatus::observed(details.jid, name, &details.state)
            }
            None => {
                let status = JobStatus::new(key, JobState::NotFound);
                match label {
                    Some(label) => status.with_name(label),
                    None => status,
                }
            }
        };
        Ok(status)
    }

    /// First job whose name contains `needle`, preferring a running one so a
    /// failed predecessor kept in Flink's history does not shadow it.
    async fn find_by_name(&self, needle: &str) -> Result<Option<JobDetails>, FlinkError> {
        let needle = needle.to_lowercase();
        let mut first_match = None;
        for job in self.control.list_jobs().await? {
            tracing::debug!(id = %job.id, status = %job.status, "listed job");
            let Some(details) = self.control.job_details(&job.id).await? else {
                continue;
            };
            if !details.name.to_lowercase().contains(&needle) {
                continue;
            }
            if JobState::from_flink(&details.state) == JobState::Running {
                return Ok(Some(details));
            }
            if first_match.is_none() {
                first_match = Some(details);
            }
        }
        Ok(first_match)
    }

    async fn deliver(&self, alert: AlertEvent, report: &mut CycleReport) {
        match self.sink.send(&alert).await {
            Ok(()) => report.alerts_sent += 1,
            Err(e) => {
                report.alert_failures += 1;
                tracing::error!(title = %alert.title, error = %e, "alert delivery failed");
            }
        }
    }

    fn debounce(&mut self, key: &str) -> &mut FailureDebounce {
        let threshold = self.threshold;
        self.debounces
            .entry(key.to_string())
            .or_insert_with(|| FailureDebounce::new(threshold))
    }
}

fn log_job_metrics(details: &JobDetails) {
    if JobState::from_flink(&details.state) != JobState::Running {
        return;
    }
    let (records, bytes) = details.read_totals();
    tracing::info!(
        job = %details.jid,
        duration_ms = details.duration,
        read_records = records,
        read_bytes = bytes,
        "job metrics"
    );
}

impl<C, A, S, R> Cycle for JobMonitor<C, A, S, R>
where
    C: JobControl,
    A: AlertSink,
    S: StatusStore,
    R: Restarter,
{
    async fn run_cycle(&mut self) {
        self.poll().await;
    }
}
