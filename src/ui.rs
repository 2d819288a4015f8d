//! Terminal output for the `status` and `check` commands.
//!
//! Uses `console` for colors: green for running jobs, red for stopped or
//! missing ones, yellow for anything Flink reports that we do not model.

use console::Style;

use crate::monitor::CycleReport;
use crate::reconciler::{JobState, JobStatus};

pub struct StatusTable {
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl Default for StatusTable {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }
}

impl StatusTable {
    fn style_for(&self, state: JobState) -> &Style {
        match state {
            JobState::Running => &self.green,
            JobState::Failed | JobState::Canceled | JobState::NotFound => &self.red,
            JobState::Unknown => &self.yellow,
        }
    }

    /// One line per record: key, state, name and when it was observed.
    pub fn render(&self, records: &[(String, JobStatus)]) -> Vec<String> {
        records
            .iter()
            .map(|(key, status)| {
                let observed = status.observed_at.format("%Y-%m-%d %H:%M:%S UTC");
                let state = format!("{:<9}", status.state.to_string());
                format!(
                    "{:<34} {} {} {}",
                    key,
                    self.style_for(status.state).apply_to(state),
                    status.display_name(),
                    self.dim.apply_to(format!("({observed})"))
                )
            })
            .collect()
    }

    pub fn print(&self, records: &[(String, JobStatus)]) {
        if records.is_empty() {
            println!("{}", self.dim.apply_to("No job status recorded yet."));
            return;
        }
        for line in self.render(records) {
            println!("{line}");
        }
    }

    pub fn print_report(&self, report: &CycleReport) {
        let cluster = if report.cluster_healthy {
            self.green.apply_to("healthy")
        } else {
            self.red.apply_to("unreachable")
        };
        println!(
            "cluster {cluster}, {} job(s) checked, {} fetch failure(s), {} alert(s) sent, {} failed, {} restart(s)",
            report.jobs_checked,
            report.fetch_failures,
            report.alerts_sent,
            report.alert_failures,
            report.restarts
        );
    }
}
