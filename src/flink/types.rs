//! Response bodies of the Flink JobManager REST API.
//!
//! Only the fields the watcher reads are modelled; everything else in the
//! payloads is ignored by serde.

use serde::Deserialize;

/// `GET /overview`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterOverview {
    #[serde(default)]
    pub taskmanagers: u32,
    #[serde(rename = "jobs-running", default)]
    pub jobs_running: u32,
    #[serde(rename = "jobs-failed", default)]
    pub jobs_failed: u32,
    #[serde(rename = "flink-version", default)]
    pub flink_version: Option<String>,
}

impl ClusterOverview {
    /// A cluster without task managers cannot run anything.
    pub fn is_healthy(&self) -> bool {
        self.taskmanagers > 0
    }
}

/// `GET /jobs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<JobIdWithStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobIdWithStatus {
    pub id: String,
    pub status: String,
}

/// `GET /jobs/{jid}`
#[derive(Debug, Clone, Deserialize)]
pub struct JobDetails {
    pub jid: String,
    #[serde(default)]
    pub name: String,
    pub state: String,
    /// Milliseconds since the job started.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub metrics: VertexMetrics,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VertexMetrics {
    #[serde(rename = "read-records", default)]
    pub read_records: u64,
    #[serde(rename = "read-bytes", default)]
    pub read_bytes: u64,
}

impl JobDetails {
    /// Sum of records and bytes read across all vertices.
    pub fn read_totals(&self) -> (u64, u64) {
        self.vertices.iter().fold((0, 0), |(records, bytes), v| {
            (records + v.metrics.read_records, bytes + v.metrics.read_bytes)
        })
    }
}
