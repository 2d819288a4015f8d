use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::error::FlinkError;
use super::types::{ClusterOverview, JobDetails, JobIdWithStatus, JobList};

/// The job-control operations the monitor needs from a Flink cluster.
pub trait JobControl {
    async fn cluster_overview(&self) -> Result<ClusterOverview, FlinkError>;

    async fn list_jobs(&self) -> Result<Vec<JobIdWithStatus>, FlinkError>;

    /// `Ok(None)` when the cluster does not know the job (HTTP 404).
    async fn job_details(&self, job_id: &str) -> Result<Option<JobDetails>, FlinkError>;

    async fn cancel_job(&self, job_id: &str) -> Result<(), FlinkError>;
}

/// REST client for a Flink JobManager.
#[derive(Debug, Clone)]
pub struct FlinkClient {
    client: Client,
    base_url: String,
}

impl FlinkClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FlinkError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FlinkError> {
        let response = self.client.get(self.url(path)).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, FlinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(FlinkError::Api {
        status: status.as_u16(),
        message,
    })
}

impl JobControl for FlinkClient {
    async fn cluster_overview(&self) -> Result<ClusterOverview, FlinkError> {
        self.get_json("/overview").await
    }

    async fn list_jobs(&self) -> Result<Vec<JobIdWithStatus>, FlinkError> {
        let list: JobList = self.get_json("/jobs").await?;
        Ok(list.jobs)
    }

    async fn job_details(&self, job_id: &str) -> Result<Option<JobDetails>, FlinkError> {
        let response = self
            .client
            .get(self.url(&format!("/jobs/{job_id}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        Ok(Some(response.json::<JobDetails>().await?))
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), FlinkError> {
        let response = self
            .client
            .patch(self.url(&format!("/jobs/{job_id}")))
            .query(&[("mode", "cancel")])
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
