use thiserror::Error;

use crate::flink::FlinkError;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Flink error: {0}")]
    Flink(#[from] FlinkError),

    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    #[error("Status store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("webhook returned status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
