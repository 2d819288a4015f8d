//! Error types for the Flink REST client.

use thiserror::Error;

/// Failures talking to the Flink JobManager REST endpoint.
///
/// A 404 on a job lookup is not an error: it is reported as a missing job
/// so the reconciler can treat it as a `NOT_FOUND` transition.
#[derive(Debug, Error)]
pub enum FlinkError {
    /// The endpoint answered with a non-success status.
    #[error("Flink API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (DNS, refused connection, timeout, bad body).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
