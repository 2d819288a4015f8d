pub mod client;
pub mod error;
pub mod types;

pub use client::{FlinkClient, JobControl};
pub use error::FlinkError;
pub use types::{ClusterOverview, JobDetails, JobIdWithStatus};
