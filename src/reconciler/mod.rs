mod debounce;
mod reconcile;
mod state;

pub use debounce::FailureDebounce;
pub use reconcile::{AlertEvent, Severity, reconcile};
pub use state::{JobState, JobStatus};
