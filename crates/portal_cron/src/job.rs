use async_trait::async_trait;

/// A unit of cron work.
///
/// Instances are built fresh for every run by the [`JobTable`](crate::JobTable),
/// `run` is called exactly once, then the instance is dropped.
#[async_trait]
pub trait CronJob: Send + Sync {
    /// Bare job name, matching the descriptor file stem.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    /// Does the work. Failures are reported through the returned error;
    /// the runner also converts panics into failures.
    async fn run(&self) -> Result<(), JobError>;
}

/// Errors that can occur during job execution.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Job panicked: {0}")]
    Panicked(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Event error: {0}")]
    Event(#[from] portal_event_system::EventError),
}
