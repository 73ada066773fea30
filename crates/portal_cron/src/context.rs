use portal_event_system::EventSystem;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Shared resources handed to job constructors.
#[derive(Clone)]
pub struct JobContext {
    /// Registry the jobs and the runner fire events on.
    pub events: Arc<EventSystem>,

    /// Directory the temp cleanup job prunes.
    pub scratch_directory: PathBuf,

    /// Files in the scratch directory older than this are deleted.
    pub max_file_age: Duration,
}

impl JobContext {
    pub fn new(events: Arc<EventSystem>) -> Self {
        Self {
            events,
            scratch_directory: std::env::temp_dir().join("portal"),
            max_file_age: Duration::from_secs(24 * 60 * 60),
        }
    }

    pub fn with_scratch_directory(mut self, directory: impl Into<PathBuf>, max_age: Duration) -> Self {
        self.scratch_directory = directory.into();
        self.max_file_age = max_age;
        self
    }
}
