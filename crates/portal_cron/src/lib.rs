//! # Portal Cron
//!
//! A batch runner for maintenance jobs. Each file in the jobs directory names
//! one job; the runner looks the name up in a static [`JobTable`], builds a
//! fresh instance, runs it and reports the outcome. A failing or missing job
//! never stops the rest of the batch.
//!
//! ```rust,no_run
//! use portal_cron::{jobs, CronRunner, JobContext, JobTable, RunnerConfig};
//! use portal_event_system::create_portal_event_system;
//!
//! # async fn example() -> Result<(), portal_cron::CronError> {
//! let mut table = JobTable::new();
//! jobs::register_builtin(&mut table);
//!
//! let ctx = JobContext::new(create_portal_event_system());
//! let runner = CronRunner::new(RunnerConfig::default(), table, ctx);
//! let report = runner.run().await?;
//! println!("{} jobs completed", report.completed());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod discovery;
pub mod job;
pub mod jobs;
pub mod report;
pub mod runner;
pub mod table;

pub use context::JobContext;
pub use discovery::{discover_jobs, JobDescriptor};
pub use job::{CronJob, JobError};
pub use report::{JobReport, RunOutcome, RunReport};
pub use runner::{CronRunner, RunnerConfig};
pub use table::{JobConstructor, JobTable};

pub use async_trait::async_trait;

use std::path::PathBuf;

/// Errors that abort a whole cron run.
#[derive(Debug, thiserror::Error)]
pub enum CronError {
    #[error("Cannot read jobs directory {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
