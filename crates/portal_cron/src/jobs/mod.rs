//! Built-in cron jobs.

pub mod heartbeat;
pub mod temp_cleanup;

pub use heartbeat::HeartbeatJob;
pub use temp_cleanup::TempCleanupJob;

use crate::table::JobTable;

/// Adds every built-in job to `table`.
pub fn register_builtin(table: &mut JobTable) {
    heartbeat::register(table);
    temp_cleanup::register(table);
}
