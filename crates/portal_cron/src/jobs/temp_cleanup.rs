//! Temp cleanup job.
//!
//! Deletes regular files in the scratch directory whose modification time is
//! older than the configured maximum age. Subdirectories are left alone, and
//! a scratch directory that does not exist yet has nothing to clean.

use crate::context::JobContext;
use crate::job::{CronJob, JobError};
use crate::table::JobTable;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

pub const NAME: &str = "TempCleanup";

pub struct TempCleanupJob {
    directory: PathBuf,
    max_age: Duration,
}

impl TempCleanupJob {
    pub fn new(ctx: &JobContext) -> Self {
        Self {
            directory: ctx.scratch_directory.clone(),
            max_age: ctx.max_file_age,
        }
    }
}

#[async_trait]
impl CronJob for TempCleanupJob {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Delete stale files from the scratch directory"
    }

    async fn run(&self) -> Result<(), JobError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    "Scratch directory {} does not exist, nothing to clean",
                    self.directory.display()
                );
                return Ok(());
            }
            Err(e) => {
                return Err(JobError::ExecutionFailed(format!(
                    "Cannot read scratch directory {}: {}",
                    self.directory.display(),
                    e
                )))
            }
        };

        let now = SystemTime::now();
        let mut deleted = 0usize;
        let mut kept = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            // Files with a modification time in the future count as fresh.
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < self.max_age {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!("Cannot remove {}: {}", entry.path().display(), e);
                    kept += 1;
                }
            }
        }

        if deleted > 0 {
            info!(
                "🧹 Removed {} stale files from {}",
                deleted,
                self.directory.display()
            );
        }
        if kept > 0 {
            warn!(
                "🧹 {} stale files in {} could not be removed",
                kept,
                self.directory.display()
            );
        }
        Ok(())
    }
}

pub fn register(table: &mut JobTable) {
    table.register(NAME, |ctx| Box::new(TempCleanupJob::new(ctx)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_event_system::create_portal_event_system;
    use std::fs;
    use tempfile::TempDir;

    fn job_for(dir: &std::path::Path, max_age: Duration) -> TempCleanupJob {
        let ctx = JobContext::new(create_portal_event_system()).with_scratch_directory(dir, max_age);
        TempCleanupJob::new(&ctx)
    }

    #[test]
    fn test_job_metadata() {
        let job = job_for(std::path::Path::new("/tmp"), Duration::from_secs(60));

        assert_eq!(job.name(), "TempCleanup");
        assert!(!job.description().is_empty());
    }

    #[tokio::test]
    async fn test_removes_stale_files_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.tmp"), b"a").unwrap();
        fs::write(dir.path().join("b.tmp"), b"b").unwrap();
        fs::create_dir(dir.path().join("keep")).unwrap();

        job_for(dir.path(), Duration::ZERO).run().await.unwrap();

        assert!(!dir.path().join("a.tmp").exists());
        assert!(!dir.path().join("b.tmp").exists());
        assert!(dir.path().join("keep").is_dir());
    }

    #[tokio::test]
    async fn test_keeps_fresh_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fresh.tmp"), b"x").unwrap();

        job_for(dir.path(), Duration::from_secs(3600))
            .run()
            .await
            .unwrap();

        assert!(dir.path().join("fresh.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_directory_is_nothing_to_clean() {
        let dir = TempDir::new().unwrap();
        let job = job_for(&dir.path().join("gone"), Duration::ZERO);

        job.run().await.unwrap();
        assert!(!dir.path().join("gone").exists());
    }

    #[tokio::test]
    async fn test_unreadable_directory_fails() {
        let dir = TempDir::new().unwrap();
        let not_a_dir = dir.path().join("scratch");
        fs::write(&not_a_dir, b"plain file").unwrap();

        let result = job_for(&not_a_dir, Duration::ZERO).run().await;
        assert!(matches!(result, Err(JobError::ExecutionFailed(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_undeletable_files_do_not_fail_the_job() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.tmp"), b"a").unwrap();
        fs::write(dir.path().join("b.tmp"), b"b").unwrap();
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not bind root.
        if fs::write(dir.path().join("write-check"), b"").is_ok() {
            fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = job_for(dir.path(), Duration::ZERO).run().await;
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

        result.unwrap();
        assert!(dir.path().join("a.tmp").exists());
        assert!(dir.path().join("b.tmp").exists());
    }
}
