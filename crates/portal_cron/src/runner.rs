//! The cron runner: discover, then instantiate, execute and report each job.

use crate::context::JobContext;
use crate::discovery::{discover_jobs, JobDescriptor};
use crate::job::JobError;
use crate::report::{JobReport, RunOutcome, RunReport};
use crate::table::JobTable;
use crate::CronError;
use futures::FutureExt;
use portal_event_system::{
    panic_message, CronJobEvent, CronRunFinishedEvent, Event, CRON_JOB_COMPLETED,
    CRON_JOB_FAILED, CRON_RUN_FINISHED,
};
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// Where to look for jobs and how to name them.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub jobs_directory: PathBuf,
    /// Descriptor file extension, without the dot
    pub extension: String,
    /// Prefix for qualified job names in output
    pub namespace: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            jobs_directory: PathBuf::from("cron"),
            extension: "job".to_string(),
            namespace: "cron::jobs".to_string(),
        }
    }
}

pub struct CronRunner {
    config: RunnerConfig,
    table: JobTable,
    context: JobContext,
}

impl CronRunner {
    pub fn new(config: RunnerConfig, table: JobTable, context: JobContext) -> Self {
        Self {
            config,
            table,
            context,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Lists the jobs a run would process, without running anything.
    pub async fn discover(&self) -> Result<Vec<JobDescriptor>, CronError> {
        discover_jobs(
            &self.config.jobs_directory,
            &self.config.extension,
            &self.config.namespace,
        )
        .await
    }

    /// Runs every discovered job once, writing progress to stdout.
    ///
    /// Stdout is locked per line only, so jobs and loggers on other threads
    /// can still write while a job is running.
    pub async fn run(&self) -> Result<RunReport, CronError> {
        self.run_with_output(&mut std::io::stdout()).await
    }

    /// Runs every discovered job once, writing progress to `out`.
    ///
    /// Only a failed discovery aborts the run. Missing and failing jobs are
    /// recorded in the report and the batch moves on to the next job.
    pub async fn run_with_output<W: Write>(&self, out: &mut W) -> Result<RunReport, CronError> {
        let started = Instant::now();
        write_line(out, "=== Portal cron run started ===");

        let descriptors = match self.discover().await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                write_line(out, &format!("[cron] ERROR {}", e));
                return Err(e);
            }
        };
        info!("Discovered {} cron jobs", descriptors.len());

        let mut report = RunReport::default();
        for descriptor in descriptors {
            let job_report = self.run_one(&descriptor, out).await;
            self.announce(&job_report).await;
            report.jobs.push(job_report);
        }

        report.elapsed = started.elapsed();
        write_line(
            out,
            &format!(
                "=== Cron run finished in {:.2} seconds ({} completed, {} failed, {} not found) ===",
                report.elapsed.as_secs_f64(),
                report.completed(),
                report.failed(),
                report.not_found()
            ),
        );

        self.fire(
            CRON_RUN_FINISHED,
            &CronRunFinishedEvent {
                completed: report.completed(),
                failed: report.failed(),
                not_found: report.not_found(),
                elapsed_secs: report.elapsed.as_secs_f64(),
            },
        )
        .await;

        Ok(report)
    }

    async fn run_one<W: Write>(&self, descriptor: &JobDescriptor, out: &mut W) -> JobReport {
        let started = Instant::now();
        let qualified = &descriptor.qualified_name;

        let outcome = match self.table.instantiate(&descriptor.name, &self.context) {
            None => {
                warn!("Cron job {} has no registered implementation", qualified);
                write_line(out, &format!("[cron] {} not found, skipping", qualified));
                RunOutcome::NotFound
            }
            Some(job) => {
                write_line(out, &format!("[cron] Running {}...", qualified));

                let result = AssertUnwindSafe(job.run())
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic_info| Err(JobError::Panicked(panic_message(panic_info))));

                match result {
                    Ok(()) => {
                        info!("Cron job {} completed", qualified);
                        write_line(
                            out,
                            &format!(
                                "[cron] {} completed in {:.3}s",
                                qualified,
                                started.elapsed().as_secs_f64()
                            ),
                        );
                        RunOutcome::Completed
                    }
                    Err(e) => {
                        error!("Cron job {} failed: {}", qualified, e);
                        write_line(out, &format!("[cron] ERROR in {}: {}", qualified, e));
                        RunOutcome::Failed(e.to_string())
                    }
                }
            }
        };

        JobReport {
            name: descriptor.name.clone(),
            qualified_name: descriptor.qualified_name.clone(),
            outcome,
            elapsed: started.elapsed(),
        }
    }

    async fn announce(&self, job: &JobReport) {
        let (event_id, message) = match &job.outcome {
            RunOutcome::Completed => (CRON_JOB_COMPLETED, None),
            RunOutcome::NotFound => (CRON_JOB_FAILED, Some("no registered implementation".to_string())),
            RunOutcome::Failed(message) => (CRON_JOB_FAILED, Some(message.clone())),
        };

        self.fire(
            event_id,
            &CronJobEvent {
                job: job.qualified_name.clone(),
                status: job.outcome.label().to_string(),
                message,
                elapsed_secs: job.elapsed.as_secs_f64(),
            },
        )
        .await;
    }

    async fn fire<T: Event>(&self, event_id: &str, event: &T) {
        if let Err(e) = self.context.events.emit(event_id, event).await {
            warn!("Failed to emit {}: {}", event_id, e);
        }
    }
}

/// Progress output never aborts a run.
fn write_line<W: Write>(out: &mut W, line: &str) {
    if let Err(e) = writeln!(out, "{}", line) {
        warn!("Failed to write cron progress: {}", e);
    }
}
