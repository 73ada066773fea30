//! Lifecycle event identifiers and their payloads.
//!
//! Identifiers are owned by the component that defines the lifecycle point;
//! they live here so that publishers and plugin modules share one spelling.

use serde::{Deserialize, Serialize};

/// Fired once by the application root after every plugin has registered.
pub const APP_LOAD: &str = "app.load";
/// Fired by the login flow when a credential pair is rejected.
pub const AUTH_LOGIN_FAILED: &str = "auth.login.failed";
/// Fired by the login flow after a successful authentication.
pub const AUTH_LOGIN_SUCCESS: &str = "auth.login.success";

/// Fired by the built-in heartbeat job.
pub const CRON_HEARTBEAT: &str = "cron.heartbeat";
/// Fired by the cron runner after a job's `run` returned successfully.
pub const CRON_JOB_COMPLETED: &str = "cron.job.completed";
/// Fired by the cron runner when a job failed or was not found.
pub const CRON_JOB_FAILED: &str = "cron.job.failed";
/// Fired by the cron runner once every discovered job was processed.
pub const CRON_RUN_FINISHED: &str = "cron.run.finished";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLoadEvent {
    pub app_name: String,
    pub version: String,
    pub timestamp: u64,
}

/// Payload of [`AUTH_LOGIN_FAILED`]: the identifier the user typed and why it
/// was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFailedEvent {
    pub auth: String,
    pub reason: String,
    pub timestamp: u64,
}

/// Payload of [`AUTH_LOGIN_SUCCESS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSuccessEvent {
    /// Account login of the authenticated user
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    pub timestamp: u64,
}

/// Payload of [`CRON_JOB_COMPLETED`] and [`CRON_JOB_FAILED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CronJobEvent {
    pub job: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CronRunFinishedEvent {
    pub completed: usize,
    pub failed: usize,
    pub not_found: usize,
    pub elapsed_secs: f64,
}
