//! Activity log plugin.
//!
//! Writes one structured log line per lifecycle event, whatever its payload,
//! and reports how many it saw on shutdown.

use async_trait::async_trait;
use portal_event_system::{
    EventSystem, PluginError, SimplePlugin, APP_LOAD, AUTH_LOGIN_FAILED, AUTH_LOGIN_SUCCESS,
    CRON_HEARTBEAT, CRON_JOB_COMPLETED, CRON_JOB_FAILED, CRON_RUN_FINISHED,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Every identifier the plugin listens on.
pub const TRACKED_EVENTS: &[&str] = &[
    APP_LOAD,
    AUTH_LOGIN_SUCCESS,
    AUTH_LOGIN_FAILED,
    CRON_HEARTBEAT,
    CRON_JOB_COMPLETED,
    CRON_JOB_FAILED,
    CRON_RUN_FINISHED,
];

pub struct ActivityLogPlugin {
    name: String,
    events_logged: Arc<AtomicU32>,
    start_time: Instant,
}

impl ActivityLogPlugin {
    pub fn new() -> Self {
        Self {
            name: "activity_log".to_string(),
            events_logged: Arc::new(AtomicU32::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn events_logged(&self) -> u32 {
        self.events_logged.load(Ordering::Relaxed)
    }
}

impl Default for ActivityLogPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimplePlugin for ActivityLogPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn register_handlers(&mut self, events: Arc<EventSystem>) -> Result<(), PluginError> {
        for &event_id in TRACKED_EVENTS {
            let counter = self.events_logged.clone();
            events
                .on(event_id, move |payload: serde_json::Value| {
                    let seen = counter.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(target: "activity", event = event_id, seen, "📝 {}", payload);
                    Ok(())
                })
                .await
                .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn on_init(&mut self, _events: Arc<EventSystem>) -> Result<(), PluginError> {
        info!(
            "📝 ActivityLogPlugin: watching {} event types",
            TRACKED_EVENTS.len()
        );
        Ok(())
    }

    async fn on_shutdown(&mut self, _events: Arc<EventSystem>) -> Result<(), PluginError> {
        info!(
            "📝 ActivityLogPlugin: logged {} events over {:.1} seconds",
            self.events_logged(),
            self.start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
