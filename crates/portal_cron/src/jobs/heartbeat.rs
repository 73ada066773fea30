//! Heartbeat job.
//!
//! Fires `cron.heartbeat` so listeners can tell the scheduler is alive.

use crate::context::JobContext;
use crate::job::{CronJob, JobError};
use crate::table::JobTable;
use async_trait::async_trait;
use portal_event_system::{current_timestamp, EventSystem, HeartbeatEvent, CRON_HEARTBEAT};
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "Heartbeat";

pub struct HeartbeatJob {
    events: Arc<EventSystem>,
}

impl HeartbeatJob {
    pub fn new(ctx: &JobContext) -> Self {
        Self {
            events: Arc::clone(&ctx.events),
        }
    }
}

#[async_trait]
impl CronJob for HeartbeatJob {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Announce that the cron runner is alive"
    }

    async fn run(&self) -> Result<(), JobError> {
        let timestamp = current_timestamp();
        debug!("💓 Heartbeat at {}", timestamp);
        self.events
            .emit(CRON_HEARTBEAT, &HeartbeatEvent { timestamp })
            .await?;
        Ok(())
    }
}

pub fn register(table: &mut JobTable) {
    table.register(NAME, |ctx| Box::new(HeartbeatJob::new(ctx)));
}
