/// Event emission
use crate::events::{Event, EventError};
use super::core::EventSystem;
use tracing::{debug, error};

impl EventSystem {
    /// Fires `event_id`, invoking every listener in registration order.
    ///
    /// Each listener is awaited before the next one starts and the call only
    /// returns once all of them have returned. A listener that fails or
    /// panics is logged and counted; the remaining listeners still run and
    /// the emit itself succeeds. The only error surfaced to the caller is a
    /// payload that cannot be serialized.
    ///
    /// Firing an identifier nobody listens to is a no-op.
    pub async fn emit<T>(&self, event_id: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let handlers = self
            .handlers
            .get(event_id)
            .map(|entry| entry.value().clone());

        let Some(handlers) = handlers.filter(|handlers| !handlers.is_empty()) else {
            debug!("No handlers for event: {}", event_id);
            return Ok(());
        };

        let data = event.serialize()?;
        debug!("📤 Emitting {} to {} handlers", event_id, handlers.len());

        let mut success_count = 0u64;
        let mut failure_count = 0u64;

        for handler in handlers.iter() {
            match handler.handle(&data).await {
                Ok(()) => success_count += 1,
                Err(e) => {
                    error!("❌ Handler {} failed: {}", handler.handler_name(), e);
                    failure_count += 1;
                }
            }
        }

        let mut stats = self.stats.write().await;
        stats.events_emitted += 1;
        stats.events_handled += success_count;
        stats.handler_failures += failure_count;

        Ok(())
    }
}
