/// Listener registration
use crate::events::{Event, EventError, EventHandler, TypedEventHandler};
use super::core::EventSystem;
use std::sync::Arc;
use tracing::{debug, warn};

impl EventSystem {
    /// Appends `handler` to the listener list for `event_id`.
    ///
    /// Identifiers are not checked against a known set: registering against
    /// a misspelled identifier succeeds and the listener simply never fires.
    /// Registering the same closure twice yields two invocations per emit.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use portal_event_system::{create_portal_event_system, LoginSuccessEvent, AUTH_LOGIN_SUCCESS};
    ///
    /// # async fn example() -> Result<(), portal_event_system::EventError> {
    /// let events = create_portal_event_system();
    /// events.on(AUTH_LOGIN_SUCCESS, |event: LoginSuccessEvent| {
    ///     println!("{} signed in", event.login);
    ///     Ok(())
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn on<T, F>(&self, event_id: &str, handler: F) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        if event_id.trim().is_empty() {
            return Err(EventError::InvalidEventId(event_id.to_string()));
        }

        let position = self.listener_count(event_id);
        let handler_name = format!("{}#{}::{}", event_id, position, T::type_name());
        let handler_arc: Arc<dyn EventHandler> =
            Arc::new(TypedEventHandler::new(handler_name, handler));

        self.handlers
            .entry(event_id.to_string())
            .or_default()
            .push(handler_arc);

        let mut stats = self.stats.write().await;
        stats.total_handlers += 1;

        debug!("📝 Registered handler for {}", event_id);
        Ok(())
    }

    /// Appends every listener of `staged` to this registry, keeping the
    /// per-identifier order. Returns how many listeners were added.
    ///
    /// `staged` is left untouched so the same listeners can later be removed
    /// with [`EventSystem::retract`].
    pub async fn merge(&self, staged: &EventSystem) -> usize {
        let mut added = 0;
        for entry in staged.handlers.iter() {
            if entry.value().is_empty() {
                continue;
            }
            self.handlers
                .entry(entry.key().clone())
                .or_default()
                .extend(entry.value().iter().cloned());
            added += entry.value().len();
        }

        self.stats.write().await.total_handlers += added;
        debug!("📝 Merged {} staged handlers", added);
        added
    }

    /// Removes the listeners that an earlier `merge` of `staged` added.
    /// Returns how many listeners were removed.
    pub async fn retract(&self, staged: &EventSystem) -> usize {
        let mut removed = 0;
        for entry in staged.handlers.iter() {
            if let Some(mut listeners) = self.handlers.get_mut(entry.key()) {
                let before = listeners.len();
                listeners.retain(|h| !entry.value().iter().any(|s| Arc::ptr_eq(h, s)));
                removed += before - listeners.len();
            }
        }
        self.handlers.retain(|_, listeners| !listeners.is_empty());

        let mut stats = self.stats.write().await;
        stats.total_handlers = stats.total_handlers.saturating_sub(removed);
        if removed > 0 {
            warn!("🗑️ Retracted {} handlers", removed);
        }
        removed
    }
}
