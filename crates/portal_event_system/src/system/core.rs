/// Core EventSystem implementation
use crate::events::EventHandler;
use super::stats::EventSystemStats;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The registry that maps event identifiers to their ordered listeners.
///
/// One instance is built by the application root and shared as
/// `Arc<EventSystem>` with every component that registers or fires events.
/// There is no global instance.
///
/// Listeners are appended by `on` and `merge`; only `retract` removes them.
/// Emission clones the vector for an identifier before invoking anything, so
/// a listener that registers further listeners never deadlocks the map.
pub struct EventSystem {
    /// Event identifier -> listeners in registration order
    pub(super) handlers: DashMap<String, Vec<Arc<dyn EventHandler>>>,
    pub(super) stats: RwLock<EventSystemStats>,
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("events", &self.handlers.len())
            .field("stats", &"[stats]")
            .finish()
    }
}

impl EventSystem {
    /// Creates a new event system with no registered handlers.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            stats: RwLock::new(EventSystemStats::default()),
        }
    }

    /// Gets the current event system statistics
    pub async fn get_stats(&self) -> EventSystemStats {
        self.stats.read().await.clone()
    }

    /// Number of listeners attached to `event_id`.
    pub fn listener_count(&self, event_id: &str) -> usize {
        self.handlers
            .get(event_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Every identifier that has at least one listener, sorted.
    pub fn registered_events(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.handlers.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}
