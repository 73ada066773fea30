/// Statistics for event system monitoring.
#[derive(Debug, Clone, Default)]
pub struct EventSystemStats {
    /// Total number of registered listeners
    pub total_handlers: usize,
    /// `emit` calls that reached at least one listener
    pub events_emitted: u64,
    /// Listener invocations that returned `Ok`
    pub events_handled: u64,
    /// Listener invocations that failed or panicked
    pub handler_failures: u64,
}
