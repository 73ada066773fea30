//! Contract between the portal and its plugin modules.

use crate::system::EventSystem;
use async_trait::async_trait;
use std::sync::Arc;

/// A self-contained unit that attaches listeners to the event registry.
///
/// The loader hands every module the registry once, at boot. Modules don't
/// know about each other; when two modules listen on the same identifier
/// their listeners run in module load order.
///
/// # Lifecycle
///
/// 1. `register_handlers` is called on **every** module first. Register all
///    listeners here and nothing else. The registry passed in only collects
///    this module's listeners; they are dropped if the module fails to load.
/// 2. `on_init` runs only after every module registered, so it may fire
///    events and expect other modules to hear them.
/// 3. `on_shutdown` runs in reverse load order when the portal stops.
///
/// # Examples
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use portal_event_system::{EventSystem, LoginFailedEvent, PluginError, SimplePlugin, AUTH_LOGIN_FAILED};
/// use std::sync::Arc;
///
/// struct AuditPlugin;
///
/// #[async_trait]
/// impl SimplePlugin for AuditPlugin {
///     fn name(&self) -> &str { "audit" }
///     fn version(&self) -> &str { "1.0.0" }
///
///     async fn register_handlers(&mut self, events: Arc<EventSystem>) -> Result<(), PluginError> {
///         events
///             .on(AUTH_LOGIN_FAILED, |event: LoginFailedEvent| {
///                 tracing::warn!("login failed for {}: {}", event.auth, event.reason);
///                 Ok(())
///             })
///             .await
///             .map_err(|e| PluginError::InitializationFailed(e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait SimplePlugin: Send + Sync + 'static {
    /// Unique, stable name used for logs and whitelisting.
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Registers every listener this module needs. Must not return before
    /// registration is complete.
    async fn register_handlers(&mut self, events: Arc<EventSystem>) -> Result<(), PluginError>;

    /// Runs after all modules have registered their listeners.
    async fn on_init(&mut self, _events: Arc<EventSystem>) -> Result<(), PluginError> {
        Ok(())
    }

    /// Shutdown errors are logged by the loader but never block shutdown.
    async fn on_shutdown(&mut self, _events: Arc<EventSystem>) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Errors that can occur during plugin operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Plugin initialization failed during startup
    #[error("Plugin initialization failed: {0}")]
    InitializationFailed(String),
    /// A plugin with the same name is already loaded
    #[error("Plugin already loaded: {0}")]
    AlreadyLoaded(String),
    /// Runtime error such as panic
    #[error("Plugin runtime error: {0}")]
    Runtime(String),
}
