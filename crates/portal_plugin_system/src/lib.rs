//! Plugin loading for the portal event registry.
//!
//! Plugins are compiled into the portal and handed to the [`PluginManager`]
//! as a list, in the order they should load. Loading is two-phase: every
//! plugin registers its listeners first, then every surviving plugin runs
//! its init hook. A plugin that fails or panics in either phase is dropped,
//! together with every listener it registered, and the others carry on.

use futures::FutureExt;
use portal_event_system::{panic_message, EventSystem, PluginError, SimplePlugin};
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

// ============================================================================
// Plugin Manager
// ============================================================================

/// Owns the loaded plugins and drives their lifecycle against one registry.
pub struct PluginManager {
    events: Arc<EventSystem>,
    /// Loaded plugins, in load order
    plugins: RwLock<Vec<LoadedPlugin>>,
    /// If non-empty, only plugins named here are loaded
    whitelist: Vec<String>,
}

struct LoadedPlugin {
    plugin: Box<dyn SimplePlugin>,
    metadata: PluginMetadata,
}

#[derive(Debug, Clone)]
struct PluginMetadata {
    name: String,
    version: String,
    loaded_at: SystemTime,
    handler_count: usize,
}

/// Result of a [`PluginManager::load_all_plugins`] call.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Plugins that completed both phases, in load order
    pub loaded: Vec<String>,
    /// Plugins skipped because they are not whitelisted
    pub skipped: Vec<String>,
    /// Plugins dropped during loading, with the reason
    pub failed: Vec<(String, PluginError)>,
}

impl PluginManager {
    pub fn new(events: Arc<EventSystem>) -> Self {
        Self {
            events,
            plugins: RwLock::new(Vec::new()),
            whitelist: Vec::new(),
        }
    }

    /// Restricts loading to the named plugins. An empty list loads everything.
    pub fn with_whitelist(mut self, whitelist: Vec<String>) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Loads `candidates` with two-phase initialization.
    ///
    /// Phase 1 calls `register_handlers` on every candidate in order; phase 2
    /// calls `on_init` on the ones that registered successfully. Failures are
    /// collected in the returned report instead of aborting the batch.
    ///
    /// Each plugin registers into its own staging registry. The staged
    /// listeners join the shared registry only once registration succeeded,
    /// and are retracted again if `on_init` fails.
    pub async fn load_all_plugins(&self, candidates: Vec<Box<dyn SimplePlugin>>) -> LoadReport {
        let mut report = LoadReport::default();
        let mut registered: Vec<(Box<dyn SimplePlugin>, Arc<EventSystem>, usize)> = Vec::new();

        info!("Starting two-phase plugin loading for {} plugins", candidates.len());

        // Phase 1: every plugin registers its listeners
        for mut plugin in candidates {
            let name = plugin.name().to_string();

            if !self.is_whitelisted(&name) {
                debug!("Plugin {} is not whitelisted, skipping", name);
                report.skipped.push(name);
                continue;
            }

            if self.is_loaded(&name).await
                || registered.iter().any(|(p, _, _)| p.name() == name)
            {
                error!("Plugin {} is already loaded", name);
                report.failed.push((name.clone(), PluginError::AlreadyLoaded(name)));
                continue;
            }

            let staging = Arc::new(EventSystem::new());
            let outcome = AssertUnwindSafe(plugin.register_handlers(staging.clone()))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic_info| {
                    Err(PluginError::Runtime(format!(
                        "Plugin panicked: {}",
                        panic_message(panic_info)
                    )))
                });

            match outcome {
                Ok(()) => {
                    let handler_count = self.events.merge(&staging).await;
                    info!(
                        "Plugin {} registered {} handlers",
                        name, handler_count
                    );
                    registered.push((plugin, staging, handler_count));
                }
                Err(e) => {
                    error!(
                        "Plugin {} handler registration failed, discarding its handlers: {}",
                        name, e
                    );
                    report.failed.push((name, e));
                }
            }
        }

        // Phase 2: init hooks, now that every listener is in place
        for (mut plugin, staging, handler_count) in registered {
            let name = plugin.name().to_string();
            let outcome = AssertUnwindSafe(plugin.on_init(self.events.clone()))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic_info| {
                    Err(PluginError::Runtime(format!(
                        "Plugin panicked: {}",
                        panic_message(panic_info)
                    )))
                });

            match outcome {
                Ok(()) => {
                    let metadata = PluginMetadata {
                        name: name.clone(),
                        version: plugin.version().to_string(),
                        loaded_at: SystemTime::now(),
                        handler_count,
                    };
                    self.plugins.write().await.push(LoadedPlugin { plugin, metadata });
                    info!("🔌 Plugin {} loaded", name);
                    report.loaded.push(name);
                }
                Err(e) => {
                    let retracted = self.events.retract(&staging).await;
                    error!(
                        "Plugin {} initialization failed, retracted {} handlers: {}",
                        name, retracted, e
                    );
                    report.failed.push((name, e));
                }
            }
        }

        if !report.failed.is_empty() {
            warn!("Failed to load {} plugins", report.failed.len());
            for (name, error) in &report.failed {
                warn!("  {}: {}", name, error);
            }
        }

        info!(
            "Two-phase loading complete: {} plugins loaded",
            report.loaded.len()
        );

        report
    }

    /// Shuts plugins down in reverse load order.
    ///
    /// Shutdown errors are logged; every plugin still gets its turn.
    pub async fn shutdown_all(&self) {
        let mut plugins = self.plugins.write().await;
        info!("Shutting down {} plugins", plugins.len());

        while let Some(mut loaded) = plugins.pop() {
            if let Err(e) = loaded.plugin.on_shutdown(self.events.clone()).await {
                error!("Error shutting down plugin {}: {}", loaded.metadata.name, e);
            }
        }

        info!("All plugins shut down");
    }

    /// Names of the loaded plugins, in load order.
    pub async fn get_loaded_plugins(&self) -> Vec<String> {
        let plugins = self.plugins.read().await;
        plugins.iter().map(|p| p.metadata.name.clone()).collect()
    }

    pub async fn get_plugin_info(&self, plugin_name: &str) -> Option<PluginInfo> {
        let plugins = self.plugins.read().await;
        plugins
            .iter()
            .find(|p| p.metadata.name == plugin_name)
            .map(|p| PluginInfo::from(&p.metadata))
    }

    pub async fn get_plugin_stats(&self) -> PluginSystemStats {
        let plugins = self.plugins.read().await;
        PluginSystemStats {
            total_plugins: plugins.len(),
            total_handlers: self.total_handlers().await,
            plugins: plugins.iter().map(|p| PluginInfo::from(&p.metadata)).collect(),
        }
    }

    fn is_whitelisted(&self, name: &str) -> bool {
        self.whitelist.is_empty() || self.whitelist.iter().any(|w| w == name)
    }

    async fn is_loaded(&self, name: &str) -> bool {
        let plugins = self.plugins.read().await;
        plugins.iter().any(|p| p.metadata.name == name)
    }

    async fn total_handlers(&self) -> usize {
        self.events.get_stats().await.total_handlers
    }
}

// ============================================================================
// Plugin information
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub handler_count: usize,
    pub loaded_at: SystemTime,
}

impl From<&PluginMetadata> for PluginInfo {
    fn from(metadata: &PluginMetadata) -> Self {
        Self {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            handler_count: metadata.handler_count,
            loaded_at: metadata.loaded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSystemStats {
    pub total_plugins: usize,
    pub total_handlers: usize,
    pub plugins: Vec<PluginInfo>,
}
