//! Discord webhook plugin.
//!
//! Listens on the app and auth lifecycle (plus cron failures) and turns each
//! event into a short notice for a [`Notifier`]. The default notifier writes
//! the notice to the log; delivering it to Discord is the notifier's job.

use async_trait::async_trait;
use portal_event_system::{
    current_timestamp, AppLoadEvent, CronJobEvent, EventError, EventSystem, LoginFailedEvent,
    LoginSuccessEvent, PluginError, SimplePlugin, APP_LOAD, AUTH_LOGIN_FAILED,
    AUTH_LOGIN_SUCCESS, CRON_JOB_FAILED,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Receives formatted notices from the plugin.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice) -> Result<(), EventError>;
}

/// One message destined for the webhook channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Display name the message is posted under
    pub username: String,
    pub content: String,
    pub timestamp: u64,
}

/// Writes notices to the log instead of the network.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) -> Result<(), EventError> {
        info!(target: "discord_webhook", username = %notice.username, "{}", notice.content);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Webhook endpoint. Without one the plugin still logs every notice.
    pub webhook_url: Option<String>,
    pub username: String,
    /// Also notify on failed logins
    pub notify_failed_logins: bool,
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: "Portal".to_string(),
            notify_failed_logins: true,
        }
    }
}

pub struct DiscordWebhookPlugin {
    name: String,
    settings: DiscordSettings,
    notifier: Arc<dyn Notifier>,
    notices_sent: Arc<AtomicU32>,
}

impl DiscordWebhookPlugin {
    pub fn new(settings: DiscordSettings) -> Self {
        Self::with_notifier(settings, Arc::new(LogNotifier))
    }

    pub fn with_notifier(settings: DiscordSettings, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            name: "discord_webhook".to_string(),
            settings,
            notifier,
            notices_sent: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Number of notices handed to the notifier so far.
    pub fn notices_sent(&self) -> u32 {
        self.notices_sent.load(Ordering::Relaxed)
    }

    /// Builds a listener that formats an event with `format` and forwards it.
    fn relay<T, F>(&self, format: F) -> impl Fn(T) -> Result<(), EventError> + Send + Sync + 'static
    where
        T: 'static,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        let notifier = self.notifier.clone();
        let username = self.settings.username.clone();
        let counter = self.notices_sent.clone();

        move |event: T| {
            let notice = Notice {
                username: username.clone(),
                content: format(&event),
                timestamp: current_timestamp(),
            };
            notifier.notify(&notice)?;
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }
}

#[async_trait]
impl SimplePlugin for DiscordWebhookPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn register_handlers(&mut self, events: Arc<EventSystem>) -> Result<(), PluginError> {
        debug!("DiscordWebhookPlugin: registering handlers");

        events
            .on(
                APP_LOAD,
                self.relay(|event: &AppLoadEvent| {
                    format!("🟢 {} v{} loaded", event.app_name, event.version)
                }),
            )
            .await
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;

        events
            .on(
                AUTH_LOGIN_SUCCESS,
                self.relay(|event: &LoginSuccessEvent| format!("🔑 **{}** logged in", event.login)),
            )
            .await
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;

        if self.settings.notify_failed_logins {
            events
                .on(
                    AUTH_LOGIN_FAILED,
                    self.relay(|event: &LoginFailedEvent| {
                        format!("⚠️ Failed login for `{}`: {}", event.auth, event.reason)
                    }),
                )
                .await
                .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;
        }

        events
            .on(
                CRON_JOB_FAILED,
                self.relay(|event: &CronJobEvent| {
                    format!(
                        "❌ Cron job {} {}: {}",
                        event.job,
                        event.status,
                        event.message.as_deref().unwrap_or("no details")
                    )
                }),
            )
            .await
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;

        Ok(())
    }

    async fn on_init(&mut self, _events: Arc<EventSystem>) -> Result<(), PluginError> {
        match &self.settings.webhook_url {
            Some(url) => info!("DiscordWebhookPlugin: relaying notices for {}", url),
            None => info!("DiscordWebhookPlugin: no webhook configured, notices go to the log"),
        }
        Ok(())
    }

    async fn on_shutdown(&mut self, _events: Arc<EventSystem>) -> Result<(), PluginError> {
        info!(
            "DiscordWebhookPlugin: shutting down after {} notices",
            self.notices_sent()
        );
        Ok(())
    }
}
