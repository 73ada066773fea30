//! Main application entry point for the portal.
//!
//! Boots the event registry, loads the built-in plugins, fires `app.load`
//! and then either serves HTTP requests or runs the cron batch.

mod cli;
mod config;
mod signals;

use cli::{CliArgs, Mode};
use config::{AppConfig, LoggingSettings};
use plugin_activity_log::ActivityLogPlugin;
use plugin_discord_webhook::DiscordWebhookPlugin;
use portal_cron::{jobs, CronRunner, JobContext, JobTable};
use portal_event_system::{
    create_portal_event_system, current_timestamp, AppLoadEvent, EventSystem, SimplePlugin,
    APP_LOAD,
};
use portal_http::{LoginState, MemoryAuthenticator};
use portal_plugin_system::PluginManager;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const APP_NAME: &str = "Portal";

// ============================================================================
// Logging Setup
// ============================================================================

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
fn setup_logging(config: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let file_layer = match &config.file_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", log_level);
    Ok(())
}

// ============================================================================
// Application
// ============================================================================

pub struct Application {
    config: AppConfig,
    config_path: PathBuf,
    events: Arc<EventSystem>,
    plugins: PluginManager,
}

impl Application {
    /// Loads and validates the configuration, installs logging and creates
    /// the registry. Nothing is bound or run yet.
    pub async fn new(args: &CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(bind_address) = &args.bind_address {
            config.server.bind_address = bind_address.clone();
        }
        if let Some(log_level) = &args.log_level {
            config.logging.level = log_level.clone();
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {}", e).into());
        }

        setup_logging(&config.logging)?;
        display_banner();

        let events = create_portal_event_system();
        let plugins =
            PluginManager::new(events.clone()).with_whitelist(config.plugins.whitelist.clone());

        info!("📂 Config: {}", args.config_path.display());

        Ok(Self {
            config,
            config_path: args.config_path.clone(),
            events,
            plugins,
        })
    }

    /// Registers the built-in plugins, then announces the application load.
    async fn boot(&self) -> Result<(), Box<dyn std::error::Error>> {
        let candidates: Vec<Box<dyn SimplePlugin>> = vec![
            Box::new(DiscordWebhookPlugin::new(self.config.discord.clone())),
            Box::new(ActivityLogPlugin::new()),
        ];

        let report = self.plugins.load_all_plugins(candidates).await;
        for (name, e) in &report.failed {
            warn!("⚠️ Plugin {} was not loaded: {}", name, e);
        }
        info!(
            "🔌 Plugins loaded: {:?} ({} skipped, {} failed)",
            report.loaded,
            report.skipped.len(),
            report.failed.len()
        );

        self.events
            .emit(
                APP_LOAD,
                &AppLoadEvent {
                    app_name: APP_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    timestamp: current_timestamp(),
                },
            )
            .await?;

        let stats = self.events.get_stats().await;
        info!(
            "📊 Event system ready: {} handlers on {} events",
            stats.total_handlers,
            self.events.registered_events().len()
        );
        Ok(())
    }

    /// Serves HTTP until a shutdown signal arrives.
    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error>> {
        self.boot().await?;

        let authenticator = MemoryAuthenticator::new(self.config.auth.accounts.clone());
        if authenticator.is_empty() {
            warn!("🔑 No accounts configured, every login will be rejected");
        }
        let app = portal_http::router(LoginState::new(
            self.events.clone(),
            Arc::new(authenticator),
        ));

        let listener = tokio::net::TcpListener::bind(&self.config.server.bind_address).await?;
        info!(
            "✅ {} is listening on {}",
            APP_NAME, self.config.server.bind_address
        );
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("🛑 Shutdown signal received, stopping plugins...");
        self.finish().await;
        Ok(())
    }

    /// Runs the cron batch once, or repeatedly when `every` is set.
    pub async fn cron(self, every: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
        self.boot().await?;

        let mut table = JobTable::new();
        jobs::register_builtin(&mut table);

        let context = JobContext::new(self.events.clone()).with_scratch_directory(
            &self.config.cron.scratch_directory,
            self.config.cron.max_file_age(),
        );
        let runner = CronRunner::new(self.config.cron.runner_config(), table, context);
        info!(
            "⏰ Cron jobs from {} under {}",
            runner.config().jobs_directory.display(),
            runner.config().namespace
        );

        let result = match every {
            None => runner.run().await.map(|_| ()),
            Some(seconds) => run_repeatedly(&runner, Duration::from_secs(seconds)).await,
        };

        self.finish().await;
        result.map_err(Into::into)
    }

    async fn finish(&self) {
        self.plugins.shutdown_all().await;

        let stats = self.events.get_stats().await;
        info!("📊 Final Statistics:");
        info!("  - Events emitted: {}", stats.events_emitted);
        info!("  - Listener calls: {}", stats.events_handled);
        info!("  - Listener failures: {}", stats.handler_failures);
        info!(
            "👋 {} stopped (config: {})",
            APP_NAME,
            self.config_path.display()
        );
    }
}

async fn run_repeatedly(
    runner: &CronRunner,
    interval: Duration,
) -> Result<(), portal_cron::CronError> {
    loop {
        let report = runner.run().await?;
        if !report.is_clean() {
            warn!(
                "⏰ Cron run finished with {} failed and {} missing jobs",
                report.failed(),
                report.not_found()
            );
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown_signal() => {
                info!("🛑 Stopping cron loop");
                return Ok(());
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = signals::wait_for_shutdown().await {
        error!("❌ Failed to install signal handlers: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let app = match Application::new(&args).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("❌ Failed to start application: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.mode {
        Mode::Serve => app.serve().await,
        Mode::Cron { every } => app.cron(every).await,
    };

    if let Err(e) = result {
        error!("❌ Application error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Display startup banner using proper logging
fn display_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("╔══════════════════════════════════════════╗");
    info!("║               🌐 PORTAL 🌐               ║");
    info!("║                  v{:<8}               ║", version);
    info!("║                                          ║");
    info!("║  Event plugins · Login API · Cron jobs   ║");
    info!("╚══════════════════════════════════════════╝");
}
