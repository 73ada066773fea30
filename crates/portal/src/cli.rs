//! Command-line interface handling for the portal.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "config.toml";

/// What the process should do after booting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Run the HTTP server until a shutdown signal arrives.
    Serve,
    /// Run the cron batch once, or every `every` seconds until a signal.
    Cron { every: Option<u64> },
}

/// Command line arguments parsed from user input.
///
/// Options here override the matching configuration file settings.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for bind address
    pub bind_address: Option<String>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    pub mode: Mode,
}

impl CliArgs {
    /// Parses the process arguments. Exits with usage on invalid input.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let mode = match matches.subcommand() {
            Some(("cron", cron)) => Mode::Cron {
                every: cron.get_one::<u64>("every").copied(),
            },
            _ => Mode::Serve,
        };

        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG)),
            bind_address: matches.get_one::<String>("bind").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            mode,
        }
    }
}

fn command() -> Command {
    Command::new("Portal")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Client portal server with event plugins and a cron runner")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG)
                .global(true),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDRESS")
                .help("Bind address (e.g., 127.0.0.1:8080)")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .global(true),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("serve").about("Serve HTTP requests (default)"))
        .subcommand(
            Command::new("cron")
                .about("Run every discovered cron job")
                .arg(
                    Arg::new("every")
                        .long("every")
                        .value_name("SECONDS")
                        .help("Repeat the run at this interval until interrupted")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
}
