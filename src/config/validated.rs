//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transport::ClientSettings;

use super::cli::Cli;
use super::configuration::Configuration;
use super::error::ConfigError;
use super::options::AgentOptions;
use super::toml::TomlConfig;

/// Where triggering events are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    /// JSON lines on standard input
    Stdin,
    /// JSON lines in a file
    File(PathBuf),
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// Agent options are validated as a whole; every problem is reported at once.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Validated agent configuration
    pub agent: Configuration,

    /// Transport settings (agent connection options plus `[transport]`)
    pub client: ClientSettings,

    /// Event input, if events are consumed
    pub events: Option<EventSource>,

    /// Interval between scheduled checks, if scheduled
    pub interval: Option<Duration>,

    /// Run one scheduled check and exit
    pub once: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events = self
            .events
            .as_ref()
            .map_or_else(|| "none".to_string(), ToString::to_string);
        let interval = self
            .interval
            .map_or_else(|| "none".to_string(), |d| format!("{}s", d.as_secs()));

        write!(
            f,
            "Config {{ endpoint: {}, events: {}, interval: {}, once: {}, fail_on_status: {} }}",
            self.agent.raw_endpoint(),
            events,
            interval,
            self.once,
            self.client.fail_on_status,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values. When neither
    /// an event file nor a schedule is configured, events are read from stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The agent options fail validation
    /// - The schedule interval is zero
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let options = toml.map(|t| t.agent.clone()).unwrap_or_default();
        let agent = Configuration::from_options(AgentOptions::new(options))?;

        let mut client = agent.client_settings();
        client.fail_on_status = toml.is_some_and(|t| t.transport.fail_on_status);

        let interval = Self::resolve_interval(cli, toml)?;
        let events = Self::resolve_events(cli, interval.is_some());

        Ok(Self {
            agent,
            client,
            events,
            interval,
            once: cli.once,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_interval(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Option<Duration>, ConfigError> {
        // Priority: CLI explicit > TOML > no schedule
        let Some(seconds) = cli
            .interval
            .or_else(|| toml.and_then(|t| t.schedule.interval))
        else {
            return Ok(None);
        };

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "interval",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Some(Duration::from_secs(seconds)))
    }

    fn resolve_events(cli: &Cli, scheduled: bool) -> Option<EventSource> {
        match cli.events.as_deref() {
            Some(path) if path == Path::new("-") => Some(EventSource::Stdin),
            Some(path) => Some(EventSource::File(path.to_path_buf())),
            None if scheduled || cli.once => None,
            None => Some(EventSource::Stdin),
        }
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
