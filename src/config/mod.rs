//! Configuration layer for http-dispatch.
//!
//! This module provides:
//! - The raw agent option bag and its helpers ([`AgentOptions`], [`options`])
//! - Cross-field option validation ([`validate`])
//! - The immutable agent configuration ([`Configuration`], [`ResolvedOptions`])
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Host configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Host settings are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - `--events`, `--interval`, `--once`
//! 2. **TOML config file** - `[schedule]` and `[transport]`
//! 3. **Built-in defaults**
//!
//! Agent options come from the `[agent]` table only. Values that may hold
//! templates are kept raw and rendered per handling cycle.

mod cli;
mod configuration;
pub mod defaults;
mod error;
pub mod options;
mod toml;
mod validate;
mod validated;

#[cfg(test)]
mod cli_tests;

pub use cli::{Cli, Command};
pub use configuration::{Configuration, OutputMode, ResolvedOptions};
pub use error::{ConfigError, ValidationError, ValidationErrors};
pub use options::{AgentOptions, is_present, parse_boolish};
pub use toml::{ScheduleSection, TomlConfig, TransportSection, default_config_template};
pub use validate::{raw_method, validate};
pub use validated::{EventSource, ValidatedConfig, write_default_config};
