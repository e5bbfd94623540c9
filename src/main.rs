//! HTTP Dispatch: event-driven HTTP request dispatcher
//!
//! Entry point for the http-dispatch application.

use http_dispatch::config::{
    AgentOptions, Cli, Command, ConfigError, TomlConfig, ValidatedConfig, validate,
    write_default_config,
};
use std::process::ExitCode;

mod app;
mod run;

use app::{exit_code, print_config_hint, setup_tracing};

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match &cli.command {
        Some(Command::Init { output }) => return handle_init(output),
        Some(Command::Check) => return handle_check(&cli),
        None => {}
    }

    // Load and validate configuration
    let config = match ValidatedConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    // Setup logging and run
    setup_tracing(config.verbose);
    tracing::info!("{config}");

    run_application(config)
}

/// Handles the `init` subcommand.
fn handle_init(output: &std::path::Path) -> ExitCode {
    match write_default_config(output) {
        Ok(()) => {
            println!("Configuration template written to: {}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code::CONFIG_ERROR
        }
    }
}

/// Handles the `check` subcommand: prints every validation problem.
fn handle_check(cli: &Cli) -> ExitCode {
    let toml = match cli.config.as_deref().map(TomlConfig::load).transpose() {
        Ok(toml) => toml,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    let options = AgentOptions::new(toml.map(|t| t.agent).unwrap_or_default());
    let errors = validate(&options);
    if errors.is_empty() {
        println!("Configuration is valid");
        return exit_code::SUCCESS;
    }

    for error in &errors {
        eprintln!("- {error}");
    }
    print_config_hint(&ConfigError::from(errors));
    exit_code::CONFIG_ERROR
}

/// Runs the main application with the given configuration.
///
/// Excluded from coverage - requires async runtime.
#[cfg(not(tarpaulin_include))]
fn run_application(config: ValidatedConfig) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {e}");
            return exit_code::runtime_error();
        }
    };

    match runtime.block_on(run::execute(config)) {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            tracing::error!("Application error: {e}");
            exit_code::runtime_error()
        }
    }
}
