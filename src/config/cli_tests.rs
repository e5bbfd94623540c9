//! Tests for CLI argument parsing.

use super::cli::{Cli, Command};

mod parsing {
    use super::*;

    #[test]
    fn parse_run_options() {
        let cli = Cli::parse_from_iter([
            "http-dispatch",
            "--config",
            "/path/to/config.toml",
            "--events",
            "events.jsonl",
            "--interval",
            "30",
            "--verbose",
        ]);

        assert_eq!(
            cli.config.as_ref().unwrap().to_str(),
            Some("/path/to/config.toml")
        );
        assert_eq!(cli.events.as_ref().unwrap().to_str(), Some("events.jsonl"));
        assert_eq!(cli.interval, Some(30));
        assert!(cli.verbose);
        assert!(!cli.once);
    }

    #[test]
    fn parse_short_flags() {
        let cli = Cli::parse_from_iter(["http-dispatch", "-c", "a.toml", "-v", "--once"]);

        assert_eq!(cli.config.as_ref().unwrap().to_str(), Some("a.toml"));
        assert!(cli.verbose);
        assert!(cli.once);
    }

    #[test]
    fn default_values() {
        let cli = Cli::parse_from_iter(["http-dispatch"]);

        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert!(cli.events.is_none());
        assert!(cli.interval.is_none());
        assert!(!cli.once);
        assert!(!cli.verbose);
    }
}

mod subcommands {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_init_with_default_output() {
        let cli = Cli::parse_from_iter(["http-dispatch", "init"]);

        assert!(cli.is_init());
        match cli.command {
            Some(Command::Init { output }) => {
                assert_eq!(output, PathBuf::from("http-dispatch.toml"));
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn parse_init_with_custom_output() {
        let cli = Cli::parse_from_iter(["http-dispatch", "init", "--output", "/custom/config.toml"]);

        match cli.command {
            Some(Command::Init { output }) => {
                assert_eq!(output, PathBuf::from("/custom/config.toml"));
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn parse_check_with_global_config() {
        let cli = Cli::parse_from_iter(["http-dispatch", "check", "--config", "agent.toml"]);

        assert!(cli.is_check());
        assert!(!cli.is_init());
        assert_eq!(cli.config.as_ref().unwrap().to_str(), Some("agent.toml"));
    }

    #[test]
    fn run_mode_has_no_subcommand() {
        let cli = Cli::parse_from_iter(["http-dispatch", "--once"]);

        assert!(!cli.is_init());
        assert!(!cli.is_check());
    }
}
