use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tether: typed host/client IPC bridge tooling.
#[derive(Parser, Debug)]
#[command(name = "tether", version, about)]
pub struct Args {
    /// Log level override (debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a schema file and print its callable tables.
    Check {
        /// Schema path (defaults to the platform config directory).
        path: Option<PathBuf>,
    },
    /// Print the webview bootstrap script for a schema file.
    Script {
        /// Schema path (defaults to the platform config directory).
        path: Option<PathBuf>,
    },
    /// Run an in-process host/client round trip.
    Demo,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_check_with_path() {
        let args = Args::try_parse_from(["tether", "check", "schema.toml"]).unwrap();
        match args.command {
            Command::Check { path } => assert_eq!(path, Some(PathBuf::from("schema.toml"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn log_level_is_global() {
        let args = Args::try_parse_from(["tether", "demo", "--log-level", "debug"]).unwrap();
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(matches!(args.command, Command::Demo));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["tether"]).is_err());
    }
}
