//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Inspect the order tracker and position state store
#[derive(Parser, Debug)]
#[command(name = "tradestate")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the primary store
    Check,

    /// List pending orders and tracker stats
    Orders,

    /// List a user's position states
    Positions(PositionsArgs),
}

/// Arguments for `positions`.
#[derive(Args, Debug)]
pub struct PositionsArgs {
    /// User whose positions to list
    #[arg(short, long)]
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_positions_with_global_flags() {
        let cli = Cli::try_parse_from([
            "tradestate",
            "positions",
            "--user",
            "u1",
            "--json",
            "--config",
            "alt.toml",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        match cli.command {
            Commands::Positions(args) => assert_eq!(args.user, "u1"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn positions_requires_user() {
        assert!(Cli::try_parse_from(["tradestate", "positions"]).is_err());
    }
}
