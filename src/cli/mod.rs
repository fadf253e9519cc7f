// Keyrotator - CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: rotate, journal.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// Keyrotator: rotate cloud service account keys and update every place
/// that holds a copy.
#[derive(Parser, Debug)]
#[command(name = "keyrotator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover keys and rotate the ones past their age threshold.
    Rotate {
        /// Path to the JSON run configuration.
        #[arg(long)]
        config: PathBuf,

        /// Only consider keys of this account (requires --provider).
        #[arg(long)]
        account: Option<String>,

        /// Only discover keys at this provider (e.g. "gcp").
        #[arg(long)]
        provider: Option<String>,

        /// Project to discover keys in (required for the gcp provider).
        #[arg(long)]
        project: Option<String>,

        /// Report key ages without rotating, regardless of the config's rotation_mode.
        #[arg(long, default_value = "false")]
        observe: bool,

        /// Print the run summary as JSON.
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show rotations that left a new key behind, or recent journal history.
    Journal {
        /// Configuration whose journal_path should be used.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Show recent history instead of only unfinished rotations.
        #[arg(long, default_value = "false")]
        all: bool,

        /// Maximum number of history entries to show.
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Print entries as JSON.
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rotate_flags() {
        let cli = Cli::try_parse_from([
            "keyrotator",
            "rotate",
            "--config",
            "rotator.json",
            "--account",
            "deployer",
            "--provider",
            "gcp",
            "--project",
            "proj",
        ])
        .unwrap();

        match cli.command {
            Commands::Rotate {
                config,
                account,
                provider,
                project,
                observe,
                json,
            } => {
                assert_eq!(config, PathBuf::from("rotator.json"));
                assert_eq!(account.as_deref(), Some("deployer"));
                assert_eq!(provider.as_deref(), Some("gcp"));
                assert_eq!(project.as_deref(), Some("proj"));
                assert!(!observe);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rotate_requires_config() {
        assert!(Cli::try_parse_from(["keyrotator", "rotate"]).is_err());
    }

    #[test]
    fn test_json_flags() {
        let cli = Cli::try_parse_from(["keyrotator", "journal", "--all", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Journal { all: true, json: true, .. }));

        let cli =
            Cli::try_parse_from(["keyrotator", "rotate", "--config", "c.json", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Rotate { json: true, .. }));
    }

    #[test]
    fn test_journal_defaults() {
        let cli = Cli::try_parse_from(["keyrotator", "journal"]).unwrap();
        match cli.command {
            Commands::Journal {
                config,
                all,
                limit,
                json,
            } => {
                assert!(config.is_none());
                assert!(!all);
                assert_eq!(limit, 20);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
