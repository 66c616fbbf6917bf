//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use crate::config::CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Awe asset build pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long, default_value = "./")]
    pub root: PathBuf,

    /// Config file name, relative to the root (default: awe.toml)
    #[arg(short = 'C', long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a default config file into the root
    Init,

    /// Empties each group's destination and rebuilds it from source
    Build {
        /// Groups to build (default: all, in name order)
        groups: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_groups() {
        let cli = Cli::try_parse_from(["awe", "-r", "site", "build", "theme", "admin"]).unwrap();

        assert_eq!(cli.root, PathBuf::from("site"));
        assert_eq!(cli.config, PathBuf::from("awe.toml"));
        assert!(matches!(
            cli.command,
            Commands::Build { ref groups } if groups == &["theme", "admin"]
        ));
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["awe", "-C", "assets.toml", "init"]).unwrap();

        assert_eq!(cli.root, PathBuf::from("./"));
        assert_eq!(cli.config, PathBuf::from("assets.toml"));
        assert!(matches!(cli.command, Commands::Init));
    }

    #[test]
    fn test_parse_requires_command() {
        assert!(Cli::try_parse_from(["awe"]).is_err());
    }
}
