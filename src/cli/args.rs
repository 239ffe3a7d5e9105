//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// lode incremental static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the working directory
    #[arg(short = 'C', long, global = true, default_value = "lode.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate the whole site
    #[command(visible_alias = "b")]
    Build {
        /// Skip resources whose output is up to date
        #[arg(short, long)]
        incremental: bool,

        /// Remove the deploy folder before generating
        #[arg(short, long)]
        clean: bool,

        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },

    /// Generate, then regenerate on every change
    #[command(visible_alias = "w")]
    Watch {
        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },

    /// Show the dependencies of a resource
    #[command(visible_alias = "d")]
    Deps {
        /// Resource path (relative to the site root, or absolute)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,
    },
}

impl Commands {
    pub fn verbose(&self) -> bool {
        match self {
            Self::Build { verbose, .. } | Self::Watch { verbose } => *verbose,
            Self::Deps { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from(["lode", "build", "-i", "--clean", "-V"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("lode.toml"));
        match cli.command {
            Commands::Build {
                incremental,
                clean,
                verbose,
            } => assert!(incremental && clean && verbose),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_config_and_alias() {
        let cli = Cli::try_parse_from(["lode", "w", "-C", "site/other.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("site/other.toml"));
        assert!(matches!(cli.command, Commands::Watch { verbose: false }));
    }

    #[test]
    fn test_deps_requires_path() {
        assert!(Cli::try_parse_from(["lode", "deps"]).is_err());
        let cli = Cli::try_parse_from(["lode", "deps", "content/about.html"]).unwrap();
        assert!(!cli.command.verbose());
    }
}
