//! Command-line interface module.

mod args;
pub mod build;
pub mod deps;
pub mod watch;

pub use args::{Cli, Commands};

use anyhow::Result;
use clap::ColorChoice;
use std::sync::Arc;

use crate::config::SiteConfig;

/// Run a parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    crate::logger::set_verbose(cli.command.verbose());

    let cwd = std::env::current_dir()?;
    let config = Arc::new(SiteConfig::discover(&cwd, &cli.config)?);

    match &cli.command {
        Commands::Build {
            incremental, clean, ..
        } => build::build_site(config, *incremental, *clean),
        Commands::Watch { .. } => watch::watch_site(config),
        Commands::Deps { path } => deps::show_dependencies(config, path),
    }
}
