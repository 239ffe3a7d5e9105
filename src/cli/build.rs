//! `lode build`: one full generation.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::fs::Folder;
use crate::generator::Generator;
use crate::log;

pub fn build_site(config: Arc<SiteConfig>, incremental: bool, clean: bool) -> Result<()> {
    if clean {
        let deploy = Folder::new(config.deploy_root());
        log!("build"; "removing {}", deploy.path().display());
        deploy
            .delete()
            .with_context(|| format!("failed to clean {}", deploy.path().display()))?;
    }

    let mut generator = Generator::from_config(config)?;
    generator.generate_all(incremental)?;
    generator
        .save_dependencies()
        .context("failed to save the dependency map")?;
    Ok(())
}
