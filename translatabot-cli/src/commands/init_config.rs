//! `translatabot init-config` — print the starter configuration.

use anyhow::{Context, Result};
use clap::Args;

use translatabot_core::config::default_config_yaml;

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Repository path of the source localization file.
    #[arg(long)]
    pub default_path: Option<String>,
}

impl InitConfigArgs {
    pub fn run(self) -> Result<()> {
        let yaml = default_config_yaml(self.default_path.as_deref())
            .context("failed to render starter configuration")?;
        print!("{yaml}");
        if !yaml.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
