//! `snapwatch installed` — presence check usable from shell scripts.

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::commands::{client, package_or_default};
use crate::GlobalArgs;

/// Arguments for `snapwatch installed`.
#[derive(Args, Debug)]
pub struct InstalledArgs {
    /// Package name (default: the configured package).
    pub package: Option<String>,
}

impl InstalledArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.load_config()?;
        let package = package_or_default(self.package, &config);

        // The version and revision go to the log on stderr.
        let installed = client(&config)
            .is_installed(&package)
            .with_context(|| format!("failed to query '{package}'"))?;
        if !installed {
            bail!("package '{package}' is not installed");
        }
        println!("✓ '{package}' is installed");
        Ok(())
    }
}
