//! `snapwatch info` — one package's revision and service state.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use crate::commands::{client, package_or_default, service_label, RecordJson};
use crate::GlobalArgs;

/// Arguments for `snapwatch info`.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Package name (default: the configured package).
    pub package: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl InfoArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.load_config()?;
        let package = package_or_default(self.package, &config);

        let Some(record) = client(&config)
            .query_installed(&package)
            .with_context(|| format!("failed to query '{package}'"))?
        else {
            bail!("package '{package}' is not installed");
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&RecordJson::from(&record))
                    .context("failed to serialize package JSON")?
            );
            return Ok(());
        }

        let service = match service_label(&record) {
            "active" => "active".green().to_string(),
            "inactive" => "inactive".red().to_string(),
            other => other.to_string(),
        };
        println!("{}", record.name.0.bold());
        println!("  version:  {}", record.version.as_deref().unwrap_or("-"));
        println!("  revision: {}", record.revision);
        println!("  service:  {service}");
        Ok(())
    }
}
