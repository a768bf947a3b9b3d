//! `snapwatch list` — every installed package.

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use crate::commands::{client, service_label, RecordJson};
use crate::GlobalArgs;

/// Arguments for `snapwatch list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct ListTableRow {
    #[tabled(rename = "package")]
    name: String,
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "revision")]
    revision: u64,
    #[tabled(rename = "service")]
    service: &'static str,
}

impl ListArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = global.load_config()?;
        let records = client(&config)
            .list_installed()
            .context("failed to list installed packages")?;

        if self.json {
            let payload: Vec<RecordJson> = records.iter().map(RecordJson::from).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize list JSON")?
            );
            return Ok(());
        }

        if records.is_empty() {
            println!("No packages installed.");
            return Ok(());
        }

        let rows: Vec<ListTableRow> = records
            .iter()
            .map(|record| ListTableRow {
                name: record.name.0.clone(),
                version: record.version.clone().unwrap_or_else(|| "-".to_string()),
                revision: record.revision.0,
                service: service_label(record),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
