//! `snapwatch watch` — trigger a forced update and wait for the new revision.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tokio::sync::broadcast;

use snapwatch_core::WatchConfig;
use snapwatch_watch::{
    HttpTrigger, TriggerOutcome, WatchOutcome, WatchReport, WatchSession, WatchSettings,
    WatchState,
};

use crate::commands::{client, RecordJson};
use crate::GlobalArgs;

/// Arguments for `snapwatch watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Package to observe (default: the configured package).
    #[arg(long)]
    pub package: Option<String>,

    /// Agent endpoint that forces an update.
    #[arg(long)]
    pub trigger_url: Option<String>,

    /// Seconds between polls.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Seconds before a session gives up.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum polls after the trigger.
    #[arg(long)]
    pub max_polls: Option<u32>,

    /// Run this many sessions back to back, stopping at the first failure.
    #[arg(long, default_value_t = 1)]
    pub iterations: u32,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl WatchArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let config = self.apply(global.load_config()?)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;
        runtime.block_on(self.run_sessions(config))
    }

    /// Layer command-line overrides over the loaded config.
    fn apply(&self, mut config: WatchConfig) -> Result<WatchConfig> {
        if let Some(package) = &self.package {
            config.package = package.as_str().into();
        }
        if let Some(url) = &self.trigger_url {
            config.trigger_url = url.clone();
        }
        if let Some(interval) = self.interval {
            config.poll_interval_secs = interval;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.max_polls.is_some() {
            config.max_polls = self.max_polls;
        }
        if self.iterations == 0 {
            bail!("--iterations must be at least 1");
        }
        config.validate().context("invalid watch settings")?;
        Ok(config)
    }

    async fn run_sessions(&self, config: WatchConfig) -> Result<()> {
        let (shutdown_tx, _) = broadcast::channel::<()>(4);
        {
            let shutdown = shutdown_tx.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("received ctrl-c, cancelling watch");
                    let _ = shutdown.send(());
                }
            });
        }

        let trigger = Arc::new(HttpTrigger::new(&config.trigger_url, config.io_timeout()));
        let settings = WatchSettings::from_config(&config);
        let mut summaries = Vec::new();

        for iteration in 1..=self.iterations {
            tracing::info!(
                iteration,
                package = %settings.package,
                trigger = %config.trigger_url,
                "starting watch session",
            );
            let started_at = Utc::now();
            // Each session owns its own transport.
            let source = Arc::new(client(&config));
            let report = WatchSession::new(source, trigger.clone(), settings.clone())
                .with_shutdown(shutdown_tx.subscribe())
                .run()
                .await;

            let summary = SessionSummary::new(iteration, started_at, &report);
            if !self.json {
                print_summary(&summary);
            }
            summaries.push(summary);

            if let Err(err) = report.into_result() {
                if self.json {
                    print_json(&summaries)?;
                }
                return Err(err).with_context(|| format!("watch iteration {iteration} failed"));
            }
        }

        if self.json {
            print_json(&summaries)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SessionSummary {
    iteration: u32,
    started_at: DateTime<Utc>,
    package: String,
    outcome: WatchState,
    error: Option<String>,
    trigger: Option<TriggerOutcome>,
    baseline: Option<RecordJson>,
    last_known: Option<RecordJson>,
    polls: u32,
    elapsed_ms: u128,
}

impl SessionSummary {
    fn new(iteration: u32, started_at: DateTime<Utc>, report: &WatchReport) -> Self {
        Self {
            iteration,
            started_at,
            package: report.package.0.clone(),
            outcome: report.outcome.state(),
            error: match &report.outcome {
                WatchOutcome::Failed(err) => Some(err.to_string()),
                _ => None,
            },
            trigger: report.trigger.clone(),
            baseline: report.baseline.as_ref().map(RecordJson::from),
            last_known: report.last_known.as_ref().map(RecordJson::from),
            polls: report.polls,
            elapsed_ms: report.elapsed.as_millis(),
        }
    }
}

fn print_json(summaries: &[SessionSummary]) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(summaries).context("failed to serialize watch JSON")?
    );
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    let took = format_elapsed(Duration::from_millis(summary.elapsed_ms as u64));
    let revision = |record: &Option<RecordJson>| {
        record
            .as_ref()
            .map(|r| r.revision.to_string())
            .unwrap_or_else(|| "?".to_string())
    };
    let header = format!(
        "[{}] iteration {} · {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S"),
        summary.iteration,
        summary.package
    );

    match summary.outcome {
        WatchState::Succeeded => println!(
            "{} {header}: revision {} → {} in {took} ({} polls)",
            "✓".green().bold(),
            revision(&summary.baseline),
            revision(&summary.last_known),
            summary.polls,
        ),
        WatchState::TimedOut => println!(
            "{} {header}: timed out after {took} ({} polls)",
            "✗".red().bold(),
            summary.polls,
        ),
        WatchState::Cancelled => println!(
            "{} {header}: cancelled after {took}",
            "■".yellow().bold(),
        ),
        _ => println!(
            "{} {header}: failed after {took}: {}",
            "✗".red().bold(),
            summary.error.as_deref().unwrap_or("unknown error"),
        ),
    }

    if let Some(trigger) = &summary.trigger {
        match trigger {
            TriggerOutcome::Accepted { status } => println!("  trigger: accepted ({status})"),
            TriggerOutcome::Rejected { status } => {
                println!("  trigger: {}", format!("rejected ({status})").yellow())
            }
            TriggerOutcome::Unreachable { reason } => {
                println!("  trigger: {}", format!("unreachable: {reason}").yellow())
            }
        }
    }
    if summary.outcome != WatchState::Succeeded {
        match &summary.last_known {
            Some(last) => println!(
                "  last known: revision {} · daemon {} · running {}",
                last.revision, last.is_daemon, last.is_running
            ),
            None => println!("  last known: none"),
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> WatchArgs {
        WatchArgs {
            package: None,
            trigger_url: None,
            interval: None,
            timeout: None,
            max_polls: None,
            iterations: 1,
            json: false,
        }
    }

    #[test]
    fn flags_override_config_values() {
        let args = WatchArgs {
            package: Some("other-agent".to_string()),
            interval: Some(1),
            timeout: Some(30),
            max_polls: Some(4),
            ..args()
        };
        let config = args.apply(WatchConfig::default()).expect("apply");
        assert_eq!(config.package.0, "other-agent");
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_polls, Some(4));
        assert_eq!(config.trigger_url, WatchConfig::default().trigger_url);
    }

    #[test]
    fn zero_interval_flag_is_rejected() {
        let args = WatchArgs {
            interval: Some(0),
            ..args()
        };
        assert!(args.apply(WatchConfig::default()).is_err());
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let args = WatchArgs {
            iterations: 0,
            ..args()
        };
        let err = args.apply(WatchConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--iterations"));
    }

    #[test]
    fn elapsed_formats_minutes_past_one_minute() {
        assert_eq!(format_elapsed(Duration::from_millis(12_340)), "12.3s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m 05s");
    }
}
