//! Trigger-then-poll watch session.
//!
//! ```text
//! Idle ──baseline──▶ TriggerSent ──first poll──▶ Succeeded
//!                         │
//!                         ▼
//!                      Polling ──sleep, poll──▶ Succeeded | TimedOut | Failed
//! ```
//!
//! The baseline is read before the trigger fires so a fast agent cannot
//! update between trigger and baseline. The first poll follows the trigger
//! without sleeping. Any query failure is terminal, and so is the first
//! changed revision; only "revision not changed yet" is waited out. A
//! broadcast shutdown signal cancels the session at its next checkpoint.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;

use snapwatch_core::{PackageName, PackageRecord, Revision, WatchConfig};

use crate::error::WatchError;
use crate::source::PackageSource;
use crate::trigger::{TriggerOutcome, UpdateTrigger};

/// Session phase, recorded in order in [`WatchReport::transitions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    Idle,
    TriggerSent,
    Polling,
    Succeeded,
    TimedOut,
    Failed,
    Cancelled,
}

/// How one session ended.
#[derive(Debug)]
pub enum WatchOutcome {
    Succeeded { before: Revision, after: Revision },
    TimedOut,
    Cancelled,
    Failed(WatchError),
}

impl WatchOutcome {
    pub fn state(&self) -> WatchState {
        match self {
            WatchOutcome::Succeeded { .. } => WatchState::Succeeded,
            WatchOutcome::TimedOut => WatchState::TimedOut,
            WatchOutcome::Cancelled => WatchState::Cancelled,
            WatchOutcome::Failed(_) => WatchState::Failed,
        }
    }
}

/// Everything known when a session ends, successful or not.
#[derive(Debug)]
pub struct WatchReport {
    pub package: PackageName,
    pub outcome: WatchOutcome,
    /// State before the trigger, if it could be read.
    pub baseline: Option<PackageRecord>,
    /// Most recent successfully decoded state.
    pub last_known: Option<PackageRecord>,
    pub trigger: Option<TriggerOutcome>,
    /// Post-trigger queries, including the one that ended the session.
    pub polls: u32,
    pub sleeps: u32,
    pub transitions: Vec<WatchState>,
    pub elapsed: Duration,
}

impl WatchReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, WatchOutcome::Succeeded { .. })
    }

    /// Collapse into `(before, after)` or the terminal error.
    pub fn into_result(self) -> Result<(Revision, Revision), WatchError> {
        match self.outcome {
            WatchOutcome::Succeeded { before, after } => Ok((before, after)),
            WatchOutcome::TimedOut => Err(WatchError::TimedOut {
                elapsed: self.elapsed,
                polls: self.polls,
            }),
            WatchOutcome::Cancelled => Err(WatchError::Cancelled { polls: self.polls }),
            WatchOutcome::Failed(err) => Err(err),
        }
    }
}

/// Knobs for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    pub package: PackageName,
    pub poll_interval: Duration,
    /// Deadline measured from session start.
    pub timeout: Duration,
    pub max_polls: Option<u32>,
}

impl WatchSettings {
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            package: config.package.clone(),
            poll_interval: config.poll_interval(),
            timeout: config.timeout(),
            max_polls: config.max_polls,
        }
    }
}

enum Verdict {
    Done,
    Pending,
    Fail(WatchError),
}

/// Compare a post-trigger poll with the baseline.
///
/// Only an unchanged revision is waited out. The first changed revision
/// decides the session: exactly one step up with the service running
/// succeeds, anything else fails.
fn evaluate(baseline: &PackageRecord, current: &PackageRecord) -> Verdict {
    if current.revision == baseline.revision {
        return Verdict::Pending;
    }
    if current.revision < baseline.revision {
        return Verdict::Fail(WatchError::RevisionRegressed {
            before: baseline.revision,
            after: current.revision,
        });
    }
    if current.revision != baseline.revision.next() {
        return Verdict::Fail(WatchError::UnexpectedRevision {
            before: baseline.revision,
            after: current.revision,
        });
    }
    if current.is_running() {
        Verdict::Done
    } else {
        Verdict::Fail(WatchError::NotRunning {
            before: baseline.revision,
            after: current.revision,
        })
    }
}

/// One trigger-and-wait attempt. Consumed by [`WatchSession::run`].
pub struct WatchSession<S, T> {
    source: Arc<S>,
    trigger: Arc<T>,
    settings: WatchSettings,
    shutdown: Option<broadcast::Receiver<()>>,
    state: WatchState,
    transitions: Vec<WatchState>,
    baseline: Option<PackageRecord>,
    last_known: Option<PackageRecord>,
    trigger_outcome: Option<TriggerOutcome>,
    polls: u32,
    sleeps: u32,
}

impl<S: PackageSource, T: UpdateTrigger> WatchSession<S, T> {
    pub fn new(source: Arc<S>, trigger: Arc<T>, settings: WatchSettings) -> Self {
        Self {
            source,
            trigger,
            settings,
            shutdown: None,
            state: WatchState::Idle,
            transitions: vec![WatchState::Idle],
            baseline: None,
            last_known: None,
            trigger_outcome: None,
            polls: 0,
            sleeps: 0,
        }
    }

    /// Cancel the session when a value is broadcast (or the channel lags).
    pub fn with_shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Drive the session to a terminal state.
    pub async fn run(mut self) -> WatchReport {
        let started = Instant::now();
        let deadline = started + self.settings.timeout;
        let outcome = self.drive(deadline).await;
        self.finish(outcome, started.elapsed())
    }

    async fn drive(&mut self, deadline: Instant) -> WatchOutcome {
        let package = self.settings.package.clone();

        // Idle: baseline before anything changes.
        let baseline = match self.query().await {
            Ok(record) => record,
            Err(err) => return WatchOutcome::Failed(err),
        };
        tracing::info!(
            package = %package,
            revision = %baseline.revision,
            running = baseline.is_running(),
            "baseline taken",
        );
        self.baseline = Some(baseline.clone());

        if self.shutdown_requested() {
            return WatchOutcome::Cancelled;
        }
        let outcome = self.fire().await;
        self.trigger_outcome = Some(outcome);
        self.transition(WatchState::TriggerSent);

        loop {
            if self.shutdown_requested() {
                return WatchOutcome::Cancelled;
            }
            let current = match self.query().await {
                Ok(record) => record,
                Err(err) => return WatchOutcome::Failed(err),
            };
            self.polls += 1;

            match evaluate(&baseline, &current) {
                Verdict::Done => {
                    tracing::info!(
                        package = %package,
                        before = %baseline.revision,
                        after = %current.revision,
                        polls = self.polls,
                        "update observed and service running",
                    );
                    return WatchOutcome::Succeeded {
                        before: baseline.revision,
                        after: current.revision,
                    };
                }
                Verdict::Fail(err) => return WatchOutcome::Failed(err),
                Verdict::Pending => {}
            }

            if self.state == WatchState::TriggerSent {
                self.transition(WatchState::Polling);
            }

            if let Some(max) = self.settings.max_polls {
                if self.polls >= max {
                    tracing::warn!(package = %package, polls = self.polls, "poll budget exhausted");
                    return WatchOutcome::TimedOut;
                }
            }
            if Instant::now() >= deadline {
                tracing::warn!(package = %package, polls = self.polls, "watch deadline reached");
                return WatchOutcome::TimedOut;
            }

            tracing::debug!(
                package = %package,
                interval_ms = self.settings.poll_interval.as_millis() as u64,
                "revision unchanged, sleeping",
            );
            if !self.sleep(deadline).await {
                return WatchOutcome::Cancelled;
            }
        }
    }

    /// Sleep one interval, clipped to the deadline. False if cancelled.
    async fn sleep(&mut self, deadline: Instant) -> bool {
        let wake = (Instant::now() + self.settings.poll_interval).min(deadline);
        self.sleeps += 1;
        match self.shutdown.as_mut() {
            Some(shutdown) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(wake) => true,
                    _ = wait_for_shutdown(shutdown) => false,
                }
            }
            None => {
                tokio::time::sleep_until(wake).await;
                true
            }
        }
    }

    async fn query(&mut self) -> Result<PackageRecord, WatchError> {
        let source = Arc::clone(&self.source);
        let package = self.settings.package.clone();
        let lookup = package.clone();
        let found = tokio::task::spawn_blocking(move || source.query_installed(&lookup))
            .await
            .map_err(|err| WatchError::Join(err.to_string()))??;
        let record = found.ok_or(WatchError::NotFound { package })?;
        self.last_known = Some(record.clone());
        Ok(record)
    }

    async fn fire(&self) -> TriggerOutcome {
        let trigger = Arc::clone(&self.trigger);
        match tokio::task::spawn_blocking(move || trigger.fire()).await {
            Ok(outcome) => outcome,
            Err(err) => TriggerOutcome::Unreachable {
                reason: format!("trigger task failed: {err}"),
            },
        }
    }

    fn shutdown_requested(&mut self) -> bool {
        match self.shutdown.as_mut() {
            Some(shutdown) => matches!(
                shutdown.try_recv(),
                Ok(()) | Err(broadcast::error::TryRecvError::Lagged(_))
            ),
            None => false,
        }
    }

    fn transition(&mut self, next: WatchState) {
        tracing::debug!(from = ?self.state, to = ?next, "watch state transition");
        self.state = next;
        self.transitions.push(next);
    }

    fn finish(mut self, outcome: WatchOutcome, elapsed: Duration) -> WatchReport {
        self.transition(outcome.state());
        if let WatchOutcome::Failed(err) = &outcome {
            tracing::error!(package = %self.settings.package, error = %err, "watch failed");
        }
        WatchReport {
            package: self.settings.package,
            outcome,
            baseline: self.baseline,
            last_known: self.last_known,
            trigger: self.trigger_outcome,
            polls: self.polls,
            sleeps: self.sleeps,
            transitions: self.transitions,
            elapsed,
        }
    }
}

/// Resolves on a shutdown broadcast. A closed channel never resolves.
async fn wait_for_shutdown(shutdown: &mut broadcast::Receiver<()>) {
    match shutdown.recv().await {
        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
        Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
    }
}
