//! The agent's "update now" control call.
//!
//! The agent handles the request asynchronously, so the call is
//! fire-and-forget: the outcome is recorded and logged, never fatal.

use std::time::Duration;

use serde::Serialize;

/// What happened when the trigger was fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum TriggerOutcome {
    /// Any 2xx.
    Accepted { status: u16 },
    /// The endpoint answered with a non-2xx status.
    Rejected { status: u16 },
    /// No HTTP status at all (refused, DNS, timeout).
    Unreachable { reason: String },
}

impl TriggerOutcome {
    pub fn status(&self) -> Option<u16> {
        match self {
            TriggerOutcome::Accepted { status } | TriggerOutcome::Rejected { status } => {
                Some(*status)
            }
            TriggerOutcome::Unreachable { .. } => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, TriggerOutcome::Accepted { .. })
    }
}

/// Asks the agent under test to start an update.
pub trait UpdateTrigger: Send + Sync + 'static {
    /// Blocking; runs on tokio's blocking pool.
    fn fire(&self) -> TriggerOutcome;
}

/// Plain `GET` against the agent's local control port.
#[derive(Debug, Clone)]
pub struct HttpTrigger {
    url: String,
    agent: ureq::Agent,
}

impl HttpTrigger {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl UpdateTrigger for HttpTrigger {
    fn fire(&self) -> TriggerOutcome {
        let outcome = match self.agent.get(&self.url).call() {
            Ok(response) if (200..300).contains(&response.status()) => TriggerOutcome::Accepted {
                status: response.status(),
            },
            Ok(response) => TriggerOutcome::Rejected {
                status: response.status(),
            },
            Err(ureq::Error::Status(status, _)) => TriggerOutcome::Rejected { status },
            Err(err) => TriggerOutcome::Unreachable {
                reason: err.to_string(),
            },
        };

        match &outcome {
            TriggerOutcome::Accepted { status } => {
                tracing::info!(url = %self.url, status, "update trigger accepted");
            }
            TriggerOutcome::Rejected { status } => {
                tracing::warn!(url = %self.url, status, "update trigger returned non-success status");
            }
            TriggerOutcome::Unreachable { reason } => {
                tracing::warn!(url = %self.url, reason = %reason, "update trigger unreachable");
            }
        }
        outcome
    }
}
