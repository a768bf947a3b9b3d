//! Update watch sessions: fire the agent's update trigger, then poll the
//! package daemon until the installed revision advances.

mod error;
pub mod session;
pub mod source;
pub mod trigger;

pub use error::WatchError;
pub use session::{WatchOutcome, WatchReport, WatchSession, WatchSettings, WatchState};
pub use source::PackageSource;
pub use trigger::{HttpTrigger, TriggerOutcome, UpdateTrigger};
