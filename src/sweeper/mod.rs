//! Index retention sweeping.

mod error;
mod report;
mod selection;
mod worker;

pub use error::{DeletionError, SweepError};
pub use report::{PrefixReport, RunOutcome, RunStatus, SweepReport};
pub use selection::{Selection, select_victims};
pub use worker::{SweepPolicy, Sweeper};
