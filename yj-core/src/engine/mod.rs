//! The weekly performance and tax engine.
//!
//! Orchestrates the pure calculations in [`crate::calculations`] over
//! a [`crate::db::YellowjackRepository`]: locating the active week,
//! recomputing aggregates and bonuses, finalizing a week, the
//! scheduled rollover, and retention. The acting identity is passed
//! explicitly as a [`RequestContext`]; there is no ambient session.

mod context;
mod error;
mod weekly;

pub use context::RequestContext;
pub use error::EngineError;
pub use weekly::{FinalizeOutcome, WeeklyEngine};
