//! Business-rule calculations for the weekly performance engine.
//!
//! Everything in this module is pure: week-boundary resolution,
//! progressive tax over the bracket schedule, and the threshold-based
//! bonus formulas. Persistence lives behind [`crate::db`].

pub mod bonus;
pub mod common;
pub mod tax;
pub mod week_period;

pub use bonus::{BonusBreakdown, BonusSettings, ConfigError, compute_bonus};
pub use tax::{TaxComputation, TaxScheduleError, compute_tax, validate_schedule};
