use chrono::NaiveDate;
use thiserror::Error;

use crate::calculations::{ConfigError, TaxScheduleError};
use crate::db::RepositoryError;
use crate::models::Role;

/// Failures surfaced to the calling administrative layer. None of
/// these auto-correct stored data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid tax schedule: {0}")]
    Schedule(#[from] TaxScheduleError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The "at most one open week" invariant is broken in storage.
    #[error("{count} weeks are open at once; refusing to pick one")]
    MultipleOpenWeeks { count: usize },

    #[error("no week recorded with start {0}")]
    UnknownWeek(NaiveDate),

    #[error("{action} requires role {required}, caller {user_id} has {actual}")]
    PermissionDenied {
        action: &'static str,
        required: Role,
        actual: Role,
        user_id: i64,
    },
}
