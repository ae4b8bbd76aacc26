use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::models::{
    CleaningTotals, ConfigEntry, PerformanceRecord, SalesTotals, TaxBracket, WeekRecord,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Data-store operations the weekly engine depends on.
///
/// Aggregation methods are pure reads over a half-open timestamp
/// window `[from, to)`; windows with no matching rows sum to zero.
/// Failures propagate — nothing is silently swallowed or partially
/// persisted.
#[async_trait]
pub trait YellowjackRepository: Send + Sync {
    // Performance configuration
    async fn list_config_entries(&self) -> Result<Vec<ConfigEntry>, RepositoryError>;
    async fn upsert_config_entry(&self, entry: &ConfigEntry) -> Result<(), RepositoryError>;

    // Tax bracket schedule, ordered ascending by min_revenue
    async fn get_tax_brackets(&self) -> Result<Vec<TaxBracket>, RepositoryError>;
    async fn replace_tax_brackets(&self, brackets: &[TaxBracket]) -> Result<(), RepositoryError>;

    // Week records
    async fn list_open_weeks(&self) -> Result<Vec<WeekRecord>, RepositoryError>;
    async fn find_week(&self, week_start: NaiveDate)
    -> Result<Option<WeekRecord>, RepositoryError>;
    /// Inserts a zero-valued record. The UNIQUE constraint on
    /// `week_start` rejects duplicates; callers treat that as "someone
    /// else got there first" and refetch.
    async fn insert_week(
        &self,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<WeekRecord, RepositoryError>;
    async fn reopen_week(&self, week_start: NaiveDate) -> Result<(), RepositoryError>;
    /// Writes the computed totals of an open week. Finalized records
    /// are immutable at this layer too.
    async fn update_week_totals(&self, week: &WeekRecord) -> Result<(), RepositoryError>;
    async fn finalize_week(
        &self,
        week_start: NaiveDate,
        finalized_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    // Per-employee performance rows
    async fn list_performance(
        &self,
        week_start: NaiveDate,
    ) -> Result<Vec<PerformanceRecord>, RepositoryError>;
    /// Inserts a zero-valued row per employee, skipping rows that
    /// already exist.
    async fn seed_performance(
        &self,
        week_start: NaiveDate,
        user_ids: &[i64],
    ) -> Result<(), RepositoryError>;
    async fn upsert_performance(&self, record: &PerformanceRecord)
    -> Result<(), RepositoryError>;
    async fn finalize_performance(&self, week_start: NaiveDate) -> Result<(), RepositoryError>;

    // Raw transactional facts
    async fn list_active_employees(&self) -> Result<Vec<i64>, RepositoryError>;
    async fn sales_totals(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        user_id: Option<i64>,
    ) -> Result<SalesTotals, RepositoryError>;
    /// Completed sessions only, keyed on their start time.
    async fn cleaning_totals(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        user_id: Option<i64>,
    ) -> Result<CleaningTotals, RepositoryError>;

    // Retention
    /// Deletes finalized week and performance rows with `week_start`
    /// strictly before the cutoff. Returns the number of weeks removed.
    async fn delete_finalized_weeks_before(
        &self,
        cutoff: NaiveDate,
    ) -> Result<u64, RepositoryError>;
}
