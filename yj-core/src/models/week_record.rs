use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::BracketContribution;

/// Establishment-wide tax window for one business week.
///
/// `week_start` is always a Friday and is unique across records.
/// `week_end` stores the last *covered* calendar day, `week_start + 6`
/// (the following Thursday); the underlying timestamp window runs from
/// `week_start` 00:00 inclusive to the next Friday 00:00 exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekRecord {
    pub id: i64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_revenue: Decimal,
    pub tax_amount: Decimal,
    pub effective_tax_rate: Decimal,
    /// Per-bracket contributions from the last recomputation, in
    /// ascending bracket order.
    pub tax_breakdown: Vec<BracketContribution>,
    pub is_finalized: bool,
    pub finalized_at: Option<DateTime<Utc>>,
}
