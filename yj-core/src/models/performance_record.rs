use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One employee's aggregated facts and computed bonuses for one week.
///
/// Identified by (`user_id`, `week_start`). A zero-valued row is seeded
/// when a week opens; values are replaced wholesale on every
/// recomputation while the row is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub user_id: i64,
    pub week_start: NaiveDate,

    // Aggregated facts
    pub cleaning_count: i64,
    pub cleaning_salary_total: Decimal,
    pub cleaning_hours: Decimal,
    pub sale_count: i64,
    pub sales_revenue: Decimal,
    pub commissions: Decimal,

    // Computed bonuses
    pub cleaning_bonus: Decimal,
    pub sales_bonus: Decimal,
    pub total_bonus: Decimal,

    /// Tracked independently of the week record: a row already
    /// finalized is excluded from recomputation.
    pub is_finalized: bool,
}

impl PerformanceRecord {
    /// A zero-valued row, as seeded when a new week opens.
    pub fn zeroed(user_id: i64, week_start: NaiveDate) -> Self {
        Self {
            user_id,
            week_start,
            cleaning_count: 0,
            cleaning_salary_total: Decimal::ZERO,
            cleaning_hours: Decimal::ZERO,
            sale_count: 0,
            sales_revenue: Decimal::ZERO,
            commissions: Decimal::ZERO,
            cleaning_bonus: Decimal::ZERO,
            sales_bonus: Decimal::ZERO,
            total_bonus: Decimal::ZERO,
            is_finalized: false,
        }
    }
}
