use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sales facts summed over a week window. Empty windows sum to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesTotals {
    pub revenue: Decimal,
    pub commissions: Decimal,
    pub sale_count: i64,
}

/// Completed cleaning-session facts summed over a week window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningTotals {
    pub cleaning_count: i64,
    pub salary_total: Decimal,
    pub hours: Decimal,
}
