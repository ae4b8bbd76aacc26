use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A contiguous revenue range with a marginal tax rate.
///
/// `max_revenue` of `None` marks the open-ended top bracket. A valid
/// schedule is sorted ascending by `min_revenue`, starts at zero, has no
/// gaps or overlaps, and ends with exactly one open-ended bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_revenue: Decimal,
    pub max_revenue: Option<Decimal>,
    pub tax_rate: Decimal,
}

/// One bracket's share of a progressive tax computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketContribution {
    pub min_revenue: Decimal,
    pub max_revenue: Option<Decimal>,
    pub tax_rate: Decimal,
    /// The slice of revenue that fell inside this bracket.
    pub taxed_amount: Decimal,
    /// `taxed_amount × tax_rate`, rounded to cents.
    pub tax_contribution: Decimal,
}
