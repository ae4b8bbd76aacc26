use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One key/value pair from the performance configuration store.
///
/// Percentage-valued keys hold fractions (`0.05`, never `5`); see
/// [`crate::models::Fraction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: Decimal,
    pub description: String,
}
