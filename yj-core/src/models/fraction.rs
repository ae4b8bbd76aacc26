use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// A rate stored as a fraction of one.
///
/// The configuration store once held the sales bonus percentage as a
/// whole number (`5` where `0.05` was meant), inflating every payout by
/// two orders of magnitude. This wrapper makes that unrepresentable:
/// construction fails outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Fraction(Decimal);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("rate {0} is outside [0, 1]; percentages are stored as fractions (0.05, not 5)")]
pub struct FractionError(pub Decimal);

impl Fraction {
    pub fn new(value: Decimal) -> Result<Self, FractionError> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(FractionError(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> Decimal {
        self.0
    }
}
