//! Threshold-based bonus ("prime") formulas.
//!
//! Rates and thresholds come from the configuration store; nothing here
//! is hard-coded. A missing key is an explicit error — a silent zero
//! rate would look exactly like a correctly configured zero bonus.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::round_half_up;
use crate::models::{ConfigEntry, Fraction, FractionError};

/// Bonus paid per completed cleaning.
pub const KEY_CLEANING_PER_UNIT: &str = "prime_menage_per_unit";
/// Cleaning count above which the extra per-unit rate applies.
pub const KEY_CLEANING_THRESHOLD: &str = "prime_menage_threshold";
/// Extra bonus per cleaning above the threshold.
pub const KEY_CLEANING_ABOVE_RATE: &str = "prime_menage_above_rate";
/// Sales bonus as a fraction of weekly revenue.
pub const KEY_SALES_PERCENTAGE: &str = "prime_vente_percentage";
/// Weekly revenue above which the extra fraction applies.
pub const KEY_SALES_THRESHOLD: &str = "prime_vente_threshold";
/// Extra fraction applied to revenue above the threshold.
pub const KEY_SALES_ABOVE_RATE: &str = "prime_vente_above_rate";

/// Keys whose values are fractions of one and must pass the
/// [`Fraction`] range check before they are stored or used.
pub const FRACTION_KEYS: [&str; 2] = [KEY_SALES_PERCENTAGE, KEY_SALES_ABOVE_RATE];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration incomplete: missing key '{0}'")]
    MissingKey(&'static str),

    #[error("configuration key '{key}' is invalid: {source}")]
    InvalidFraction {
        key: &'static str,
        source: FractionError,
    },
}

/// The six configuration values the bonus formulas consume, already
/// validated. Built from the raw store with [`BonusSettings::from_entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonusSettings {
    pub cleaning_per_unit: Decimal,
    pub cleaning_threshold: Decimal,
    pub cleaning_above_rate: Decimal,
    pub sales_rate: Fraction,
    pub sales_threshold: Decimal,
    pub sales_above_rate: Fraction,
}

impl BonusSettings {
    /// Resolves the required keys out of the raw configuration store.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::MissingKey`] — a required key is absent.
    /// * [`ConfigError::InvalidFraction`] — a percentage key holds a
    ///   whole number instead of a fraction (`5` where `0.05` was meant).
    pub fn from_entries(entries: &[ConfigEntry]) -> Result<Self, ConfigError> {
        let value = |key: &'static str| -> Result<Decimal, ConfigError> {
            entries
                .iter()
                .find(|e| e.key == key)
                .map(|e| e.value)
                .ok_or(ConfigError::MissingKey(key))
        };
        let fraction = |key: &'static str| -> Result<Fraction, ConfigError> {
            Fraction::new(value(key)?)
                .map_err(|source| ConfigError::InvalidFraction { key, source })
        };

        Ok(Self {
            cleaning_per_unit: value(KEY_CLEANING_PER_UNIT)?,
            cleaning_threshold: value(KEY_CLEANING_THRESHOLD)?,
            cleaning_above_rate: value(KEY_CLEANING_ABOVE_RATE)?,
            sales_rate: fraction(KEY_SALES_PERCENTAGE)?,
            sales_threshold: value(KEY_SALES_THRESHOLD)?,
            sales_above_rate: fraction(KEY_SALES_ABOVE_RATE)?,
        })
    }
}

/// Rejects writes that would corrupt the store: percentage keys must
/// hold fractions. Non-percentage keys pass through untouched.
pub fn validate_entry(entry: &ConfigEntry) -> Result<(), ConfigError> {
    for key in FRACTION_KEYS {
        if entry.key == key {
            Fraction::new(entry.value)
                .map_err(|source| ConfigError::InvalidFraction { key, source })?;
        }
    }
    Ok(())
}

/// One employee's computed bonuses for a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusBreakdown {
    pub cleaning_bonus: Decimal,
    pub sales_bonus: Decimal,
    pub total_bonus: Decimal,
}

/// Applies the threshold formulas to one employee's weekly aggregates.
///
/// * cleaning: `count × per_unit`, plus `(count − threshold) ×
///   above_rate` for the portion over the threshold;
/// * sales: `revenue × rate`, plus `(revenue − threshold) × above_rate`
///   for the portion over the threshold.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use yj_core::calculations::bonus::{BonusSettings, compute_bonus};
/// use yj_core::models::Fraction;
///
/// let settings = BonusSettings {
///     cleaning_per_unit: dec!(2.00),
///     cleaning_threshold: dec!(20),
///     cleaning_above_rate: dec!(1.50),
///     sales_rate: Fraction::new(dec!(0.05)).unwrap(),
///     sales_threshold: dec!(500),
///     sales_above_rate: Fraction::new(dec!(0.02)).unwrap(),
/// };
///
/// let bonus = compute_bonus(25, dec!(700), &settings);
/// assert_eq!(bonus.cleaning_bonus, dec!(57.50)); // 25×2.00 + 5×1.50
/// assert_eq!(bonus.sales_bonus, dec!(39.00));    // 700×0.05 + 200×0.02
/// assert_eq!(bonus.total_bonus, dec!(96.50));
/// ```
pub fn compute_bonus(
    cleaning_count: i64,
    sales_revenue: Decimal,
    settings: &BonusSettings,
) -> BonusBreakdown {
    let count = Decimal::from(cleaning_count);

    let mut cleaning_bonus = count * settings.cleaning_per_unit;
    if count > settings.cleaning_threshold {
        cleaning_bonus += (count - settings.cleaning_threshold) * settings.cleaning_above_rate;
    }

    let mut sales_bonus = sales_revenue * settings.sales_rate.get();
    if sales_revenue > settings.sales_threshold {
        sales_bonus += (sales_revenue - settings.sales_threshold) * settings.sales_above_rate.get();
    }

    let cleaning_bonus = round_half_up(cleaning_bonus);
    let sales_bonus = round_half_up(sales_bonus);

    BonusBreakdown {
        cleaning_bonus,
        sales_bonus,
        total_bonus: round_half_up(cleaning_bonus + sales_bonus),
    }
}
