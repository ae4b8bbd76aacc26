//! Progressive tax over the establishment's bracket schedule.
//!
//! Each bracket taxes only the slice of revenue that falls inside it,
//! at its own marginal rate; this is never a flat lookup of the single
//! bracket containing the total. The schedule itself is configuration
//! (see the `tax_brackets` table and the `yj-data` loader) and is
//! validated before every computation rather than trusted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{round_half_up, round_rate};
use crate::models::{BracketContribution, TaxBracket};

/// Ways a bracket schedule can be malformed. All of them fail fast;
/// the engine never guesses which bracket wins.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxScheduleError {
    #[error("tax schedule is empty")]
    Empty,

    #[error("first bracket starts at {0}, expected 0")]
    FirstBracketNotZero(Decimal),

    #[error("brackets are not contiguous: one ends at {prev_max}, the next starts at {next_min}")]
    NotContiguous { prev_max: Decimal, next_min: Decimal },

    #[error("bracket starting at {0} is open-ended but is not the top bracket")]
    OpenBracketBelowTop(Decimal),

    #[error("top bracket (starting at {0}) must be open-ended")]
    BoundedTop(Decimal),

    #[error("bracket starting at {min_revenue} has negative rate {rate}")]
    NegativeRate { min_revenue: Decimal, rate: Decimal },
}

/// Result of a progressive tax computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputation {
    pub tax_amount: Decimal,
    /// `tax_amount / total_revenue`, zero when revenue is zero.
    pub effective_rate: Decimal,
    /// One entry per bracket the revenue reached, ascending. A
    /// zero-rate floor tier is kept with a zero contribution, so the
    /// persisted breakdown shows the full ladder the revenue climbed.
    pub breakdown: Vec<BracketContribution>,
}

impl TaxComputation {
    fn zero() -> Self {
        Self {
            tax_amount: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
            breakdown: Vec::new(),
        }
    }
}

/// Checks that `brackets` form a sorted, contiguous schedule covering
/// every revenue value from zero upward, with exactly one open top.
pub fn validate_schedule(brackets: &[TaxBracket]) -> Result<(), TaxScheduleError> {
    let Some(first) = brackets.first() else {
        return Err(TaxScheduleError::Empty);
    };
    if first.min_revenue != Decimal::ZERO {
        return Err(TaxScheduleError::FirstBracketNotZero(first.min_revenue));
    }

    for (i, bracket) in brackets.iter().enumerate() {
        if bracket.tax_rate < Decimal::ZERO {
            return Err(TaxScheduleError::NegativeRate {
                min_revenue: bracket.min_revenue,
                rate: bracket.tax_rate,
            });
        }
        let is_last = i == brackets.len() - 1;
        match (bracket.max_revenue, is_last) {
            (None, false) => {
                return Err(TaxScheduleError::OpenBracketBelowTop(bracket.min_revenue));
            }
            (Some(_), true) => {
                return Err(TaxScheduleError::BoundedTop(bracket.min_revenue));
            }
            (Some(max), false) => {
                let next = &brackets[i + 1];
                if next.min_revenue != max {
                    return Err(TaxScheduleError::NotContiguous {
                        prev_max: max,
                        next_min: next.min_revenue,
                    });
                }
            }
            (None, true) => {}
        }
    }

    Ok(())
}

/// Computes the progressive tax on `total_revenue`.
///
/// The schedule is validated first; see [`validate_schedule`]. Revenue
/// at or below zero produces an all-zero result, never a
/// divide-by-zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use yj_core::calculations::tax::compute_tax;
/// use yj_core::models::TaxBracket;
///
/// let brackets = vec![
///     TaxBracket { min_revenue: dec!(0), max_revenue: Some(dec!(200000)), tax_rate: dec!(0) },
///     TaxBracket { min_revenue: dec!(200000), max_revenue: None, tax_rate: dec!(0.06) },
/// ];
///
/// let result = compute_tax(dec!(300000), &brackets).unwrap();
/// assert_eq!(result.tax_amount, dec!(6000.00));
/// assert_eq!(result.effective_rate, dec!(0.02));
/// ```
pub fn compute_tax(
    total_revenue: Decimal,
    brackets: &[TaxBracket],
) -> Result<TaxComputation, TaxScheduleError> {
    validate_schedule(brackets)?;

    if total_revenue <= Decimal::ZERO {
        return Ok(TaxComputation::zero());
    }

    let mut tax_amount = Decimal::ZERO;
    let mut breakdown = Vec::new();

    for bracket in brackets {
        let upper = match bracket.max_revenue {
            Some(max) => max.min(total_revenue),
            None => total_revenue,
        };
        let taxed_amount = upper - bracket.min_revenue;
        if taxed_amount <= Decimal::ZERO {
            // Revenue never reached this bracket.
            break;
        }

        let tax_contribution = round_half_up(taxed_amount * bracket.tax_rate);
        tax_amount += tax_contribution;
        breakdown.push(BracketContribution {
            min_revenue: bracket.min_revenue,
            max_revenue: bracket.max_revenue,
            tax_rate: bracket.tax_rate,
            taxed_amount,
            tax_contribution,
        });
    }

    Ok(TaxComputation {
        tax_amount: round_half_up(tax_amount),
        effective_rate: round_rate(tax_amount / total_revenue),
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn bracket(min: Decimal, max: Option<Decimal>, rate: Decimal) -> TaxBracket {
        TaxBracket {
            min_revenue: min,
            max_revenue: max,
            tax_rate: rate,
        }
    }

    /// The schedule seeded by the sqlite migrations.
    fn default_schedule() -> Vec<TaxBracket> {
        vec![
            bracket(dec!(0), Some(dec!(200000)), dec!(0)),
            bracket(dec!(200000), Some(dec!(400000)), dec!(0.06)),
            bracket(dec!(400000), Some(dec!(600000)), dec!(0.10)),
            bracket(dec!(600000), Some(dec!(800000)), dec!(0.15)),
            bracket(dec!(800000), Some(dec!(1000000)), dec!(0.20)),
            bracket(dec!(1000000), None, dec!(0.25)),
        ]
    }

    // ── validation ───────────────────────────────────────────────────

    #[test]
    fn default_schedule_is_valid() {
        assert_eq!(validate_schedule(&default_schedule()), Ok(()));
    }

    #[test]
    fn empty_schedule_is_rejected() {
        assert_eq!(validate_schedule(&[]), Err(TaxScheduleError::Empty));
    }

    #[test]
    fn schedule_must_start_at_zero() {
        let brackets = vec![bracket(dec!(100), None, dec!(0.10))];
        assert_eq!(
            validate_schedule(&brackets),
            Err(TaxScheduleError::FirstBracketNotZero(dec!(100)))
        );
    }

    #[test]
    fn gap_between_brackets_is_rejected() {
        let brackets = vec![
            bracket(dec!(0), Some(dec!(100)), dec!(0)),
            bracket(dec!(150), None, dec!(0.10)),
        ];
        assert_eq!(
            validate_schedule(&brackets),
            Err(TaxScheduleError::NotContiguous {
                prev_max: dec!(100),
                next_min: dec!(150),
            })
        );
    }

    #[test]
    fn overlapping_brackets_are_rejected() {
        let brackets = vec![
            bracket(dec!(0), Some(dec!(100)), dec!(0)),
            bracket(dec!(50), None, dec!(0.10)),
        ];
        assert_eq!(
            validate_schedule(&brackets),
            Err(TaxScheduleError::NotContiguous {
                prev_max: dec!(100),
                next_min: dec!(50),
            })
        );
    }

    #[test]
    fn top_bracket_must_be_open_ended() {
        let brackets = vec![
            bracket(dec!(0), Some(dec!(100)), dec!(0)),
            bracket(dec!(100), Some(dec!(200)), dec!(0.10)),
        ];
        assert_eq!(
            validate_schedule(&brackets),
            Err(TaxScheduleError::BoundedTop(dec!(100)))
        );
    }

    #[test]
    fn open_bracket_below_the_top_is_rejected() {
        let brackets = vec![
            bracket(dec!(0), None, dec!(0)),
            bracket(dec!(100), None, dec!(0.10)),
        ];
        assert_eq!(
            validate_schedule(&brackets),
            Err(TaxScheduleError::OpenBracketBelowTop(dec!(0)))
        );
    }

    #[test]
    fn negative_rate_is_rejected() {
        let brackets = vec![bracket(dec!(0), None, dec!(-0.05))];
        assert_eq!(
            validate_schedule(&brackets),
            Err(TaxScheduleError::NegativeRate {
                min_revenue: dec!(0),
                rate: dec!(-0.05),
            })
        );
    }

    // ── computation ──────────────────────────────────────────────────

    #[test]
    fn zero_revenue_is_all_zero() {
        let result = compute_tax(dec!(0), &default_schedule()).unwrap();

        assert_eq!(result.tax_amount, dec!(0));
        assert_eq!(result.effective_rate, dec!(0));
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn revenue_exactly_at_the_first_boundary_pays_nothing() {
        let result = compute_tax(dec!(200000), &default_schedule()).unwrap();

        assert_eq!(result.tax_amount, dec!(0.00));
        assert_eq!(result.effective_rate, dec!(0));
    }

    #[test]
    fn revenue_in_the_second_bracket_is_taxed_marginally() {
        // First 200,000 at 0%, remaining 100,000 at 6%.
        let result = compute_tax(dec!(300000), &default_schedule()).unwrap();

        assert_eq!(result.tax_amount, dec!(6000.00));
        assert_eq!(result.effective_rate, dec!(0.02));
    }

    #[test]
    fn breakdown_lists_every_bracket_the_revenue_reached() {
        let result = compute_tax(dec!(300000), &default_schedule()).unwrap();

        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown[0].taxed_amount, dec!(200000));
        assert_eq!(result.breakdown[0].tax_contribution, dec!(0.00));
        assert_eq!(result.breakdown[1].taxed_amount, dec!(100000));
        assert_eq!(result.breakdown[1].tax_contribution, dec!(6000.00));
    }

    #[test]
    fn revenue_through_every_bracket() {
        // 200k@0 + 200k@6% + 200k@10% + 200k@15% + 200k@20% + 500k@25%
        let result = compute_tax(dec!(1500000), &default_schedule()).unwrap();

        assert_eq!(result.tax_amount, dec!(227000.00));
        assert_eq!(result.effective_rate, dec!(0.1513));
        assert_eq!(result.breakdown.len(), 6);
        assert_eq!(result.breakdown[5].taxed_amount, dec!(500000));
        assert_eq!(result.breakdown[5].tax_contribution, dec!(125000.00));
    }

    #[test]
    fn effective_rate_never_exceeds_the_top_marginal_rate() {
        for revenue in [dec!(1), dec!(250000), dec!(999999), dec!(50000000)] {
            let result = compute_tax(revenue, &default_schedule()).unwrap();
            assert!(result.tax_amount >= dec!(0));
            assert!(result.effective_rate >= dec!(0));
            assert!(result.effective_rate <= dec!(0.25), "revenue {revenue}");
        }
    }

    #[test]
    fn malformed_schedule_fails_the_computation() {
        let brackets = vec![bracket(dec!(100), None, dec!(0.10))];
        assert_eq!(
            compute_tax(dec!(300000), &brackets),
            Err(TaxScheduleError::FirstBracketNotZero(dec!(100)))
        );
    }
}
