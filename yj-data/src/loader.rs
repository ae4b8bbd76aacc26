use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use yj_core::YellowjackRepository;
use yj_core::calculations::{TaxScheduleError, validate_schedule};
use yj_core::db::RepositoryError;
use yj_core::models::TaxBracket;

/// Errors that can occur when loading a tax schedule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("invalid tax schedule: {0}")]
    InvalidSchedule(#[from] TaxScheduleError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for ScheduleLoaderError {
    fn from(err: csv::Error) -> Self {
        ScheduleLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the tax schedule CSV file.
///
/// Columns:
/// - `min_revenue`: the lower bound of the bracket
/// - `max_revenue`: the upper bound (empty for the open top bracket)
/// - `tax_rate`: the marginal rate as a fraction (e.g. 0.06 for 6%)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BracketRecord {
    pub min_revenue: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_revenue: Option<Decimal>,
    pub tax_rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl From<&BracketRecord> for TaxBracket {
    fn from(record: &BracketRecord) -> Self {
        TaxBracket {
            min_revenue: record.min_revenue,
            max_revenue: record.max_revenue,
            tax_rate: record.tax_rate,
        }
    }
}

/// Loader for tax schedule data from CSV files.
///
/// The loader reads CSV data, validates the resulting schedule, and
/// replaces the stored schedule via the `YellowjackRepository` trait,
/// so it works with any database backend. A schedule that fails
/// validation never reaches the store.
pub struct ScheduleLoader;

impl ScheduleLoader {
    /// Parse bracket records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, ScheduleLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Validate the records as a complete schedule and replace the
    /// stored one with it.
    ///
    /// Records are sorted by `min_revenue` first, so the CSV row order
    /// does not matter. Loading is idempotent: the same file loaded
    /// twice produces the same stored schedule.
    pub async fn load<R>(repo: &R, records: &[BracketRecord]) -> Result<usize, ScheduleLoaderError>
    where
        R: YellowjackRepository + ?Sized,
    {
        let mut brackets: Vec<TaxBracket> = records.iter().map(TaxBracket::from).collect();
        brackets.sort_by(|a, b| a.min_revenue.cmp(&b.min_revenue));

        validate_schedule(&brackets)?;
        repo.replace_tax_brackets(&brackets).await?;

        Ok(brackets.len())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_single_bracket() {
        let csv = "min_revenue,max_revenue,tax_rate\n0,200000,0";

        let records = ScheduleLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            BracketRecord {
                min_revenue: dec!(0),
                max_revenue: Some(dec!(200000)),
                tax_rate: dec!(0),
            }
        );
    }

    #[test]
    fn parse_unbounded_top_bracket() {
        let csv = "min_revenue,max_revenue,tax_rate\n1000000,,0.25";

        let records = ScheduleLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].min_revenue, dec!(1000000));
        assert_eq!(records[0].max_revenue, None);
        assert_eq!(records[0].tax_rate, dec!(0.25));
    }

    #[test]
    fn parse_empty_csv() {
        let csv = "min_revenue,max_revenue,tax_rate\n";

        let records = ScheduleLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    #[test]
    fn parse_rejects_missing_column() {
        let csv = "min_revenue,max_revenue\n0,200000";

        let err = ScheduleLoader::parse(csv.as_bytes()).expect_err("Should fail");

        let ScheduleLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {err:?}");
        };
        assert!(
            msg.contains("missing field"),
            "Expected 'missing field' in error, got: {msg}"
        );
    }

    #[test]
    fn parse_rejects_bad_decimal() {
        let csv = "min_revenue,max_revenue,tax_rate\nabc,200000,0";

        let result = ScheduleLoader::parse(csv.as_bytes());

        assert!(matches!(result, Err(ScheduleLoaderError::CsvParse(_))));
    }
}
