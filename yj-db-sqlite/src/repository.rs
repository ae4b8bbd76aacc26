use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, sqlite::SqlitePool};

use yj_core::calculations::common::round_half_up;
use yj_core::db::RepositoryError;
use yj_core::models::{
    CleaningTotals, ConfigEntry, PerformanceRecord, SalesTotals, TaxBracket, WeekRecord,
};
use yj_core::YellowjackRepository;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(FromRow)]
struct ConfigRow {
    config_key: String,
    config_value: String,
    description: String,
}

impl TryFrom<ConfigRow> for ConfigEntry {
    type Error = RepositoryError;

    fn try_from(row: ConfigRow) -> Result<Self, Self::Error> {
        Ok(ConfigEntry {
            key: row.config_key,
            value: parse_decimal(&row.config_value)?,
            description: row.description,
        })
    }
}

#[derive(FromRow)]
struct BracketRow {
    min_revenue: String,
    max_revenue: Option<String>,
    tax_rate: String,
}

impl TryFrom<BracketRow> for TaxBracket {
    type Error = RepositoryError;

    fn try_from(row: BracketRow) -> Result<Self, Self::Error> {
        Ok(TaxBracket {
            min_revenue: parse_decimal(&row.min_revenue)?,
            max_revenue: parse_optional_decimal(&row.max_revenue)?,
            tax_rate: parse_decimal(&row.tax_rate)?,
        })
    }
}

#[derive(FromRow)]
struct WeekRow {
    id: i64,
    week_start: String,
    week_end: String,
    total_revenue: String,
    tax_amount: String,
    effective_tax_rate: String,
    tax_breakdown: String,
    is_finalized: bool,
    finalized_at: Option<String>,
}

impl TryFrom<WeekRow> for WeekRecord {
    type Error = RepositoryError;

    fn try_from(row: WeekRow) -> Result<Self, Self::Error> {
        let tax_breakdown = serde_json::from_str(&row.tax_breakdown).map_err(|e| {
            RepositoryError::Database(format!(
                "Failed to parse tax breakdown '{}': {}",
                row.tax_breakdown, e
            ))
        })?;
        Ok(WeekRecord {
            id: row.id,
            week_start: parse_date(&row.week_start)?,
            week_end: parse_date(&row.week_end)?,
            total_revenue: parse_decimal(&row.total_revenue)?,
            tax_amount: parse_decimal(&row.tax_amount)?,
            effective_tax_rate: parse_decimal(&row.effective_tax_rate)?,
            tax_breakdown,
            is_finalized: row.is_finalized,
            finalized_at: row
                .finalized_at
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
        })
    }
}

#[derive(FromRow)]
struct PerformanceRow {
    user_id: i64,
    week_start: String,
    cleaning_count: i64,
    cleaning_salary_total: String,
    cleaning_hours: String,
    sale_count: i64,
    sales_revenue: String,
    commissions: String,
    cleaning_bonus: String,
    sales_bonus: String,
    total_bonus: String,
    is_finalized: bool,
}

impl TryFrom<PerformanceRow> for PerformanceRecord {
    type Error = RepositoryError;

    fn try_from(row: PerformanceRow) -> Result<Self, Self::Error> {
        Ok(PerformanceRecord {
            user_id: row.user_id,
            week_start: parse_date(&row.week_start)?,
            cleaning_count: row.cleaning_count,
            cleaning_salary_total: parse_decimal(&row.cleaning_salary_total)?,
            cleaning_hours: parse_decimal(&row.cleaning_hours)?,
            sale_count: row.sale_count,
            sales_revenue: parse_decimal(&row.sales_revenue)?,
            commissions: parse_decimal(&row.commissions)?,
            cleaning_bonus: parse_decimal(&row.cleaning_bonus)?,
            sales_bonus: parse_decimal(&row.sales_bonus)?,
            total_bonus: parse_decimal(&row.total_bonus)?,
            is_finalized: row.is_finalized,
        })
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, RepositoryError> {
    s.parse::<Decimal>()
        .map_err(|e| RepositoryError::Database(format!("Failed to parse decimal '{}': {}", s, e)))
}

fn parse_optional_decimal(s: &Option<String>) -> Result<Option<Decimal>, RepositoryError> {
    s.as_ref().map(|s| parse_decimal(s)).transpose()
}

fn parse_date(s: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| RepositoryError::Database(format!("Failed to parse date '{}': {}", s, e)))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    // SQLite stores timestamps in various formats, try common ones
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| RepositoryError::Database(format!("Failed to parse datetime '{}': {}", s, e)))
}

fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// One session's hours from its start and end timestamps, rounded to
/// two places.
fn session_hours(start: NaiveDateTime, end: NaiveDateTime) -> Decimal {
    let seconds = (end - start).num_seconds().max(0);
    round_half_up(Decimal::from(seconds) / Decimal::from(3600))
}

#[async_trait]
impl YellowjackRepository for SqliteRepository {
    async fn list_config_entries(&self) -> Result<Vec<ConfigEntry>, RepositoryError> {
        let rows: Vec<ConfigRow> = sqlx::query_as(
            "SELECT config_key, config_value, description
             FROM weekly_performance_config ORDER BY config_key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn upsert_config_entry(&self, entry: &ConfigEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO weekly_performance_config (config_key, config_value, description)
             VALUES (?, ?, ?)
             ON CONFLICT(config_key) DO UPDATE SET
                 config_value = excluded.config_value,
                 description = excluded.description",
        )
        .bind(&entry.key)
        .bind(entry.value.to_string())
        .bind(&entry.description)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_tax_brackets(&self) -> Result<Vec<TaxBracket>, RepositoryError> {
        // min_revenue is TEXT; lexicographic order would put '1000000'
        // before '200000'.
        let rows: Vec<BracketRow> = sqlx::query_as(
            "SELECT min_revenue, max_revenue, tax_rate
             FROM tax_brackets ORDER BY CAST(min_revenue AS REAL)",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn replace_tax_brackets(&self, brackets: &[TaxBracket]) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM tax_brackets")
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        for bracket in brackets {
            sqlx::query(
                "INSERT INTO tax_brackets (min_revenue, max_revenue, tax_rate)
                 VALUES (?, ?, ?)",
            )
            .bind(bracket.min_revenue.to_string())
            .bind(bracket.max_revenue.map(|d| d.to_string()))
            .bind(bracket.tax_rate.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }

    async fn list_open_weeks(&self) -> Result<Vec<WeekRecord>, RepositoryError> {
        let rows: Vec<WeekRow> = sqlx::query_as(
            "SELECT id, week_start, week_end, total_revenue, tax_amount,
                    effective_tax_rate, tax_breakdown, is_finalized, finalized_at
             FROM weekly_taxes WHERE is_finalized = 0 ORDER BY week_start",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn find_week(
        &self,
        week_start: NaiveDate,
    ) -> Result<Option<WeekRecord>, RepositoryError> {
        let row: Option<WeekRow> = sqlx::query_as(
            "SELECT id, week_start, week_end, total_revenue, tax_amount,
                    effective_tax_rate, tax_breakdown, is_finalized, finalized_at
             FROM weekly_taxes WHERE week_start = ?",
        )
        .bind(week_start.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn insert_week(
        &self,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<WeekRecord, RepositoryError> {
        sqlx::query("INSERT INTO weekly_taxes (week_start, week_end) VALUES (?, ?)")
            .bind(week_start.to_string())
            .bind(week_end.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        self.find_week(week_start)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn reopen_week(&self, week_start: NaiveDate) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE weekly_taxes SET is_finalized = 0, finalized_at = NULL
             WHERE week_start = ?",
        )
        .bind(week_start.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn update_week_totals(&self, week: &WeekRecord) -> Result<(), RepositoryError> {
        let breakdown = serde_json::to_string(&week.tax_breakdown)
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        // The finalization guard lives in the WHERE clause: a locked
        // record is never rewritten.
        let result = sqlx::query(
            "UPDATE weekly_taxes SET
                total_revenue = ?, tax_amount = ?, effective_tax_rate = ?, tax_breakdown = ?
             WHERE week_start = ? AND is_finalized = 0",
        )
        .bind(week.total_revenue.to_string())
        .bind(week.tax_amount.to_string())
        .bind(week.effective_tax_rate.to_string())
        .bind(breakdown)
        .bind(week.week_start.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn finalize_week(
        &self,
        week_start: NaiveDate,
        finalized_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE weekly_taxes SET is_finalized = 1, finalized_at = ?
             WHERE week_start = ?",
        )
        .bind(format_timestamp(finalized_at.naive_utc()))
        .bind(week_start.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_performance(
        &self,
        week_start: NaiveDate,
    ) -> Result<Vec<PerformanceRecord>, RepositoryError> {
        let rows: Vec<PerformanceRow> = sqlx::query_as(
            "SELECT user_id, week_start, cleaning_count, cleaning_salary_total,
                    cleaning_hours, sale_count, sales_revenue, commissions,
                    cleaning_bonus, sales_bonus, total_bonus, is_finalized
             FROM weekly_performance WHERE week_start = ? ORDER BY user_id",
        )
        .bind(week_start.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn seed_performance(
        &self,
        week_start: NaiveDate,
        user_ids: &[i64],
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        for &user_id in user_ids {
            sqlx::query(
                "INSERT INTO weekly_performance (user_id, week_start)
                 VALUES (?, ?)
                 ON CONFLICT(user_id, week_start) DO NOTHING",
            )
            .bind(user_id)
            .bind(week_start.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }

    async fn upsert_performance(&self, record: &PerformanceRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO weekly_performance (
                user_id, week_start, cleaning_count, cleaning_salary_total,
                cleaning_hours, sale_count, sales_revenue, commissions,
                cleaning_bonus, sales_bonus, total_bonus
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, week_start) DO UPDATE SET
                cleaning_count = excluded.cleaning_count,
                cleaning_salary_total = excluded.cleaning_salary_total,
                cleaning_hours = excluded.cleaning_hours,
                sale_count = excluded.sale_count,
                sales_revenue = excluded.sales_revenue,
                commissions = excluded.commissions,
                cleaning_bonus = excluded.cleaning_bonus,
                sales_bonus = excluded.sales_bonus,
                total_bonus = excluded.total_bonus
            WHERE weekly_performance.is_finalized = 0",
        )
        .bind(record.user_id)
        .bind(record.week_start.to_string())
        .bind(record.cleaning_count)
        .bind(record.cleaning_salary_total.to_string())
        .bind(record.cleaning_hours.to_string())
        .bind(record.sale_count)
        .bind(record.sales_revenue.to_string())
        .bind(record.commissions.to_string())
        .bind(record.cleaning_bonus.to_string())
        .bind(record.sales_bonus.to_string())
        .bind(record.total_bonus.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn finalize_performance(&self, week_start: NaiveDate) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE weekly_performance SET is_finalized = 1 WHERE week_start = ?")
            .bind(week_start.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_active_employees(&self) -> Result<Vec<i64>, RepositoryError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT id FROM employees WHERE is_active = 1 ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn sales_totals(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        user_id: Option<i64>,
    ) -> Result<SalesTotals, RepositoryError> {
        const BASE_QUERY: &str = "SELECT final_amount, employee_commission FROM sales
             WHERE created_at >= ? AND created_at < ?";

        let rows: Vec<(String, String)> = match user_id {
            Some(id) => {
                sqlx::query_as(&format!("{} AND user_id = ?", BASE_QUERY))
                    .bind(format_timestamp(from))
                    .bind(format_timestamp(to))
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as(BASE_QUERY)
                    .bind(format_timestamp(from))
                    .bind(format_timestamp(to))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        // Summed in Decimal, not SQL: SQLite's SUM over TEXT would go
        // through floating point.
        let mut totals = SalesTotals::default();
        for (amount, commission) in &rows {
            totals.revenue += parse_decimal(amount)?;
            totals.commissions += parse_decimal(commission)?;
            totals.sale_count += 1;
        }
        Ok(totals)
    }

    async fn cleaning_totals(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        user_id: Option<i64>,
    ) -> Result<CleaningTotals, RepositoryError> {
        const BASE_QUERY: &str =
            "SELECT cleaning_count, total_salary, start_time, end_time FROM cleaning_services
             WHERE status = 'COMPLETED' AND start_time >= ? AND start_time < ?";

        let rows: Vec<(i64, String, String, Option<String>)> = match user_id {
            Some(id) => {
                sqlx::query_as(&format!("{} AND user_id = ?", BASE_QUERY))
                    .bind(format_timestamp(from))
                    .bind(format_timestamp(to))
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as(BASE_QUERY)
                    .bind(format_timestamp(from))
                    .bind(format_timestamp(to))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut totals = CleaningTotals::default();
        for (count, salary, start, end) in &rows {
            totals.cleaning_count += count;
            totals.salary_total += parse_decimal(salary)?;
            if let Some(end) = end {
                let start = parse_datetime(start)?.naive_utc();
                let end = parse_datetime(end)?.naive_utc();
                totals.hours += session_hours(start, end);
            }
        }
        Ok(totals)
    }

    async fn delete_finalized_weeks_before(
        &self,
        cutoff: NaiveDate,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query(
            "DELETE FROM weekly_performance WHERE week_start IN (
                 SELECT week_start FROM weekly_taxes
                 WHERE week_start < ? AND is_finalized = 1
             )",
        )
        .bind(cutoff.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let result =
            sqlx::query("DELETE FROM weekly_taxes WHERE week_start < ? AND is_finalized = 1")
                .bind(cutoff.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        tracing::debug!(%cutoff, removed = result.rows_affected(), "purged finalized weeks");
        Ok(result.rows_affected())
    }
}
