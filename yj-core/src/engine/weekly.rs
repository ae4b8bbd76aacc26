use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::calculations::week_period;
use crate::calculations::{BonusSettings, compute_bonus, compute_tax, validate_schedule};
use crate::db::YellowjackRepository;
use crate::engine::{EngineError, RequestContext};
use crate::models::{CleaningTotals, ConfigEntry, Role, SalesTotals, TaxBracket, WeekRecord};

/// Result of a finalization request.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    Finalized(WeekRecord),
    /// The record was already locked. Reported, not an error: the
    /// second call changes nothing.
    AlreadyFinalized,
}

/// Facts for one week window, establishment-wide or for one employee.
struct WeekAggregates {
    sales: SalesTotals,
    cleaning: CleaningTotals,
}

/// The calculation engine, borrowed over a repository for the duration
/// of one logical operation.
pub struct WeeklyEngine<'a> {
    repo: &'a dyn YellowjackRepository,
}

impl<'a> WeeklyEngine<'a> {
    pub fn new(repo: &'a dyn YellowjackRepository) -> Self {
        Self { repo }
    }

    /// Returns the most recent open week, creating or reusing the
    /// record for the period containing `today` when none is open.
    ///
    /// `today` is the caller's current calendar date, never a queried
    /// one: it decides which period may be opened, or reopened on the
    /// recovery path. After a rollover the previous week can still be
    /// open awaiting explicit finalization; the newest open week wins.
    /// Safe to call repeatedly: uniqueness on `week_start` means a
    /// lost insert race resolves to the record the winner created.
    pub async fn active_week(&self, today: NaiveDate) -> Result<WeekRecord, EngineError> {
        if let Some(week) = self.latest_open_week().await? {
            return Ok(week);
        }

        self.ensure_week(week_period::week_start_for(today), true)
            .await
    }

    /// True iff `date` falls inside the most recent open week's
    /// covered days. A pure read: no record is created or reopened,
    /// and with nothing open the answer is `false`.
    pub async fn is_date_in_active_week(&self, date: NaiveDate) -> Result<bool, EngineError> {
        Ok(match self.latest_open_week().await? {
            Some(week) => week_period::contains(week.week_start, date),
            None => false,
        })
    }

    /// The scheduled weekly entry point: makes sure the current
    /// period's record exists and every active employee has a
    /// zero-valued performance row. Idempotent; never finalizes the
    /// previous week — that stays a deliberate administrator action.
    pub async fn rollover(&self, today: NaiveDate) -> Result<WeekRecord, EngineError> {
        let week_start = week_period::week_start_for(today);
        let week = self.ensure_week(week_start, false).await?;

        if !week.is_finalized {
            let employees = self.repo.list_active_employees().await?;
            self.repo.seed_performance(week_start, &employees).await?;
            debug!(%week_start, employees = employees.len(), "rollover seeded performance rows");
        }

        Ok(week)
    }

    /// Recomputes an open week from the raw facts, replacing (never
    /// accumulating) stored aggregates and bonuses. A finalized week
    /// is returned untouched.
    pub async fn recompute_week(&self, week_start: NaiveDate) -> Result<WeekRecord, EngineError> {
        let week = self
            .repo
            .find_week(week_start)
            .await?
            .ok_or(EngineError::UnknownWeek(week_start))?;
        if week.is_finalized {
            return Ok(week);
        }
        self.recompute_open_week(week).await
    }

    /// Locks a week: one last recomputation, then the terminal
    /// `OPEN → FINALIZED` transition on the week and all its
    /// performance rows. Requires [`Role::Patron`].
    pub async fn finalize_week(
        &self,
        ctx: &RequestContext,
        week_start: NaiveDate,
    ) -> Result<FinalizeOutcome, EngineError> {
        ctx.require(Role::Patron, "week finalization")?;

        let week = self
            .repo
            .find_week(week_start)
            .await?
            .ok_or(EngineError::UnknownWeek(week_start))?;
        if week.is_finalized {
            info!(%week_start, "finalization requested for an already finalized week");
            return Ok(FinalizeOutcome::AlreadyFinalized);
        }

        let mut week = self.recompute_open_week(week).await?;
        let finalized_at = Utc::now();
        self.repo.finalize_performance(week_start).await?;
        self.repo.finalize_week(week_start, finalized_at).await?;
        week.is_finalized = true;
        week.finalized_at = Some(finalized_at);

        info!(%week_start, tax = %week.tax_amount, "week finalized");
        Ok(FinalizeOutcome::Finalized(week))
    }

    /// Writes one configuration entry. Requires [`Role::Patron`];
    /// percentage keys are range-checked so a whole number can never
    /// reach the store.
    pub async fn set_config_entry(
        &self,
        ctx: &RequestContext,
        entry: &ConfigEntry,
    ) -> Result<(), EngineError> {
        ctx.require(Role::Patron, "configuration change")?;
        crate::calculations::bonus::validate_entry(entry)?;
        self.repo.upsert_config_entry(entry).await?;
        info!(key = %entry.key, value = %entry.value, "configuration updated");
        Ok(())
    }

    /// Replaces the bracket schedule after validating it. Requires
    /// [`Role::Patron`].
    pub async fn replace_tax_brackets(
        &self,
        ctx: &RequestContext,
        brackets: &[TaxBracket],
    ) -> Result<(), EngineError> {
        ctx.require(Role::Patron, "tax schedule change")?;
        validate_schedule(brackets)?;
        self.repo.replace_tax_brackets(brackets).await?;
        info!(brackets = brackets.len(), "tax schedule replaced");
        Ok(())
    }

    /// Retention: drops finalized weeks older than `cutoff`. Requires
    /// [`Role::Patron`]. Open weeks are never touched.
    pub async fn purge_finalized_before(
        &self,
        ctx: &RequestContext,
        cutoff: NaiveDate,
    ) -> Result<u64, EngineError> {
        ctx.require(Role::Patron, "retention purge")?;
        let removed = self.repo.delete_finalized_weeks_before(cutoff).await?;
        info!(%cutoff, removed, "retention purge complete");
        Ok(removed)
    }

    /// The newest open week, if any. Duplicate open records for one
    /// period have no meaningful order and are an invariant violation.
    async fn latest_open_week(&self) -> Result<Option<WeekRecord>, EngineError> {
        let mut open = self.repo.list_open_weeks().await?;
        open.sort_by_key(|w| w.week_start);
        if open
            .windows(2)
            .any(|pair| pair[0].week_start == pair[1].week_start)
        {
            return Err(EngineError::MultipleOpenWeeks { count: open.len() });
        }
        Ok(open.pop())
    }

    /// Finds or creates the record for `week_start`. When
    /// `reopen_finalized` is set and the existing record is finalized,
    /// it is reopened — the recovery path for a period whose record
    /// was locked while the period was still running.
    async fn ensure_week(
        &self,
        week_start: NaiveDate,
        reopen_finalized: bool,
    ) -> Result<WeekRecord, EngineError> {
        if let Some(mut week) = self.repo.find_week(week_start).await? {
            if week.is_finalized && reopen_finalized {
                warn!(%week_start, "reopening finalized record for the current period");
                self.repo.reopen_week(week_start).await?;
                week.is_finalized = false;
                week.finalized_at = None;
            }
            return Ok(week);
        }

        let week_end = week_period::week_end_for(week_start);
        match self.repo.insert_week(week_start, week_end).await {
            Ok(week) => {
                info!(%week_start, %week_end, "opened new week");
                Ok(week)
            }
            // Lost the insert race: the UNIQUE(week_start) constraint
            // rejected us, so the winner's record must exist now.
            Err(insert_err) => match self.repo.find_week(week_start).await? {
                Some(week) => Ok(week),
                None => Err(insert_err.into()),
            },
        }
    }

    async fn aggregates_for(
        &self,
        week_start: NaiveDate,
        user_id: Option<i64>,
    ) -> Result<WeekAggregates, EngineError> {
        let (from, to) = week_period::week_window(week_start);
        Ok(WeekAggregates {
            sales: self.repo.sales_totals(from, to, user_id).await?,
            cleaning: self.repo.cleaning_totals(from, to, user_id).await?,
        })
    }

    async fn recompute_open_week(&self, mut week: WeekRecord) -> Result<WeekRecord, EngineError> {
        let entries = self.repo.list_config_entries().await?;
        let settings = BonusSettings::from_entries(&entries)?;
        let brackets = self.repo.get_tax_brackets().await?;
        validate_schedule(&brackets)?;

        for mut record in self.repo.list_performance(week.week_start).await? {
            if record.is_finalized {
                continue;
            }
            let agg = self
                .aggregates_for(week.week_start, Some(record.user_id))
                .await?;
            let bonus = compute_bonus(agg.cleaning.cleaning_count, agg.sales.revenue, &settings);

            record.cleaning_count = agg.cleaning.cleaning_count;
            record.cleaning_salary_total = agg.cleaning.salary_total;
            record.cleaning_hours = agg.cleaning.hours;
            record.sale_count = agg.sales.sale_count;
            record.sales_revenue = agg.sales.revenue;
            record.commissions = agg.sales.commissions;
            record.cleaning_bonus = bonus.cleaning_bonus;
            record.sales_bonus = bonus.sales_bonus;
            record.total_bonus = bonus.total_bonus;
            self.repo.upsert_performance(&record).await?;
        }

        let totals = self.aggregates_for(week.week_start, None).await?;
        let tax = compute_tax(totals.sales.revenue, &brackets)?;
        week.total_revenue = totals.sales.revenue;
        week.tax_amount = tax.tax_amount;
        week.effective_tax_rate = tax.effective_rate;
        week.tax_breakdown = tax.breakdown;
        self.repo.update_week_totals(&week).await?;

        debug!(
            week_start = %week.week_start,
            revenue = %week.total_revenue,
            tax = %week.tax_amount,
            "week recomputed"
        );
        Ok(week)
    }
}
