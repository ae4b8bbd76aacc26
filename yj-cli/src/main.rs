mod logging;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use yj_core::db::{DbConfig, RepositoryRegistry};
use yj_core::engine::{FinalizeOutcome, RequestContext, WeeklyEngine};
use yj_core::models::{ConfigEntry, Role, WeekRecord};
use yj_db_sqlite::SqliteRepositoryFactory;

/// Back-office administration for Le Yellowjack.
///
/// Weeks run Friday through Thursday. Sales and cleaning facts are
/// recorded by the point-of-sale side; this tool manages the weekly
/// aggregates: rollover, recomputation, reporting, finalization,
/// configuration, and retention.
#[derive(Parser, Debug)]
#[command(name = "yj")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Database URL (e.g. sqlite:yellowjack.db?mode=rwc to create if missing)
    #[arg(long, global = true, default_value = "sqlite:yellowjack.db?mode=rwc")]
    database: String,

    /// Database backend name
    #[arg(long, global = true, default_value = "sqlite")]
    backend: String,

    /// Acting user id, recorded with permission-gated operations
    #[arg(long, global = true, default_value_t = 0)]
    actor: i64,

    /// Acting user role: CDD, CDI, RESPONSABLE or PATRON
    #[arg(long, global = true, default_value = "CDD")]
    role: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the current week if needed and seed a zero row per active employee
    Rollover,

    /// Recompute aggregates, bonuses and tax for a week from the raw facts
    Recompute {
        /// Week start (a Friday, YYYY-MM-DD); defaults to the active week
        #[arg(long)]
        week: Option<NaiveDate>,
    },

    /// Print the weekly report: establishment totals and per-employee rows
    Report {
        /// Week start (a Friday, YYYY-MM-DD); defaults to the active week
        #[arg(long)]
        week: Option<NaiveDate>,
    },

    /// Show the active week and whether a date falls inside it
    Status {
        /// Date to check (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Recompute and permanently lock a week (requires PATRON)
    Finalize {
        /// Week start (a Friday, YYYY-MM-DD)
        #[arg(long)]
        week: NaiveDate,

        /// Finalization cannot be undone; pass this to proceed
        #[arg(long)]
        confirm: bool,
    },

    /// Delete finalized weeks older than a cutoff (requires PATRON)
    Purge {
        /// Delete finalized weeks starting strictly before this date
        #[arg(long)]
        before: NaiveDate,

        /// Deletion cannot be undone; pass this to proceed
        #[arg(long)]
        confirm: bool,
    },

    /// Inspect or change the bonus configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// List every configuration entry
    Show,

    /// Write one configuration entry (requires PATRON)
    Set {
        key: String,

        /// Percentages are fractions: 0.05, never 5
        value: Decimal,

        #[arg(long, default_value = "")]
        description: String,
    },
}

fn print_week(week: &WeekRecord) {
    println!(
        "Week {} .. {} [{}]",
        week.week_start,
        week.week_end,
        if week.is_finalized { "FINALIZED" } else { "open" }
    );
    println!("  revenue:        {}", week.total_revenue);
    println!("  tax:            {}", week.tax_amount);
    println!("  effective rate: {}", week.effective_tax_rate);
    for line in &week.tax_breakdown {
        let upper = line
            .max_revenue
            .map(|d| d.to_string())
            .unwrap_or_else(|| "∞".to_string());
        println!(
            "    {:>10} .. {:<10} rate {:<6} on {:>12} -> {}",
            line.min_revenue, upper, line.tax_rate, line.taxed_amount, line.tax_contribution
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();

    let role = Role::parse(&cli.role)
        .with_context(|| format!("unknown role '{}'; expected CDD, CDI, RESPONSABLE or PATRON", cli.role))?;
    let ctx = RequestContext::new(cli.actor, role);

    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));

    let config = DbConfig {
        backend: cli.backend.clone(),
        connection_string: cli.database.clone(),
    };
    let repo = registry
        .create(&config)
        .await
        .with_context(|| format!("Failed to open database: {}", cli.database))?;
    let engine = WeeklyEngine::new(repo.as_ref());

    let today = Utc::now().date_naive();

    match cli.command {
        Command::Rollover => {
            let week = engine.rollover(today).await?;
            println!("Rollover complete.");
            print_week(&week);
        }

        Command::Recompute { week } => {
            let week_start = match week {
                Some(start) => start,
                None => engine.active_week(today).await?.week_start,
            };
            let week = engine.recompute_week(week_start).await?;
            print_week(&week);
        }

        Command::Report { week } => {
            let week = match week {
                Some(start) => engine.recompute_week(start).await?,
                None => {
                    let start = engine.active_week(today).await?.week_start;
                    engine.recompute_week(start).await?
                }
            };
            print_week(&week);

            let rows = repo.list_performance(week.week_start).await?;
            if rows.is_empty() {
                println!("  (no performance rows; run rollover first)");
            }
            for row in rows {
                println!(
                    "  user {:>4}: {} sales / {}, {} cleanings / {}h, bonus {} + {} = {}",
                    row.user_id,
                    row.sale_count,
                    row.sales_revenue,
                    row.cleaning_count,
                    row.cleaning_hours,
                    row.cleaning_bonus,
                    row.sales_bonus,
                    row.total_bonus,
                );
            }
        }

        Command::Status { date } => {
            let date = date.unwrap_or(today);
            let week = engine.active_week(today).await?;
            print_week(&week);
            if engine.is_date_in_active_week(date).await? {
                println!("{} falls inside the active week.", date);
            } else {
                println!("{} falls outside the active week.", date);
            }
        }

        Command::Finalize { week, confirm } => {
            if !confirm {
                bail!("finalization is permanent; re-run with --confirm");
            }
            match engine.finalize_week(&ctx, week).await? {
                FinalizeOutcome::Finalized(week) => {
                    println!("Week finalized.");
                    print_week(&week);
                }
                FinalizeOutcome::AlreadyFinalized => {
                    println!("Week starting {} was already finalized; nothing changed.", week);
                }
            }
        }

        Command::Purge { before, confirm } => {
            if !confirm {
                bail!("purging is permanent; re-run with --confirm");
            }
            let removed = engine.purge_finalized_before(&ctx, before).await?;
            println!("Removed {} finalized week(s) before {}.", removed, before);
        }

        Command::Config(ConfigCommand::Show) => {
            for entry in repo.list_config_entries().await? {
                println!("{:<28} {:>10}  {}", entry.key, entry.value, entry.description);
            }
        }

        Command::Config(ConfigCommand::Set {
            key,
            value,
            description,
        }) => {
            let entry = ConfigEntry {
                key,
                value,
                description,
            };
            engine.set_config_entry(&ctx, &entry).await?;
            println!("{} = {}", entry.key, entry.value);
        }
    }

    Ok(())
}
