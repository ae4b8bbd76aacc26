use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use yj_data::ScheduleLoader;
use yj_db_sqlite::SqliteRepository;

/// Load a progressive tax schedule from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - min_revenue: The lower bound of the bracket
/// - max_revenue: The upper bound (empty for the open top bracket)
/// - tax_rate: The marginal rate as a fraction (e.g. 0.06 for 6%)
#[derive(Parser, Debug)]
#[command(name = "yj-schedule-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing the tax schedule
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL (e.g. sqlite:yellowjack.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:yellowjack.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    println!("Loading tax schedule from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = ScheduleLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let loaded = ScheduleLoader::load(&repo, &records)
        .await
        .context("Failed to load tax schedule into database")?;

    println!("Successfully loaded a schedule of {} brackets.", loaded);

    Ok(())
}
