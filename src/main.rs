use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::time::{interval, Duration};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod aggregate;
mod db;
mod models;
mod report;
mod simulate;
mod sink;
mod snapshot;

use aggregate::{cutoff_date, fold_records, Aggregator, DashboardStats, ImpactFactors};
use sink::Dashboard;
use snapshot::Snapshot;

#[derive(Parser)]
#[command(name = "waste-dashboard")]
#[command(about = "Live waste-sorting dashboard for the Sort(Ed) pilot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed classifications
    Seed,
    /// Import classification records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Aggregate stored classifications and print the dashboard once
    Stats {
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        factors: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long)]
        factors: Option<PathBuf>,
    },
    /// Follow the classification stream and redraw on every change
    Watch {
        #[arg(long, default_value_t = 3)]
        interval_secs: u64,
        #[arg(long)]
        factors: Option<PathBuf>,
    },
    /// Feed the dashboard from a local demo generator instead of the store
    Simulate {
        #[arg(long, default_value_t = 3)]
        interval_secs: u64,
        /// Number of batches to generate; 0 keeps going until interrupted
        #[arg(long, default_value_t = 20)]
        ticks: u32,
        #[arg(long)]
        factors: Option<PathBuf>,
    },
    /// Render the dashboard from one snapshot document on disk
    Ingest {
        #[arg(long)]
        json: PathBuf,
        #[arg(long)]
        factors: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect_pool().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect_pool().await?;
            db::seed(&pool).await?;
            println!("Seed classifications inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect_pool().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} classifications from {}.", csv.display());
        }
        Commands::Stats {
            since_days,
            category,
            factors,
        } => {
            let pool = connect_pool().await?;
            let factors = load_factors(factors.as_deref())?;
            let since = since_days.map(cutoff_date);
            let records = db::fetch_classifications(&pool, since, category.as_deref()).await?;

            if records.is_empty() {
                println!("No classifications found for this window.");
                return Ok(());
            }

            let stats = DashboardStats::compute(fold_records(&records), &factors);
            let mut dashboard = Dashboard::new();
            dashboard.apply(&stats);
            println!("Aggregated {} classifications.", records.len());
            println!();
            print!("{}", dashboard.render());
        }
        Commands::Report {
            since_days,
            category,
            out,
            factors,
        } => {
            let pool = connect_pool().await?;
            let factors = load_factors(factors.as_deref())?;
            let since = since_days.map(cutoff_date);
            let records = db::fetch_classifications(&pool, since, category.as_deref()).await?;
            let report = report::build_report(category.as_deref(), since, &records, &factors);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Watch {
            interval_secs,
            factors,
        } => {
            let pool = connect_pool().await?;
            let factors = load_factors(factors.as_deref())?;
            watch_dashboard(&pool, interval_secs, &factors).await;
        }
        Commands::Simulate {
            interval_secs,
            ticks,
            factors,
        } => {
            let factors = load_factors(factors.as_deref())?;
            run_simulation(interval_secs, ticks, &factors).await;
        }
        Commands::Ingest { json, factors } => {
            let factors = load_factors(factors.as_deref())?;
            let text = std::fs::read_to_string(&json)
                .with_context(|| format!("failed to read snapshot from {}", json.display()))?;
            let stats = Snapshot::from_json(&text)?.into_stats(&factors);
            let mut dashboard = Dashboard::new();
            dashboard.apply(&stats);
            print!("{}", dashboard.render());
        }
    }

    Ok(())
}

async fn connect_pool() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the classification store")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn load_factors(path: Option<&Path>) -> anyhow::Result<ImpactFactors> {
    match path {
        Some(path) => ImpactFactors::from_path(path),
        None => Ok(ImpactFactors::default()),
    }
}

/// Poll the store and redraw whenever the aggregate changes. The aggregate is
/// recomputed from the full record set on every delivery; fetch errors keep
/// the last good state on screen.
async fn watch_dashboard(pool: &PgPool, interval_secs: u64, factors: &ImpactFactors) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    let mut dashboard = Dashboard::new();
    let mut last_stats: Option<DashboardStats> = None;

    info!(interval_secs, "watching the classification stream");

    loop {
        ticker.tick().await;

        let records = match db::fetch_classifications(pool, None, None).await {
            Ok(records) => records,
            Err(error) => {
                warn!(%error, "classification fetch failed, keeping last good state");
                continue;
            }
        };

        let stats = DashboardStats::compute(fold_records(&records), factors);
        if last_stats.as_ref() == Some(&stats) {
            continue;
        }

        dashboard.apply(&stats);
        println!("{} classifications", records.len());
        print!("{}", dashboard.render());
        println!();
        last_stats = Some(stats);
    }
}

/// Local demo feed: one synthetic batch per tick, folded into a session
/// accumulator so totals only ever grow.
async fn run_simulation(interval_secs: u64, ticks: u32, factors: &ImpactFactors) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    let mut rng = StdRng::from_entropy();
    let mut aggregator = Aggregator::new();
    let mut dashboard = Dashboard::new();
    let mut completed = 0u32;

    info!(interval_secs, ticks, "simulating classification batches");

    loop {
        ticker.tick().await;

        let batch = simulate::generate_batch(&mut rng);
        aggregator.ingest(&batch);
        dashboard.apply(&aggregator.stats(factors));

        completed += 1;
        println!("Batch {completed}");
        print!("{}", dashboard.render());
        println!();

        if ticks != 0 && completed >= ticks {
            break;
        }
    }
}
