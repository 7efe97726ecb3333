use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod airtable;
mod cache;
mod config;
mod dashboard;
mod db;
mod goals;
mod kpi;
mod mock;
mod models;
mod period;
mod report;
mod screen;
mod shell;
mod source;

use crate::airtable::AirtableClient;
use crate::cache::TableCache;
use crate::config::{Config, SourceKind};
use crate::models::YearMonth;
use crate::period::Period;
use crate::report::Format;
use crate::screen::Screen;
use crate::source::{Loader, Table, TableSource};

/// Weeks of synthetic history generated for the mock source.
const MOCK_WEEKS: u32 = 12;

#[derive(Parser)]
#[command(name = "recruiting-dashboard")]
#[command(about = "Recruitment performance dashboard", long_about = None)]
struct Cli {
    /// Output format for reports
    #[arg(long, value_enum, default_value_t = Format::Markdown, global = true)]
    format: Format,
    /// Write the report to a file instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recruiters found in the daily metrics
    Recruiters,
    /// Daily goal, achievement and weekly projection
    Daily {
        #[arg(long)]
        recruiter: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Week-to-date effectiveness, productivity and quality
    Weekly {
        #[arg(long)]
        recruiter: Option<String>,
        /// Any day of the week; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Monthly totals; without --month, the latest four weeks
    Monthly {
        #[arg(long)]
        recruiter: Option<String>,
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Team roll-up for one day, week or month
    #[command(group(
        ArgGroup::new("period")
            .args(["date", "week", "month"])
            .multiple(false)
    ))]
    Department {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=53))]
        week: Option<u32>,
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Rolling goals derived from weekly history
    Goals {
        #[arg(long)]
        recruiter: Option<String>,
    },
    /// Interactive session sharing one table cache
    Shell,
    /// Create or upgrade the Postgres table store schema
    InitDb,
    /// Load generated data into the Postgres table store
    Seed {
        #[arg(long, default_value_t = MOCK_WEEKS)]
        weeks: u32,
    },
    /// Import rows into one table of the Postgres table store
    Import {
        /// metricas_diarias, metricas_semanales, metas_semanales or config_dias_laborables
        #[arg(long)]
        table: String,
        #[arg(long)]
        csv: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load()?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&cfg).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed { weeks } => {
            let pool = connect(&cfg).await?;
            let data = mock::generate(today, weeks, cfg.mock_seed);
            let inserted = db::seed(&pool, &data).await?;
            println!("Inserted {inserted} seed rows.");
        }
        Commands::Import { table, csv } => {
            let table = Table::from_name(&table)
                .with_context(|| format!("unknown table {table:?}"))?;
            let pool = connect(&cfg).await?;
            let inserted = db::import_csv(&pool, table, &csv).await?;
            println!(
                "Inserted {inserted} rows into {} from {}.",
                table.name(),
                csv.display()
            );
        }
        Commands::Shell => {
            let loader = build_loader(&cfg, today)?;
            shell::run(loader, cli.format, today).await?;
        }
        command => {
            let screen = screen_for(command, today);
            let mut loader = build_loader(&cfg, today)?;
            let data = loader.load().await;
            let view = screen::build(&data, &screen);
            let output = report::render(&view, cli.format)?;
            match cli.out {
                Some(out) => {
                    std::fs::write(&out, output)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Report written to {}.", out.display());
                }
                None => print!("{output}"),
            }
        }
    }

    Ok(())
}

fn screen_for(command: Commands, today: NaiveDate) -> Screen {
    match command {
        Commands::Daily { recruiter, date } => Screen::Daily {
            recruiter,
            date: date.unwrap_or(today),
        },
        Commands::Weekly { recruiter, date } => Screen::Weekly {
            recruiter,
            date: date.unwrap_or(today),
        },
        Commands::Monthly { recruiter, month } => Screen::Monthly { recruiter, month },
        Commands::Department { date, week, month } => Screen::Department(
            match (date, week, month) {
                (_, Some(week), _) => Period::Week(week),
                (_, _, Some(month)) => Period::Month(month),
                (date, None, None) => Period::Day(date.unwrap_or(today)),
            },
        ),
        Commands::Goals { recruiter } => Screen::Goals { recruiter },
        _ => Screen::Recruiters,
    }
}

fn build_loader(cfg: &Config, today: NaiveDate) -> anyhow::Result<Loader> {
    let source = match cfg.source {
        SourceKind::Airtable => {
            let api_key = cfg
                .airtable_api_key
                .clone()
                .context("AIRTABLE_API_KEY must be set")?;
            let base_id = cfg
                .airtable_base_id
                .clone()
                .context("AIRTABLE_BASE_ID must be set")?;
            TableSource::Airtable(AirtableClient::new(&cfg.airtable_api_url, base_id, api_key))
        }
        SourceKind::Postgres => {
            let database_url = cfg
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres source")?;
            // Lazy so that an unreachable store degrades like any other fetch failure.
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect_lazy(database_url)
                .context("invalid DATABASE_URL")?;
            TableSource::Postgres(pool)
        }
        SourceKind::Mock => {
            warn!("no live data source configured; using generated mock data");
            TableSource::Mock(mock::generate(today, MOCK_WEEKS, cfg.mock_seed))
        }
    };

    info!(
        source = source.describe(),
        cache_ttl_secs = cfg.cache_ttl.as_secs(),
        "data source ready"
    );
    Ok(Loader::new(source, TableCache::new(cfg.cache_ttl)))
}

async fn connect(cfg: &Config) -> anyhow::Result<PgPool> {
    let database_url = cfg
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}
