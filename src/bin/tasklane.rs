//! Command-line entry point for the autoclose job.
//!
//! Usage:
//!
//! ```text
//! tasklane [--config <path>] migrate
//! tasklane [--config <path>] sweep [--now <RFC3339>] [--json]
//! tasklane [--config <path>] scheduler
//! ```
//!
//! `sweep` runs a single cycle and exits non-zero when any task failed to
//! close. `scheduler` sweeps on the configured interval until Ctrl-C, letting
//! a sweep in progress finish before exiting.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use mockable::{Clock, DefaultClock};
use std::io::{self, Write};
use std::sync::Arc;
use tasklane::autoclose::{AutocloseScheduler, AutocloseService, SweepReport};
use tasklane::config::AppConfig;
use tasklane::database::{self, PgPool};
use tasklane::task::{adapters::postgres::PostgresTaskRepository, ports::TaskRepository};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

const POOL_SIZE: u32 = 4;

/// Tasklane deadline autoclose job.
#[derive(Debug, Parser)]
#[command(name = "tasklane", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database schema if it does not exist.
    Migrate,
    /// Run one autoclose sweep and print its report.
    Sweep {
        /// Instant to sweep against instead of the current time.
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Sweep on the configured interval until interrupted.
    Scheduler,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tasklane=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let pool = connect(&config).await?;

    match cli.command {
        Command::Migrate => migrate(pool).await,
        Command::Sweep { now, json } => sweep(&config, pool, now, json).await,
        Command::Scheduler => schedule(&config, pool).await,
    }
}

async fn connect(config: &AppConfig) -> Result<PgPool, BoxError> {
    let url = config
        .database_url
        .clone()
        .ok_or("no database configured: set DATABASE_URL or database_url")?;
    let checkout_timeout = config.autoclose.database_timeout();
    let pool = tokio::task::spawn_blocking(move || {
        database::build_pool(&url, POOL_SIZE, checkout_timeout)
    })
    .await??;
    Ok(pool)
}

fn task_store(config: &AppConfig, pool: PgPool) -> Arc<PostgresTaskRepository> {
    Arc::new(PostgresTaskRepository::with_statement_timeout(
        pool,
        config.autoclose.database_timeout(),
    ))
}

async fn migrate(pool: PgPool) -> Result<(), BoxError> {
    tokio::task::spawn_blocking(move || database::apply_schema(&pool)).await??;
    info!("database schema is up to date");
    Ok(())
}

async fn sweep(
    config: &AppConfig,
    pool: PgPool,
    now: Option<DateTime<Utc>>,
    json: bool,
) -> Result<(), BoxError> {
    let service = AutocloseService::from_config(task_store(config, pool), &config.autoclose);
    let sweep_at = now.unwrap_or_else(|| DefaultClock.utc());
    sweep_once(&service, sweep_at, json, &mut io::stdout().lock()).await
}

/// Runs one sweep, writes its report to `out`, and fails when any task could
/// not be closed.
async fn sweep_once<T: TaskRepository>(
    service: &AutocloseService<T>,
    now: DateTime<Utc>,
    json: bool,
    out: &mut impl Write,
) -> Result<(), BoxError> {
    let report = service.run_sweep(now).await?;
    write_report(out, &report, json)?;
    ensure_clean(&report)
}

fn ensure_clean(report: &SweepReport) -> Result<(), BoxError> {
    if report.is_clean() {
        Ok(())
    } else {
        Err(format!("{} task(s) could not be closed", report.failures().len()).into())
    }
}

async fn schedule(config: &AppConfig, pool: PgPool) -> Result<(), BoxError> {
    let service = Arc::new(AutocloseService::from_config(
        task_store(config, pool),
        &config.autoclose,
    ));
    let scheduler =
        AutocloseScheduler::new(service, Arc::new(DefaultClock), config.autoclose.interval())?;
    let handle = scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, stopping after the current cycle");
    handle.shutdown().await?;
    Ok(())
}

fn write_report(out: &mut impl Write, report: &SweepReport, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        return writeln!(out);
    }

    writeln!(
        out,
        "sweep at {}: closed {}, skipped {}, failed {}",
        report.now().to_rfc3339(),
        report.closed_count(),
        report.skipped().len(),
        report.failures().len()
    )?;
    for failure in report.failures() {
        writeln!(out, "  {}: {}", failure.task_id, failure.reason)?;
    }
    Ok(())
}
