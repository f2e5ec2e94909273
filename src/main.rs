use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use gridload::aggregate;
use gridload::dataset::{Dataset, LoadState};
use gridload::ingest::{DataSource, ParseOptions};
use gridload::models::{ParsedSamples, WindowSpan};
use gridload::report;

#[derive(Parser)]
#[command(name = "gridload")]
#[command(about = "Windowed and averaged views over hourly grid load readings", long_about = None)]
struct Cli {
    /// Dataset file path or http(s) URL
    #[arg(long, env = "GRIDLOAD_DATASET", default_value = "data/Dataset.csv")]
    source: String,
    /// Field delimiter of the dataset
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// Zero-based column holding the load value
    #[arg(long, default_value_t = 10)]
    load_column: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load profile for a trailing window
    Window {
        #[arg(long, value_enum, default_value_t = WindowSpan::Week)]
        span: WindowSpan,
    },
    /// Average load per calendar month
    Monthly,
    /// Average load per 7-day bucket of one month
    Weekly {
        /// Month key, e.g. 2024-03
        #[arg(long)]
        month: String,
    },
    /// Raw readings for one calendar month or seven days from a start date
    #[command(group(
        ArgGroup::new("range")
            .args(["month", "start"])
            .required(true)
            .multiple(false)
    ))]
    Slice {
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Headline metrics
    Summary,
    /// Generate a markdown report
    Report {
        #[arg(long, value_enum, default_value_t = WindowSpan::Week)]
        span: WindowSpan,
        #[arg(long)]
        month: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let delimiter = u8::try_from(cli.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .context("delimiter must be a single ASCII character")?;
    let options = ParseOptions {
        delimiter,
        load_column: cli.load_column,
        ..ParseOptions::default()
    };
    let source = cli.source.parse::<DataSource>()?;

    let mut dataset = Dataset::new(source, options);
    let cancel = dataset.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let state = dataset.load().await.clone();
    interrupt.abort();

    let parsed = match state {
        LoadState::Ready(parsed) => parsed,
        LoadState::Unavailable { reason } => {
            anyhow::bail!("dataset unavailable, try again: {reason}")
        }
        LoadState::Pending => anyhow::bail!("dataset load was cancelled"),
    };
    let samples = parsed.samples.as_slice();

    // one view per run, so the views are computed directly rather than cached
    match cli.command {
        Commands::Window { span } => {
            let points = aggregate::to_load_points(&aggregate::filter_by_window(samples, span));
            if points.is_empty() {
                tracing::warn!(%span, "no readings in window");
            }
            print_json(&points)?;
        }
        Commands::Monthly => {
            print_json(&aggregate::monthly_averages(samples))?;
        }
        Commands::Weekly { month } => {
            let weekly = aggregate::weekly_averages(samples, &month);
            if weekly.is_empty() {
                tracing::warn!(%month, "no readings for month");
            }
            print_json(&weekly)?;
        }
        Commands::Slice { month, start } => {
            let slice = match (month, start) {
                (Some(month), _) => aggregate::filter_by_month(samples, &month),
                (None, Some(start)) => aggregate::filter_week_from(samples, start),
                (None, None) => anyhow::bail!("either --month or --start is required"),
            };
            print_json(&aggregate::to_load_points(&slice))?;
        }
        Commands::Summary => {
            print_json(&aggregate::summarize(samples))?;
        }
        Commands::Report { span, month, out } => {
            let report = report::build_report(
                &dataset.source().to_string(),
                span,
                month.as_deref(),
                &parsed,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
            log_skipped_rows(&parsed);
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn log_skipped_rows(parsed: &ParsedSamples) {
    for row_error in parsed.row_errors.iter() {
        tracing::debug!(line = row_error.line, message = %row_error.message, "skipped row");
    }
}
