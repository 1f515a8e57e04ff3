//! ChartAlign CLI: fetch, align, and emit multi-ticker comparison charts.
//!
//! Commands:
//! - `compare` - fetch history for up to five tickers and emit aligned chart rows
//! - `normalize` - align a JSON file of already-fetched `{symbol, data}` series

use anyhow::{bail, Context, Result};
use chartalign_core::align::align_raw;
use chartalign_core::chart::to_chart_rows;
use chartalign_core::data::{build_cached_provider, ProviderKind, TracingProgress};
use chartalign_core::export::{export_csv, export_json, render_summary, write_to};
use chartalign_core::{
    run_comparison, series_order, ticker_order, AlignedTable, ChartConfig, ChartRow,
    ComparisonRequest, HistoryPeriod, RawSeries,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chartalign",
    about = "Align and rebase stock price histories for comparison charts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch history for the given tickers and emit aligned chart rows.
    Compare {
        /// Tickers in chart order (e.g., RELIANCE TCS INFY). Falls back to the config file.
        tickers: Vec<String>,

        /// Look-back period: 1mo, 3mo, 6mo, 1y, 5y.
        #[arg(long)]
        period: Option<HistoryPeriod>,

        /// History source: yahoo, backend, synthetic.
        #[arg(long)]
        provider: Option<ProviderKind>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Always fetch, bypassing the history cache.
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Align a JSON array of `{symbol, data}` series read from a file.
    Normalize {
        #[arg(long)]
        input: PathBuf,

        /// Comma-separated ticker order. Defaults to the order in the file.
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Table,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the chart data
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            tickers,
            period,
            provider,
            config,
            no_cache,
            format,
            output,
        } => run_compare(tickers, period, provider, config, no_cache, format, output),
        Commands::Normalize {
            input,
            tickers,
            format,
            output,
        } => run_normalize(&input, &tickers, format, output),
    }
}

fn run_compare(
    tickers: Vec<String>,
    period: Option<HistoryPeriod>,
    provider: Option<ProviderKind>,
    config_path: Option<PathBuf>,
    no_cache: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = ChartConfig::load(config_path.as_deref())?;

    // Flags override the config file
    if let Some(kind) = provider {
        config.provider.kind = kind;
    }
    if no_cache {
        config.cache.enabled = false;
    }
    let tickers = if tickers.is_empty() {
        config.comparison.tickers.clone()
    } else {
        tickers
    };
    if tickers.is_empty() {
        bail!("no tickers given on the command line or in [comparison] of the config file");
    }
    let period = period.unwrap_or(config.comparison.period);

    let request = ComparisonRequest::new(&tickers, period)?;
    let provider = build_cached_provider(&config.provider, &config.cache)?;
    let comparison = run_comparison(provider.as_ref(), &request, &TracingProgress);

    for (ticker, err) in &comparison.fetch.errors {
        eprintln!("Error for {ticker}: {err}");
    }
    if comparison.validation.skipped_total() > 0 {
        eprintln!(
            "Skipped {} malformed observation(s)",
            comparison.validation.skipped_total()
        );
    }

    emit(
        &comparison.table,
        &comparison.rows,
        format,
        output.as_deref(),
    )
}

fn run_normalize(
    input: &Path,
    tickers: &[String],
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let raw: Vec<RawSeries> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of {{symbol, data}}", input.display()))?;

    // Same position rules as `compare`: canonical, deduplicated, at most five
    let order = if tickers.is_empty() {
        series_order(&raw)?
    } else {
        ticker_order(tickers)?
    };

    let (table, report) = align_raw(&raw, &order);
    if report.skipped_total() > 0 {
        eprintln!("Skipped {} malformed observation(s)", report.skipped_total());
    }
    let rows = to_chart_rows(&table);

    emit(&table, &rows, format, output.as_deref())
}

fn emit(
    table: &AlignedTable,
    rows: &[ChartRow],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    tracing::info!(
        rows = rows.len(),
        fingerprint = %table.fingerprint(),
        "chart data ready"
    );

    let mut contents = match format {
        OutputFormat::Json => export_json(rows)?,
        OutputFormat::Csv => export_csv(rows, table.series.len())?,
        OutputFormat::Table => render_summary(table),
    };

    match output {
        Some(path) => {
            if !contents.ends_with('\n') {
                contents.push('\n');
            }
            write_to(path, &contents)?;
            eprintln!("Wrote {} row(s) to {}", rows.len(), path.display());
        }
        None => {
            print!("{contents}");
            if !contents.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(())
}
