//! CLI entry point for the FTA fatal-incidents tool.
//!
//! Every subcommand runs the same fetch → agency filter → normalize →
//! fatality selection pipeline and hands the survivors to one report.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use fta_fatalities::{
    analyzers::{aggregate::by_coordinate, summary::DatasetSummary, types::CoordinateRow},
    config::PipelineConfig,
    error::PipelineError,
    fetch::{BasicClient, load_events},
    output::{append_record, csv_text, print_pretty},
    pipeline,
    render::{BasemapReport, DeadliestReport, Renderer, TimelineReport, console},
    stats::RunStats,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fta_fatalities")]
#[command(
    about = "Fatal incident reports for New York transit from the FTA Major Safety Events dataset",
    long_about = None
)]
struct Cli {
    /// JSON config file; missing keys take the New York defaults
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dataset URL or path to a local JSON file
    #[arg(short, long, global = true, value_name = "FILE_OR_URL")]
    source: Option<String>,

    /// Maximum number of records to request
    #[arg(short, long, global = true)]
    limit: Option<u64>,

    /// Directory reports are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// CSV file to append run statistics to
    #[arg(long, global = true, value_name = "FILE")]
    stats_csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by the reports that produce files.
#[derive(Args, Debug, Default)]
struct ReportArgs {
    /// Also write the ranked coordinate buckets to this CSV file
    #[arg(long, value_name = "FILE")]
    export_csv: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dataset overview and New York value counts
    Summary,
    /// Deadliest locations and incidents, with a static chart
    Deadliest(ReportArgs),
    /// Interactive map of fatal incidents inside the New York box
    Map(ReportArgs),
    /// Interactive month-by-month map with a time slider
    Timeline(ReportArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Summary => "summary",
            Commands::Deadliest(_) => DeadliestReport.name(),
            Commands::Map(_) => BasemapReport.name(),
            Commands::Timeline(_) => TimelineReport.name(),
        }
    }

    fn renderer(&self) -> Option<(Box<dyn Renderer>, &ReportArgs)> {
        match self {
            Commands::Summary => None,
            Commands::Deadliest(args) => Some((Box::new(DeadliestReport), args)),
            Commands::Map(args) => Some((Box::new(BasemapReport), args)),
            Commands::Timeline(args) => Some((Box::new(TimelineReport), args)),
        }
    }
}

impl Cli {
    /// Defaults, then the config file, then command-line flags.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(source) = &self.source {
            config.endpoint = source.clone();
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        Ok(config)
    }
}

/// Colored stderr plus a JSON rolling log file. The returned guard must be
/// held until exit so buffered lines are flushed.
fn init_tracing() -> WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/fta_fatalities.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fta_fatalities.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;
    let mut stats = RunStats::new().with_run_info(cli.command.name(), &config.endpoint);

    let client = BasicClient::new();
    let outcome = match execute(&cli, &client, &config, &mut stats).await {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<PipelineError>() {
            Some(pipeline_error) if pipeline_error.is_empty_result() => {
                warn!(error = %pipeline_error, "Nothing to report");
                println!("\n{}", guidance(pipeline_error));
                stats = stats.with_error(pipeline_error.kind(), &pipeline_error.to_string());
                Ok(())
            }
            other => {
                let kind = other.map_or("report_error", PipelineError::kind);
                error!(error = %e, kind, "Run failed");
                stats = stats.with_error(kind, &format!("{e:#}"));
                Err(e)
            }
        },
    };

    print_pretty(&stats);
    info!(
        fetched = stats.fetched,
        agency_matches = stats.agency_matches,
        dropped = stats.dropped(),
        fatal_incidents = stats.fatal_incidents,
        fatal_pct = stats.fatal_pct(),
        "Run finished"
    );
    if let Some(path) = &cli.stats_csv {
        append_record(path, &stats)?;
    }

    outcome
}

/// What to try next when a run ends with nothing to report.
fn guidance(error: &PipelineError) -> String {
    match error {
        PipelineError::NoAgencyMatches { keywords } => format!(
            "No New York transit incidents found (agency keywords: {}).\n\
             Check the agency names in the dataset or set `agency_keywords` in a --config file.",
            keywords.join(", ")
        ),
        _ => "No fatal incidents with valid coordinates found.\n\
              Try a larger --limit, or check the coordinate and date columns of the source."
            .to_string(),
    }
}

#[tracing::instrument(skip_all, fields(report = cli.command.name()))]
async fn execute(
    cli: &Cli,
    client: &BasicClient,
    config: &PipelineConfig,
    stats: &mut RunStats,
) -> Result<()> {
    let Some((renderer, args)) = cli.command.renderer() else {
        return summarize(client, config, stats).await;
    };

    let options = renderer.normalize_options(config);
    let events = pipeline::run(client, config, &options, stats).await?;

    let mut report = renderer.render(&events, config)?;
    if let Some(path) = &args.export_csv {
        let rows = CoordinateRow::from_ranked(&by_coordinate(&events));
        report.add_file(path.clone(), csv_text(&rows)?);
    }

    let written = report.publish()?;
    info!(files = written.len(), "Report written");
    Ok(())
}

/// The dataset overview: every record first, then the agency-matched ones.
async fn summarize(client: &BasicClient, config: &PipelineConfig, stats: &mut RunStats) -> Result<()> {
    let events = load_events(client, config).await?;
    println!("{}", console::dataset_overview(&DatasetSummary::from_events(&events)));

    let matched = pipeline::match_agencies(events, config, stats)?;
    println!(
        "{}",
        console::new_york_breakdown(&DatasetSummary::from_events(&matched))
    );
    Ok(())
}
