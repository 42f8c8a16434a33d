//! CLI entry point for the bike-share trip explorer.
//!
//! Provides subcommands for running the filter/aggregation pipeline over a trip
//! log, listing the available filter values, and checking a dataset's columns.

use anyhow::Result;
use bikeshare_explorer::analyzers::analyzer::analyze;
use bikeshare_explorer::{
    config::ColumnMapping,
    fetch::{BasicClient, DataSource, resolve},
    filter::{FilterCriteria, FilterOptions, RiderCategory},
    ingest::load_dataset,
    output::{log_summary, print_pretty, write_breakdown_csv, write_json},
    records::Dataset,
};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_explorer")]
#[command(about = "Filter and summarize bike-share trip records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter the trip log and write the breakdown table, routes and stations
    Explore {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// JSON file to write results to (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Also write the breakdown table as CSV
        #[arg(long)]
        breakdown_csv: Option<String>,
    },
    /// Print the values available for each filter
    Options {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// JSON file to write options to (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Report which expected columns the dataset provides
    Schema {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// CSV path, http(s) URL, or gdrive:<FILE_ID>
    #[arg(value_name = "SOURCE")]
    source: String,

    /// JSON rename table mapping source columns to expected names
    #[arg(short, long)]
    mapping: Option<String>,

    /// Directory for downloaded datasets [env: BIKESHARE_CACHE_DIR, default: .cache]
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Download remote sources again even if cached
    #[arg(long, default_value_t = false)]
    refresh: bool,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    start_station: Option<String>,

    #[arg(long)]
    end_station: Option<String>,

    #[arg(long)]
    start_neighborhood: Option<String>,

    #[arg(long)]
    end_neighborhood: Option<String>,

    /// Membership product (repeatable)
    #[arg(long = "product")]
    products: Vec<String>,

    /// Year (repeatable)
    #[arg(long = "year")]
    years: Vec<i32>,

    /// Month 1-12 (repeatable); more than one switches to month-year columns
    #[arg(long = "month", value_parser = clap::value_parser!(u32).range(1..=12))]
    months: Vec<u32>,

    /// Pitt rider selection
    #[arg(long, value_enum, default_value_t = RiderCategory::All)]
    rider: RiderCategory,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        FilterCriteria {
            start_station: args.start_station,
            end_station: args.end_station,
            start_neighborhood: args.start_neighborhood,
            end_neighborhood: args.end_neighborhood,
            products: args.products.into_iter().collect(),
            years: args.years.into_iter().collect(),
            months: args.months.into_iter().collect(),
            rider: args.rider,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_explorer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_explorer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Explore {
            dataset,
            filters,
            output,
            breakdown_csv,
        } => {
            let dataset = load(&dataset).await?;
            let criteria = FilterCriteria::from(filters);

            let result = analyze(&dataset, &criteria);
            print_pretty(&result);
            log_summary(&result);

            write_json(output.as_deref(), &result)?;
            if let Some(path) = breakdown_csv {
                write_breakdown_csv(&path, &result.breakdown)?;
                info!(path = %path, "Breakdown CSV written");
            }
        }
        Commands::Options { dataset, output } => {
            let dataset = load(&dataset).await?;
            let options = FilterOptions::from_dataset(&dataset);
            write_json(output.as_deref(), &options)?;
        }
        Commands::Schema { dataset } => {
            let dataset = load(&dataset).await?;
            let schema = dataset.schema();

            let present: Vec<&str> = schema.present().map(|c| c.name()).collect();
            info!(records = dataset.len(), columns = ?present, "Columns present");

            if schema.is_complete() {
                info!("All expected columns present");
            }
            for notice in schema.missing() {
                warn!(column = %notice.column, "{notice}");
            }
        }
    }

    Ok(())
}

/// Resolves the source (downloading and caching if remote) and parses it.
#[tracing::instrument(skip_all, fields(source = %args.source))]
async fn load(args: &DatasetArgs) -> Result<Dataset> {
    let mapping = match &args.mapping {
        Some(path) => ColumnMapping::load(path)?,
        None => ColumnMapping::default(),
    };

    let cache_dir = args.cache_dir.clone().unwrap_or_else(|| {
        std::env::var("BIKESHARE_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".cache"))
    });

    let source = DataSource::parse(&args.source);
    let client = BasicClient::with_timeout(Duration::from_secs(300))?;
    let path = resolve(&client, &source, &cache_dir, args.refresh).await?;

    load_dataset(&path, source.is_gzip(), &mapping)
}
