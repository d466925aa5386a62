//! URL Analyzer main entry point
//!
//! This is the command-line interface for queueing URLs, running the
//! background worker and reading back analysis results.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url_analyzer::config::{resolve_config, Config};
use url_analyzer::crawler::{CycleOutcome, Worker};
use url_analyzer::output::{
    format_markdown_statistics, load_results_page, load_statistics, print_statistics,
    render_results, OutputFormat,
};
use url_analyzer::storage::{open_storage, Storage, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use url_analyzer::url::validate_target_url;

/// URL Analyzer: queue web pages and analyze their structure
///
/// Submitted URLs are fetched by a background worker which records the HTML
/// version, title, heading counts, internal/external/broken link counts and
/// whether the page contains a login form.
#[derive(Parser, Debug)]
#[command(name = "url-analyzer")]
#[command(version)]
#[command(about = "Asynchronous web page structure analyzer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Queue a URL for analysis
    Submit {
        /// Absolute http(s) URL to analyze
        url: String,
    },

    /// Run the background worker until interrupted
    Run {
        /// Process at most one queued request and exit
        #[arg(long)]
        once: bool,
    },

    /// Show a crawl request and its result
    Status {
        /// Crawl request ID
        id: i64,
    },

    /// List analysis results, newest first
    Results {
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show request and result statistics
    Stats {
        /// Print the summary as markdown
        #[arg(long)]
        markdown: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, _hash) =
        resolve_config(cli.config.as_deref()).context("failed to load configuration")?;

    let storage: Arc<dyn Storage> = Arc::new(
        open_storage(Path::new(&config.storage.database_path)).with_context(|| {
            format!("failed to open database {}", config.storage.database_path)
        })?,
    );

    match cli.command {
        Command::Submit { url } => handle_submit(storage.as_ref(), &url),
        Command::Run { once } => handle_run(&config, storage, once).await,
        Command::Status { id } => handle_status(storage.as_ref(), id),
        Command::Results {
            page,
            page_size,
            format,
        } => handle_results(storage.as_ref(), page, page_size, format),
        Command::Stats { markdown } => handle_stats(storage.as_ref(), markdown),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("url_analyzer=info,warn"),
            1 => EnvFilter::new("url_analyzer=debug,info"),
            2 => EnvFilter::new("url_analyzer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `submit`: validates the URL and queues a request
fn handle_submit(storage: &dyn Storage, url: &str) -> anyhow::Result<()> {
    let target = validate_target_url(url)?;
    let request = storage.create_request(target.as_str())?;

    tracing::info!("Queued request {} for {}", request.id, request.url);
    println!("{}", serde_json::to_string_pretty(&request)?);

    Ok(())
}

/// Handles `run`: drives the worker until Ctrl-C, or for one cycle
async fn handle_run(config: &Config, storage: Arc<dyn Storage>, once: bool) -> anyhow::Result<()> {
    let worker = Worker::from_config(config, storage)?;

    if once {
        match worker.run_once().await? {
            CycleOutcome::Idle => println!("No queued requests"),
            CycleOutcome::Completed {
                request_id,
                result_id,
            } => println!("Request {} completed (result {})", request_id, result_id),
            CycleOutcome::Failed { request_id, error } => {
                println!("Request {} failed: {}", request_id, error)
            }
        }
        return Ok(());
    }

    let token = CancellationToken::new();
    let handle = worker.spawn(token.clone());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    let grace = config.worker.shutdown_grace();
    tracing::info!(
        "Shutdown requested, waiting up to {}s for in-flight requests",
        grace.as_secs()
    );

    if handle.shutdown(grace).await {
        tracing::info!("Worker stopped cleanly");
    } else {
        tracing::warn!("Worker stopped with abandoned requests left in processing");
    }

    Ok(())
}

/// Handles `status`: prints a request and its result, if any
fn handle_status(storage: &dyn Storage, id: i64) -> anyhow::Result<()> {
    let request = storage.get_request(id)?;
    let result = storage.get_result_for_request(id)?;

    let body = serde_json::json!({
        "data": request,
        "result": result,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}

/// Handles `results`: prints one page of results
fn handle_results(
    storage: &dyn Storage,
    page: u32,
    page_size: u32,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let results = load_results_page(storage, page, page_size)?;
    print!("{}", render_results(&results, format)?);
    Ok(())
}

/// Handles `stats`: prints statistics from the database
fn handle_stats(storage: &dyn Storage, markdown: bool) -> anyhow::Result<()> {
    let stats = load_statistics(storage)?;

    if markdown {
        print!("{}", format_markdown_statistics(&stats));
    } else {
        print_statistics(&stats);
    }

    Ok(())
}
