//! Page-Harvest main entry point
//!
//! This is the command-line interface for the Page-Harvest site crawler.

use anyhow::{bail, Context};
use clap::Parser;
use page_harvest::config::{load_config, validate, Config, CrawlSession, RendererKind};
use page_harvest::crawler::{build_renderer, Coordinator};
use page_harvest::output::{export_dataset, print_report};
use page_harvest::storage::{DatasetStore, SqliteDataset};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Page-Harvest: crawl a site and export what every page contains
///
/// Starting from a seed URL, Page-Harvest renders every page on the same
/// hostname (up to a request limit), extracts title, meta description,
/// paragraphs, links and images, and writes the results to a dataset that is
/// exported as a single JSON file.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version)]
#[command(about = "Crawl a website and export structured page content", long_about = None)]
struct Cli {
    /// Seed URL; prompted for when neither given here nor in the config file
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to crawl
    #[arg(short = 'n', long, value_name = "N")]
    max_pages: Option<u32>,

    /// Number of pages rendered concurrently
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Rendering backend
    #[arg(long, value_name = "KIND")]
    renderer: Option<RendererKind>,

    /// WebDriver endpoint (defaults to $WEBDRIVER_URL or http://localhost:4444)
    #[arg(long, value_name = "URL")]
    webdriver_url: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,

    /// Directory for the dataset and exports
    #[arg(long, value_name = "DIR")]
    storage_dir: Option<String>,

    /// Per-page render timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Stop the crawl after this many seconds
    #[arg(long, value_name = "SECS")]
    max_duration_secs: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long, conflicts_with = "export_only")]
    dry_run: bool,

    /// Re-export the existing dataset for the URL's host and exit
    #[arg(long, conflicts_with = "dry_run")]
    export_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid settings")?;

    // Interactive mode mirrors a plain run with no arguments: ask for both values
    let seed = match cli.url.clone().or_else(|| config.crawl.seed_url.clone()) {
        Some(url) => url,
        None => {
            let url = prompt("Enter the URL to crawl (e.g., https://example.com): ")?;
            if url.is_empty() {
                bail!("URL cannot be empty");
            }
            if cli.max_pages.is_none() {
                config.crawl.max_requests = prompt_max_pages(config.crawl.max_requests)?;
            }
            url
        }
    };

    let session = CrawlSession::from_config(&config, &seed)?;

    if cli.dry_run {
        handle_dry_run(&config, &session);
        return Ok(());
    }

    let dataset_path = config.output.dataset_path();
    let dataset = Arc::new(
        SqliteDataset::new(&dataset_path)
            .with_context(|| format!("failed to open dataset {}", dataset_path.display()))?,
    );

    if cli.export_only {
        return handle_export(&config, &session, &*dataset);
    }

    handle_crawl(&config, session, dataset, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
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

/// Command-line flags win over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_requests = max_pages;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawl.concurrency = concurrency;
    }
    if let Some(timeout) = cli.timeout_secs {
        config.crawl.request_timeout_secs = timeout;
    }
    if let Some(cap) = cli.max_duration_secs {
        config.crawl.max_duration_secs = Some(cap);
    }
    if let Some(kind) = cli.renderer {
        config.renderer.kind = kind;
    }
    if let Some(endpoint) = &cli.webdriver_url {
        config.renderer.webdriver_url = Some(endpoint.clone());
    }
    if cli.headed {
        config.renderer.headless = false;
    }
    if let Some(dir) = &cli.storage_dir {
        config.output.storage_dir = dir.clone();
    }
}

fn prompt(question: &str) -> anyhow::Result<String> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn prompt_max_pages(default: u32) -> anyhow::Result<u32> {
    let answer = prompt(&format!(
        "Enter maximum number of pages to crawl (default {}): ",
        default
    ))?;
    if answer.is_empty() {
        return Ok(default);
    }
    answer
        .parse()
        .with_context(|| format!("'{}' is not a valid page count", answer))
}

fn print_settings(config: &Config, session: &CrawlSession) {
    println!("\nStarting crawl with the following settings:");
    println!("- Target URL: {}", session.seed_url);
    println!("- Maximum pages: {}", session.max_requests);
    println!("- Concurrency: {}", session.concurrency);
    println!("- Renderer: {}", config.renderer.kind);
    println!("- Page timeout: {}s", session.request_timeout.as_secs());
    if let Some(cap) = session.max_duration {
        println!("- Time limit: {}s", cap.as_secs());
    }
}

/// Handles the --dry-run mode: validates settings and shows what would be crawled
fn handle_dry_run(config: &Config, session: &CrawlSession) {
    println!("=== Page-Harvest Dry Run ===");
    print_settings(config, session);

    println!("\nOutput:");
    println!("  Dataset: {} (session '{}')", config.output.dataset_path().display(), session.name);
    println!(
        "  Export: {}",
        config
            .output
            .export_dir()
            .join(format!("{}.json", session.name))
            .display()
    );
    println!("  Excluded fields: {:?}", config.output.exclude_fields);
    println!("  Settings fingerprint: {}", session.fingerprint());

    println!("\n✓ Settings are valid");
}

/// Handles the --export-only mode: re-exports an existing dataset
fn handle_export(
    config: &Config,
    session: &CrawlSession,
    dataset: &dyn DatasetStore,
) -> anyhow::Result<()> {
    match dataset.get_session(&session.name)? {
        Some(stored) => tracing::info!(
            "Dataset '{}' from {} ({}), {} records",
            stored.name,
            stored.started_at,
            stored.status.to_db_string(),
            dataset.count(&session.name)?
        ),
        None => bail!("no dataset named '{}' exists yet", session.name),
    }

    let path = export_dataset(
        dataset,
        &session.name,
        &config.output.exclude_fields,
        &config.output.export_dir(),
    )?;
    println!("All data exported to a single file: {}", path.display());
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    session: CrawlSession,
    dataset: Arc<SqliteDataset>,
    quiet: bool,
) -> anyhow::Result<()> {
    print_settings(config, &session);

    let renderer = build_renderer(&config.renderer, session.concurrency)?;
    let name = session.name.clone();
    let coordinator = Coordinator::new(session, renderer, dataset.clone());

    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.stop();
        }
    });

    println!("Starting the crawl...");
    let report = coordinator.run().await?;
    println!("Crawl finished!");

    if !quiet {
        println!();
        print_report(&report);
        println!();
    }

    println!(
        "Results saved to {} (dataset '{}')",
        config.output.dataset_path().display(),
        name
    );

    let path = export_dataset(
        &*dataset,
        &name,
        &config.output.exclude_fields,
        &config.output.export_dir(),
    )?;
    println!("All data exported to a single file: {}", path.display());

    Ok(())
}
