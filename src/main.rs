//! Precinct-Mirror main entry point
//!
//! This is the command-line interface for the Precinct-Mirror crawler.

use clap::Parser;
use precinct_mirror::config::{load_config_with_hash, Config};
use precinct_mirror::crawler::Coordinator;
use precinct_mirror::locator::locate;
use precinct_mirror::output::{print_inventory, print_statistics, scan_mirror};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Precinct-Mirror: a resumable election-results mirror
///
/// Precinct-Mirror walks the region, province, city, barangay and precinct
/// listings of the results service and stores every listing and precinct
/// record on disk. Interrupted runs pick up where they left off.
#[derive(Parser, Debug)]
#[command(name = "precinct-mirror")]
#[command(version = "1.0.0")]
#[command(about = "A resumable election-results mirror", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Refetch and overwrite every node, ignoring the existing mirror
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "fresh"])]
    dry_run: bool,

    /// Count the artifacts in the existing mirror and exit
    #[arg(long, conflicts_with_all = ["dry_run", "fresh"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("precinct_mirror=info,warn"),
            1 => EnvFilter::new("precinct_mirror=debug,info"),
            2 => EnvFilter::new("precinct_mirror=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Precinct-Mirror Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Initial backoff: {}ms", config.crawler.initial_backoff_ms);
    match config.crawler.max_total_backoff_ms {
        Some(ms) => println!("  Max total backoff: {}ms", ms),
        None => println!("  Max total backoff: unbounded"),
    }
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nRemote:");
    println!("  Region kind: {}", config.remote.region_kind);
    println!("  Start code: {}", config.remote.start_code);
    println!("  Area (local): {}", config.remote.area_local_url);
    println!("  Area (overseas): {}", config.remote.area_overseas_url);
    println!("  Precinct: {}", config.remote.precinct_url);
    println!("  Record: {}", config.remote.record_url);

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Mirror root: {}", config.output.mirror_root.display());

    let endpoints = config.remote.endpoints()?;
    let root = locate(
        &endpoints,
        &config.remote.start_code,
        0,
        config.remote.region_kind,
    )?;

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", root);

    Ok(())
}

/// Handles the --stats mode: counts the artifacts in the existing mirror
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let inventory = scan_mirror(&config.output.mirror_root)?;
    print_inventory(&config.output.mirror_root, &inventory);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring existing mirror)");
    } else {
        tracing::info!("Starting crawl (nodes already mirrored are skipped)");
    }

    let coordinator = Coordinator::new(config)?.with_fresh(fresh);

    // Ctrl-C stops new fetches; tasks still waiting end as errors and are
    // picked up by the next run
    let limiter = coordinator.limiter().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight fetches");
            limiter.close();
        }
    });

    match coordinator.run().await {
        Ok(stats) => {
            tracing::info!("Crawl completed");
            println!();
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
