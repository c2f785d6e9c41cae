//! CrawlerView main entry point
//!
//! This is the command-line interface for the CrawlerView accessibility probe.

use clap::Parser;
use crawlerview::config::{load_config, Config};
use crawlerview::crawler::{IdentityOutcome, Session, SessionResult};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CrawlerView: see your page the way AI crawlers do
///
/// Fetches the URL as GPTBot, ClaudeBot, Googlebot and Bingbot (or the
/// identities listed in the config file), checks robots.txt, and scores
/// each response for AI crawler accessibility.
#[derive(Parser, Debug)]
#[command(name = "crawlerview")]
#[command(version)]
#[command(about = "AI crawler accessibility probe", long_about = None)]
struct Cli {
    /// URL to test
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print the full session result as JSON
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    let session = Session::new(&config)?;

    // Ctrl-C interrupts retry backoff; remaining identities are reported as cancelled
    let token = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling session");
            token.cancel();
        }
    });

    let result = session
        .run_with_progress(&cli.url, |index, outcome| {
            tracing::debug!("Identity {} ({}) finished", index + 1, outcome.name());
        })
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawlerview=warn"),
            1 => EnvFilter::new("crawlerview=info,warn"),
            2 => EnvFilter::new("crawlerview=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints a plain-text report of a session
fn print_summary(result: &SessionResult) {
    println!("=== CrawlerView: {} ===\n", result.url);

    println!("robots.txt:");
    if result.robots_txt.accessible {
        println!("  accessible");
        for issue in &result.robots_txt.issues {
            println!("  - {}", issue);
        }
    } else {
        println!(
            "  not accessible: {}",
            result.robots_txt.error.as_deref().unwrap_or("unknown error")
        );
    }

    for outcome in &result.crawlers {
        println!("\n{}:", outcome.name());
        match outcome {
            IdentityOutcome::Analyzed(identity) => {
                for redirect in &identity.redirect_chain {
                    println!("  {}: {} -> {}", redirect.status, redirect.from, redirect.to);
                }
                let analysis = &identity.analysis;
                println!("  Score: {}/100", analysis.score);
                println!("  Content length: {} chars", analysis.content_length);
                println!(
                    "  Noscript: {} ({} chars)",
                    mark(analysis.has_noscript),
                    analysis.noscript_length
                );
                println!(
                    "  Structured data: {} ({} blocks)",
                    mark(analysis.has_structured_data),
                    analysis.structured_data_count
                );
                println!("  Meta tags: {}", mark(analysis.has_meta_tags));
                println!("  H1 heading: {}", mark(analysis.has_h1));
                let loading = if analysis.has_loading_state {
                    "found"
                } else {
                    "none"
                };
                println!("  Loading state: {}", loading);
                for issue in &analysis.issues {
                    println!("  - {}", issue);
                }
            }
            IdentityOutcome::Failed(identity) => {
                println!("  Error: {}", identity.error);
                println!("  {}", identity.explanation);
                println!("  Attempts: {}", identity.retry_attempts.len());
            }
        }
    }

    println!(
        "\nAverage score: {:.1}/100 ({}/{} identities analyzed)",
        result.average_score,
        result.analyzed_count(),
        result.crawlers.len()
    );
    println!("{}: {}", result.verdict.label(), result.verdict.verdict());
}

fn mark(present: bool) -> &'static str {
    if present {
        "yes"
    } else {
        "no"
    }
}
