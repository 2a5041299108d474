//! pagesift command-line entry point

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pagesift::config::{
    apply_setting, load_settings, parse_assignment, settings_fingerprint, settings_to_map,
    validate, CrawlSettings,
};
use pagesift::extract::{get_template, template_names, SelectorExtractor};
use pagesift::output::{print_dry_run, print_summary, FileOutput};
use pagesift::{CrawlOrchestrator, CrawlPlan, HttpFetcher, RunReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// pagesift: crawl a site and keep only the content
///
/// Discovers pages breadth-first from seed URLs (or takes an explicit list),
/// fetches them with bounded concurrency, strips navigation, footers and
/// other page chrome, and writes one markdown document per page plus a JSON
/// run summary.
#[derive(Parser, Debug)]
#[command(name = "pagesift")]
#[command(version)]
#[command(about = "Crawl a site and keep only the content", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// URLs to crawl, or seeds with --discover
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Read additional URLs from a file (one per line, '#' starts a comment)
    #[arg(long, value_name = "PATH")]
    url_file: Option<PathBuf>,

    /// Path to TOML settings file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Discover URLs breadth-first from the given seeds before crawling
    #[arg(short, long)]
    discover: bool,

    /// Only admit discovered URLs matching one of these wildcard patterns
    #[arg(long, value_name = "PATTERN", requires = "discover")]
    include: Vec<String>,

    /// Reject discovered URLs matching any of these wildcard patterns
    #[arg(long, value_name = "PATTERN", requires = "discover")]
    exclude: Vec<String>,

    /// Output directory (overrides output.directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Selector template: blog, news, documentation, ecommerce, forum
    #[arg(short, long, value_name = "NAME")]
    template: Option<String>,

    /// Override a setting, e.g. --set crawler.max-depth=3 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Print the effective settings and exit
    #[arg(long)]
    show_settings: bool,

    /// Show what would be crawled without fetching any content
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run selector rules against a saved page and print what each method extracts
    Selectors {
        /// HTML file to test against
        #[arg(short, long, value_name = "PATH")]
        file: PathBuf,

        /// Start from a named template
        #[arg(short, long, value_name = "NAME")]
        template: Option<String>,

        /// CSS selector (repeatable)
        #[arg(short, long, value_name = "SELECTOR")]
        selector: Vec<String>,

        /// Path query such as //article (repeatable)
        #[arg(short = 'x', long, value_name = "QUERY")]
        query: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Some(Command::Selectors {
        file,
        template,
        selector,
        query,
    }) = &cli.command
    {
        return handle_selectors(file, template.as_deref(), selector, query);
    }

    let settings = build_settings(&cli)?;
    tracing::info!(
        "Settings loaded (fingerprint: {})",
        settings_fingerprint(&settings)
    );

    if cli.show_settings {
        for (key, value) in settings_to_map(&settings) {
            println!("{} = {}", key, value);
        }
        return Ok(());
    }

    let mut urls = cli.urls.clone();
    if let Some(path) = &cli.url_file {
        urls.extend(read_url_file(path)?);
    }
    if urls.is_empty() {
        bail!("no URLs given; pass URLs as arguments or use --url-file");
    }

    let plan = if cli.discover {
        CrawlPlan::Discover {
            seeds: urls,
            include: cli.include.clone(),
            exclude: cli.exclude.clone(),
        }
    } else {
        CrawlPlan::Urls(urls)
    };

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let output = Arc::new(FileOutput::from_config(&settings.output));
    let fetcher = Arc::new(HttpFetcher::new());
    let orchestrator = CrawlOrchestrator::new(settings, fetcher, output)
        .with_cancellation(cancel)
        .dry_run(cli.dry_run);

    match orchestrator.run(plan).await {
        Ok(RunReport::Dry(report)) => {
            print_dry_run(&report);
            Ok(())
        }
        Ok(RunReport::Crawled(summary)) => {
            if !cli.quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagesift=info,warn"),
            1 => EnvFilter::new("pagesift=debug,info"),
            2 => EnvFilter::new("pagesift=trace,debug"),
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

/// Layers the settings file, CLI flags and `--set` overrides, then validates
fn build_settings(cli: &Cli) -> anyhow::Result<CrawlSettings> {
    let mut settings = match &cli.config {
        Some(path) => {
            tracing::info!("Loading settings from: {}", path.display());
            load_settings(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?
        }
        None => CrawlSettings::default(),
    };

    if let Some(dir) = &cli.output {
        settings.output.directory = dir.clone();
    }
    if let Some(name) = &cli.template {
        settings.extraction.template = Some(name.clone());
    }

    for assignment in &cli.overrides {
        let (key, value) = parse_assignment(assignment)?;
        apply_setting(&mut settings, &key, &value)?;
    }

    validate(&settings)?;
    Ok(settings)
}

fn read_url_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read URL file {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Cancels the run on the first Ctrl-C; in-flight pages still finish
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            cancel.cancel();
        }
    });
}

/// Handles the `selectors` subcommand
fn handle_selectors(
    file: &Path,
    template: Option<&str>,
    selectors: &[String],
    queries: &[String],
) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let mut selectors = selectors.to_vec();
    let mut queries = queries.to_vec();

    if let Some(name) = template {
        let Some(template) = get_template(name) else {
            bail!(
                "unknown template '{}' (available: {})",
                name,
                template_names().collect::<Vec<_>>().join(", ")
            );
        };
        selectors.extend(template.selectors.iter().map(|s| s.to_string()));
        queries.extend(template.queries.iter().map(|q| q.to_string()));
    }

    if selectors.is_empty() && queries.is_empty() {
        bail!("give at least one --selector, --query or --template");
    }

    let report = SelectorExtractor::test_selectors(&html, &selectors, &queries);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
