use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use jobscrape::config::Config;
use jobscrape::export::{default_export_filename, export_snapshot};
use jobscrape::pagination::{current_page, page_url, Direction};
use jobscrape::{scrape_page, FileBackend, JobStore, Registry, ScrapeError, ScrapeOptions};

#[derive(Parser)]
#[command(author, version, about = "Collect freelance job listings from saved result pages")]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file; overrides the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract listings from a results page and merge them into the store
    Scrape {
        /// URL the page was loaded from
        #[arg(long)]
        url: String,

        /// Saved page HTML; reads stdin when omitted
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Remove every saved listing
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Write all saved listings to a JSON file
    Export {
        /// Output file; defaults to jobs_<date>.json
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show saved listing counts per site
    Stats,

    /// Print the URL of the next or previous results page
    Page {
        #[arg(long)]
        url: String,

        #[arg(value_enum)]
        direction: PageDirection,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PageDirection {
    Next,
    Prev,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobscrape=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let store_path = cli.store.clone().unwrap_or_else(|| config.store_path.clone());
    let registry = Registry::with_extra(config.adapters.clone()).context("building site adapters")?;
    let store = JobStore::new(FileBackend::new(&store_path));

    match cli.command {
        Commands::Scrape { url, html } => {
            store
                .init()
                .with_context(|| format!("opening store {}", store_path.display()))?;
            let html = match html {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf).context("reading page from stdin")?;
                    buf
                }
            };

            let options = ScrapeOptions {
                expansion_timeout: config.expansion_timeout(),
                ..ScrapeOptions::default()
            };
            let batch = match scrape_page(&html, &url, &registry, &options) {
                Err(ScrapeError::UnsupportedSite(host)) => {
                    let sites: Vec<&str> = registry.sources().collect();
                    bail!("{} is not supported here; supported sites: {}", host, sites.join(", "));
                }
                other => other?,
            };

            if batch.records.is_empty() {
                println!("No jobs found on this page");
                if batch.skipped + batch.failed > 0 {
                    println!("({} skipped, {} failed)", batch.skipped, batch.failed);
                }
                return Ok(());
            }

            let (skipped, failed) = (batch.skipped, batch.failed);
            let stats = store.merge_batch(batch.records).context("saving jobs")?;
            println!(
                "Saved {} jobs! ({} new, {} duplicates) Total: {}",
                stats.batch, stats.new, stats.duplicates, stats.total
            );
            if skipped + failed > 0 {
                println!("{} containers skipped, {} failed", skipped, failed);
            }
        }

        Commands::Clear { yes } => {
            if !yes && !confirm("Are you sure you want to clear all saved jobs? This cannot be undone.")? {
                println!("Nothing cleared");
                return Ok(());
            }
            store.clear().context("clearing jobs")?;
            println!("All jobs cleared");
        }

        Commands::Export { out } => {
            if store.is_empty()? {
                println!("No jobs saved yet");
                return Ok(());
            }
            let out = out.unwrap_or_else(|| {
                PathBuf::from(default_export_filename(chrono::Local::now().date_naive()))
            });
            let count = export_snapshot(&store, &out)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Downloaded {} jobs to {}", count, out.display());
        }

        Commands::Stats => {
            let counts = store.counts_by_source()?;
            let total: usize = counts.values().sum();
            let per_site: Vec<String> = counts
                .iter()
                .map(|(source, n)| format!("{}: {}", source, n))
                .collect();
            if per_site.is_empty() {
                println!("Total Jobs: {}", total);
            } else {
                println!("Total Jobs: {} ({})", total, per_site.join(", "));
            }
        }

        Commands::Page { url, direction } => {
            let parsed = Url::parse(&url).with_context(|| format!("parsing {}", url))?;
            let adapter = registry.resolve_url(&parsed)?;
            let Some(rule) = adapter.profile.pagination.as_ref() else {
                bail!("{} has no pagination rule", adapter.source());
            };
            let direction = match direction {
                PageDirection::Next => Direction::Next,
                PageDirection::Prev => Direction::Previous,
            };
            let target = page_url(&parsed, rule, direction);
            eprintln!("Current Page: {}", current_page(&parsed, rule));
            println!("{}", target);
        }
    }

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
