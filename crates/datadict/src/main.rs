//! datadict - Looker data dictionary in the terminal

mod cli;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use datadict_core::loader::{BatchExploreLoader, BatchState};
use datadict_core::{
    load_model_detail, search_fields, DictionaryConfig, DictionarySession, HttpLookerApi,
    LoadReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "datadict",
    version,
    about = "Looker data dictionary",
    long_about = "Browse LookML models, explores and fields of a Looker instance.\n\
                  \n\
                  Metadata is fetched once per run and shared between commands.\n\
                  \n\
                  Examples:\n\
                    datadict models                      # List models\n\
                    datadict model thelook               # Model detail with joins\n\
                    datadict explore thelook orders      # Fields of one explore\n\
                    datadict index --concurrency 4       # Index every explore\n\
                    datadict search \"created\" -n 20      # Search fields\n\
                  \n\
                  Environment Variables:\n\
                    DATADICT_BASE_URL                    # Looker instance URL\n\
                    DATADICT_ACCESS_TOKEN                # Pre-issued API token\n\
                    DATADICT_NO_COLOR                    # Disable ANSI colors\n\
                    RUST_LOG                             # Log filter (overrides -v)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: <config_dir>/datadict/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Looker instance URL, e.g. https://company.looker.com:19999
    #[arg(long, global = true, env = "DATADICT_BASE_URL")]
    base_url: Option<String>,

    /// API access token
    #[arg(long, global = true, env = "DATADICT_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Explore fetches kept in flight while indexing
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "DATADICT_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List LookML models
    Models {
        /// Include hidden explores
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the fields of one explore
    Explore {
        model: String,
        explore: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a model with all of its explores and joins
    Model {
        model: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch every explore of every model
    Index {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Index, then search fields by name, label and description
    Search {
        query: String,
        /// Max results
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;
    let api = HttpLookerApi::new(&config.api).context("Failed to create Looker API client")?;
    let session = DictionarySession::new(api, &config).context("Invalid configuration")?;
    let no_color = cli.no_color;

    let result = match cli.command {
        Command::Models { all, json } => run_models(&session, all, json, no_color).await,
        Command::Explore {
            model,
            explore,
            json,
        } => run_explore(&session, &model, &explore, json, no_color).await,
        Command::Model { model, json } => run_model(&session, &model, json, no_color).await,
        Command::Index { json } => run_index(&session, json).await,
        Command::Search { query, limit, json } => {
            run_search(&session, &query, limit, json, no_color).await
        }
    };

    session.close();
    result
}

/// `-v` / `-vv` pick the default level; `RUST_LOG` wins when set
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file, then flags and env vars on top
fn build_config(cli: &Cli) -> Result<DictionaryConfig> {
    let mut config = DictionaryConfig::load_or_default(cli.config.as_deref())?;

    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(token) = &cli.token {
        config.api.access_token = Some(token.clone());
    }
    if let Some(concurrency) = cli.concurrency {
        config.loader.concurrency = concurrency;
    }

    if config.api.base_url.trim().is_empty() {
        bail!("No Looker URL configured (use --base-url, DATADICT_BASE_URL or api.base_url in the config file)");
    }

    Ok(config)
}

// ============================================================================
// Command Handlers
// ============================================================================

type Session = DictionarySession<HttpLookerApi>;

async fn run_models(session: &Session, all: bool, json: bool, no_color: bool) -> Result<()> {
    let models = session
        .all_models()
        .await
        .context("Failed to load models")?;

    println!("{}", cli::format_models_table(&models, all, json, no_color));

    if !json {
        eprintln!("\n{} models", models.len());
    }

    Ok(())
}

async fn run_explore(
    session: &Session,
    model: &str,
    explore: &str,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let explore = session
        .explore(model, explore)
        .await
        .with_context(|| format!("Failed to load explore {}.{}", model, explore))?;

    println!("{}", cli::format_explore(&explore, json, no_color));
    Ok(())
}

async fn run_model(session: &Session, model: &str, json: bool, no_color: bool) -> Result<()> {
    if !json {
        eprint!("Loading model {}... ", model);
    }

    let detail = load_model_detail(session, model)
        .await
        .with_context(|| format!("Failed to load model {}", model))?;

    if !json {
        eprintln!("✓ {} explores", detail.explores.len());
    }

    println!("{}", cli::format_model_detail(&detail, json, no_color));
    Ok(())
}

async fn run_index(session: &Session, json: bool) -> Result<()> {
    let (state, report) = index_with_progress(session, json).await?;
    println!("{}", cli::format_index_summary(&state, &report, json));

    if report.has_fatal_errors() {
        bail!("Index aborted: model list could not be loaded");
    }
    Ok(())
}

async fn run_search(
    session: &Session,
    query: &str,
    limit: usize,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let (state, report) = index_with_progress(session, json).await?;
    if report.has_fatal_errors() {
        let cause = report
            .errors
            .first()
            .map(|e| e.message.as_str())
            .unwrap_or("unknown error");
        bail!("Failed to load models: {}", cause);
    }

    let hits = search_fields(&state.explores, query, limit);

    println!("{}", cli::format_search_hits(&hits, json, no_color));

    if !json {
        eprintln!(
            "\n{} results from {} explores",
            hits.len(),
            state.explores.len()
        );
    }

    Ok(())
}

/// Batch-index every explore, driving a progress bar from the loader state.
/// A model-list failure comes back as a fatal entry in the report.
async fn index_with_progress(session: &Session, quiet: bool) -> Result<(BatchState, LoadReport)> {
    let start = Instant::now();

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {msg}")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(80));
    bar.set_message("Loading models...");

    let loader = BatchExploreLoader::new();
    let mut updates = loader.subscribe();
    let run = loader.index_all(session);
    tokio::pin!(run);

    let report = loop {
        tokio::select! {
            report = &mut run => break report,
            Ok(()) = updates.changed() => {
                let progress = updates.borrow_and_update().progress;
                bar.set_length(progress.total as u64);
                bar.set_position(progress.completed as u64);
                bar.set_message(progress.to_string());
            }
        }
    };

    let state = loader.state();
    bar.finish_and_clear();

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        loaded = report.explores_loaded,
        failed = report.explores_failed,
        elapsed_secs = %format!("{:.2}", elapsed),
        "Index finished"
    );

    if !quiet && report.models_loaded {
        eprintln!(
            "✓ {} explores in {:.2}s",
            state.loading_percent(),
            elapsed
        );
    }

    Ok((state, report))
}
