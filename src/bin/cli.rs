//! dealcrawl CLI
//!
//! Local execution entry point for the admin-facing crawler operations:
//! seeding, rule inspection, manual runs and the scheduler loop.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use dealcrawl::{
    catalog::{BrandDirectory, CampaignCatalog, MemoryCatalog, MemoryDirectory},
    error::{AppError, Result},
    models::Config,
    pipeline::{RuleState, Scheduler},
    services::{HttpFetcher, UpsertEngine},
    storage::{LocalStorage, SnapshotStorage, seed},
    store::{RuleFilter, RuleStore},
};

/// dealcrawl - Brand Campaign Crawler
#[derive(Parser, Debug)]
#[command(name = "dealcrawl", version, about = "Brand campaign crawler")]
struct Cli {
    /// Path to storage directory containing config and snapshots
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed the storage directory with demo brands, categories and rules
    Init {
        /// Overwrite existing seed files
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration and rule references
    Validate,

    /// List crawl rules and their derived state
    Rules,

    /// Trigger one rule immediately, bypassing its schedule
    Run {
        /// Rule identifier
        rule_id: String,
    },

    /// Evaluate all rules once and run the due ones
    Tick,

    /// Run the scheduler loop until interrupted
    Watch,

    /// Show storage and catalog summary
    Info,
}

/// Everything a command needs, wired from one storage directory.
struct App {
    config: Config,
    storage: LocalStorage,
    directory: Arc<MemoryDirectory>,
    store: Arc<RuleStore>,
    catalog: Arc<MemoryCatalog>,
    scheduler: Scheduler,
}

impl App {
    async fn load(storage_dir: &PathBuf) -> Result<Self> {
        let config = Config::load_or_default(storage_dir.join("config.toml"));
        let storage = LocalStorage::new(storage_dir);

        let (brands, categories) = storage.load_directory().await?;
        let directory = Arc::new(MemoryDirectory::new(brands, categories));

        let rules = storage.load_rules().await?;
        let store = Arc::new(RuleStore::with_rules(directory.clone(), rules));

        let campaigns = storage.load_campaigns().await?;
        let catalog = Arc::new(MemoryCatalog::with_campaigns(campaigns));

        let fetcher = Arc::new(HttpFetcher::new(&config.crawler)?);
        let engine = Arc::new(UpsertEngine::new(catalog.clone(), directory.clone()));
        let scheduler = Scheduler::new(store.clone(), fetcher, engine, &config);

        Ok(Self {
            config,
            storage,
            directory,
            store,
            catalog,
            scheduler,
        })
    }

    /// Write rule and campaign snapshots back to disk.
    async fn persist(&self) -> Result<()> {
        self.storage.save_rules(&self.store.snapshot()?).await?;
        self.storage
            .save_campaigns(&self.catalog.list_all().await?)
            .await
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Init { force } => {
            let storage = LocalStorage::new(&cli.storage_dir);
            let (brands, _) = storage.load_directory().await?;
            if !brands.is_empty() && !force {
                log::warn!(
                    "Storage at {} already seeded. Use --force to overwrite.",
                    cli.storage_dir.display()
                );
                return Ok(());
            }

            storage
                .save_directory(&seed::demo_brands(), &seed::demo_categories())
                .await?;
            storage.save_rules(&seed::demo_rules()).await?;

            log::info!(
                "Seeded {} brands, {} categories, {} rules into {}",
                seed::demo_brands().len(),
                seed::demo_categories().len(),
                seed::demo_rules().len(),
                cli.storage_dir.display()
            );
        }

        Command::Validate => {
            let app = App::load(&cli.storage_dir).await?;

            app.config.validate()?;
            log::info!("✓ Config OK");

            let rules = app.store.snapshot()?;
            let mut problems = 0;
            for rule in &rules {
                if !app.directory.brand_exists(&rule.brand_id) {
                    log::error!("Rule {} references unknown brand {}", rule.id, rule.brand_id);
                    problems += 1;
                }
                if url::Url::parse(&rule.url).is_err() {
                    log::error!("Rule {} has invalid url {}", rule.id, rule.url);
                    problems += 1;
                }
            }
            if problems > 0 {
                return Err(AppError::validation(format!(
                    "{problems} rule problem(s) found"
                )));
            }
            log::info!("✓ {} rules OK", rules.len());

            log::info!("All validations passed!");
        }

        Command::Rules => {
            let app = App::load(&cli.storage_dir).await?;
            let rules = app.store.list(&RuleFilter::default())?;
            let now = Utc::now();

            log::info!("{} crawl rule(s)", rules.len());
            for rule in rules {
                let brand = app
                    .directory
                    .brand(&rule.brand_id)
                    .map(|b| b.name)
                    .unwrap_or_else(|| "unknown brand".to_string());
                let state = match app.scheduler.rule_state(&rule, now) {
                    RuleState::Idle => "idle",
                    RuleState::Due => "due",
                    RuleState::Running => "running",
                    RuleState::Disabled => "disabled",
                };
                let last_run = rule
                    .last_run_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                log::info!(
                    "{} [{}] {} ({}) last run: {} -> {}",
                    rule.id,
                    state,
                    brand,
                    rule.schedule.as_str(),
                    last_run,
                    rule.url
                );
            }
        }

        Command::Run { rule_id } => {
            let app = App::load(&cli.storage_dir).await?;
            let run = app.scheduler.trigger_now(&rule_id)?.wait().await?;
            log::info!("{}", run.summary());
            app.persist().await?;
        }

        Command::Tick => {
            let app = App::load(&cli.storage_dir).await?;
            let runs = app.scheduler.tick_and_wait(Utc::now()).await?;
            if runs.is_empty() {
                log::info!("No rules due.");
            }
            app.persist().await?;
        }

        Command::Watch => {
            let app = App::load(&cli.storage_dir).await?;
            log::info!(
                "Scheduler loop starting (tick every {}s). Ctrl-C to stop.",
                app.config.scheduler.tick_interval_secs
            );

            let mut interval = tokio::time::interval(std::time::Duration::from_secs(
                app.config.scheduler.tick_interval_secs,
            ));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match app.scheduler.tick_and_wait(Utc::now()).await {
                    Ok(runs) => {
                        if !runs.is_empty() {
                            if let Err(e) = app.persist().await {
                                log::error!("Snapshot persist failed: {e}");
                            }
                        }
                    }
                    Err(e) => log::error!("Tick failed: {e}"),
                }
            }
        }

        Command::Info => {
            let app = App::load(&cli.storage_dir).await?;
            let rules = app.store.snapshot()?;
            let campaigns = app.catalog.list_all().await?;

            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Brands: {}", app.directory.brands().len());
            log::info!("Categories: {}", app.directory.categories().len());
            log::info!(
                "Rules: {} ({} active)",
                rules.len(),
                rules.iter().filter(|r| r.is_active).count()
            );
            log::info!("Campaigns: {}", campaigns.len());

            if let Some(latest) = rules.iter().filter_map(|r| r.last_run_at).max() {
                log::info!("Most recent run: {}", latest.to_rfc3339());
            } else {
                log::info!("No runs recorded yet.");
            }
        }
    }

    Ok(())
}
