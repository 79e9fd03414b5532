// Engagement Quota - Main Entry Point
//
// Command-line driver for per-scope engagement configurations:
// - Seeds, shows and edits configurations stored as JSON files
// - Validates every change against the likes/comments budget
// - Reports limit violations of stale stored data

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use engagement_quota::config::Config;
use engagement_quota::logging::{self, LogFormat};
use engagement_quota::quota::{
    allocator, Allocation, Configuration, ConfigurationRecord, ConfigurationStore,
    ConsumerRegistry, JsonFileStore, Platform, TargetId, ValidationError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, Level};

/// Engagement Quota: likes/comments budget allocator
#[derive(Parser, Debug)]
#[command(name = "engagement-quota")]
#[command(author = "Engagement Quota Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Allocate a likes/comments budget between a feed and keyword targets", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding stored scopes (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a scope with the platform's default feed and target
    Init {
        /// Scope name (letters, digits, '-' and '_')
        #[arg(long)]
        scope: String,

        /// Platform the scope belongs to
        #[arg(long, default_value = "linkedin")]
        platform: Platform,

        /// Overwrite an existing scope
        #[arg(long)]
        force: bool,
    },
    /// Show a scope's allocations, totals and headroom
    Show {
        #[arg(long)]
        scope: String,

        /// Print the stored JSON record instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Add a keyword or community target
    Add {
        #[arg(long)]
        scope: String,

        /// Platform whose label rules apply
        #[arg(long, default_value = "linkedin")]
        platform: Platform,

        /// Keyword (e.g. "#sales") or community (e.g. "r/rust")
        #[arg(long)]
        label: String,

        #[arg(long, default_value_t = 0)]
        likes: u32,

        #[arg(long, default_value_t = 0)]
        comments: u32,
    },
    /// Replace an existing target's label and allocation
    Edit {
        #[arg(long)]
        scope: String,

        /// Target id as printed by `show`
        #[arg(long)]
        id: TargetId,

        #[arg(long, default_value = "linkedin")]
        platform: Platform,

        #[arg(long)]
        label: String,

        #[arg(long)]
        likes: u32,

        #[arg(long)]
        comments: u32,
    },
    /// Change the feed allocation
    Feed {
        #[arg(long)]
        scope: String,

        #[arg(long)]
        likes: u32,

        #[arg(long)]
        comments: u32,
    },
    /// Remove a target
    Remove {
        #[arg(long)]
        scope: String,

        #[arg(long)]
        id: TargetId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level().unwrap_or(Level::INFO)
    };
    let format = config
        .logging
        .format
        .parse()
        .unwrap_or(LogFormat::Compact);
    logging::init(level, format);

    debug!(data_dir = %config.store.data_dir, "Engagement Quota v0.1.0 starting");

    match run(args.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ValidationError>() {
                Some(validation) => eprintln!("Rejected: {}", validation),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = &args.data_dir {
        config.store.data_dir = dir.to_string_lossy().into_owned();
    }
    Ok(config)
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    let store = JsonFileStore::new(&config.store.data_dir, config.quota.budget());
    let registry = config.quota.registry();

    match command {
        Commands::Init {
            scope,
            platform,
            force,
        } => {
            if !force && store.exists(&scope).await? {
                bail!("Scope '{}' already exists (use --force to overwrite)", scope);
            }
            let seeded = platform.default_configuration(config.quota.budget());
            store.save(&scope, &seeded).await?;
            info!(%scope, %platform, "Initialized scope");
            println!("Initialized scope '{}' for {}", scope, platform.display_name());
            print_summary(&scope, &seeded, &registry);
        }
        Commands::Show { scope, json } => {
            let current = store.load(&scope).await?;
            if json {
                let record = serde_json::to_string_pretty(&ConfigurationRecord::from(&current))
                    .context("Failed to serialize configuration")?;
                println!("{}", record);
            } else {
                print_summary(&scope, &current, &registry);
            }
        }
        Commands::Add {
            scope,
            platform,
            label,
            likes,
            comments,
        } => {
            let current = store.load(&scope).await?;
            let (updated, id) = registry.add(
                &current,
                &label,
                platform.label_style(),
                Allocation::new(likes, comments),
            )?;
            store.save(&scope, &updated).await?;
            println!("Added target {}", id);
        }
        Commands::Edit {
            scope,
            id,
            platform,
            label,
            likes,
            comments,
        } => {
            let current = store.load(&scope).await?;
            let updated = registry.edit(
                &current,
                id,
                &label,
                platform.label_style(),
                Allocation::new(likes, comments),
            )?;
            store.save(&scope, &updated).await?;
            println!("Updated target {}", id);
        }
        Commands::Feed {
            scope,
            likes,
            comments,
        } => {
            let current = store.load(&scope).await?;
            let updated = registry.edit_feed(&current, Allocation::new(likes, comments))?;
            store.save(&scope, &updated).await?;
            println!("Feed set to {} likes, {} comments", likes, comments);
        }
        Commands::Remove { scope, id } => {
            let current = store.load(&scope).await?;
            let updated = registry.remove(&current, id)?;
            store.save(&scope, &updated).await?;
            println!("Removed target {}", id);
        }
    }

    Ok(())
}

fn print_summary(scope: &str, config: &Configuration, registry: &ConsumerRegistry) {
    let budget = config.budget();
    let totals = allocator::totals(config);
    let feed = config.feed();

    println!("Scope: {}", scope);
    println!(
        "Budget: {} likes, {} comments",
        budget.max_likes, budget.max_comments
    );
    println!("Feed: {} likes, {} comments", feed.likes, feed.comments);
    println!(
        "Targets ({}/{}):",
        config.target_count(),
        registry.max_consumers()
    );
    for target in config.targets() {
        println!(
            "  {}  {}  {} likes, {} comments",
            target.id, target.label, target.allocation.likes, target.allocation.comments
        );
    }
    println!(
        "Totals: {}/{} likes, {}/{} comments",
        totals.likes, budget.max_likes, totals.comments, budget.max_comments
    );

    match registry.check_can_add(config) {
        Ok(headroom) => println!(
            "Available for a new target: {} likes, {} comments",
            headroom.max_likes, headroom.max_comments
        ),
        Err(reason) => println!("Cannot add a target: {}", reason),
    }

    for violation in allocator::audit(config, registry.max_consumers()) {
        println!("Warning: {}", violation);
    }
}
