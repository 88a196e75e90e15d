use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tourwise_chat::application::capabilities::default_registry;
use tourwise_chat::application::errors::ChatError;
use tourwise_chat::application::messaging::Dispatcher;
use tourwise_chat::application::services::{ChatService, ListingService, SearchSettings, SessionSettings};
use tourwise_chat::domain::traits::QueryEngine;
use tourwise_chat::infrastructure::adapters::ConsoleAdapter;
use tourwise_chat::infrastructure::config::Config;
use tourwise_chat::infrastructure::database::{Database, SeedReport};
use tourwise_chat::infrastructure::http::{self, AppState};
use tourwise_chat::infrastructure::llm::{build_provider, LLMError};
use tourwise_chat::infrastructure::nlsql::{DisabledQueryEngine, SqlQueryEngine};

#[derive(Parser)]
#[command(name = "tourwise")]
#[command(about = "Conversational property search for Zimbabwe", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Listen address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Chat from the terminal
    Chat {
        /// Attach sessions to this user id
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// Seed CBD locations and amenities
    Seed {
        /// Also insert a few demo listings
        #[arg(long)]
        with_samples: bool,
    },
    /// Delete expired sessions
    Cleanup {
        /// Report what would be removed without deleting
        #[arg(long)]
        dry_run: bool,
        /// Also trim users over the per-user session limit
        #[arg(long)]
        enforce_limits: bool,
    },
    /// Generate default config
    InitConfig,
    /// Show version
    Version,
}

fn main() {
    let cli = Cli::parse();

    let (config, load_error) = load_config(&cli.config);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Some(e) = load_error {
        tracing::warn!("Failed to load config: {}, using defaults", e);
    }

    let result = match cli.command {
        Commands::Version => {
            println!("tourwise v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
        command => run_async(config, command),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// File values first, then environment overrides
fn load_config(path: &str) -> (Config, Option<String>) {
    if !Path::new(path).exists() {
        return (Config::load_env(), None);
    }

    match Config::load(path) {
        Ok(mut config) => {
            config.apply_env();
            (config, None)
        }
        Err(e) => (Config::load_env(), Some(e.to_string())),
    }
}

fn init_config() -> Result<(), ChatError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}

fn run_async(config: Config, command: Commands) -> Result<(), ChatError> {
    config.validate()?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| ChatError::Internal(format!("Failed to start runtime: {}", e)))?;

    rt.block_on(async move {
        match command {
            Commands::Serve { bind } => serve(config, bind).await,
            Commands::Chat { user_id } => chat(config, user_id).await,
            Commands::Seed { with_samples } => seed(&config, with_samples),
            Commands::Cleanup { dry_run, enforce_limits } => cleanup(config, dry_run, enforce_limits).await,
            Commands::InitConfig | Commands::Version => Ok(()),
        }
    })
}

fn open_database(config: &Config) -> Result<Arc<Database>, ChatError> {
    let db = Database::new(&config.database.path)?;
    tracing::info!("Database initialized at {}", config.database.path.display());
    Ok(Arc::new(db))
}

fn chat_service(config: &Config, db: Arc<Database>) -> Result<Arc<ChatService>, ChatError> {
    let settings = SessionSettings {
        ttl: config.session_ttl()?,
        max_sessions_per_user: config.chat.max_sessions_per_user,
        history_limit: config.chat.history_limit,
    };
    Ok(Arc::new(ChatService::new(db, settings)))
}

fn query_engine(config: &Config, db: Arc<Database>) -> Arc<dyn QueryEngine> {
    match build_provider(&config.llm) {
        Ok(llm) => {
            tracing::info!("Query engine using {} ({})", llm.name(), config.llm.model(config.llm.provider));
            Arc::new(SqlQueryEngine::new(llm, db, config.llm.clone()))
        }
        Err(LLMError::MissingApiKey) => {
            tracing::warn!("No LLM API key configured; natural-language queries are disabled");
            Arc::new(DisabledQueryEngine::new("no API key configured"))
        }
        Err(e) => {
            tracing::warn!("Failed to build LLM provider: {}", e);
            Arc::new(DisabledQueryEngine::new(e.to_string()))
        }
    }
}

/// Wire database, engine, services and capabilities together
fn build_state(config: &Config) -> Result<AppState, ChatError> {
    let db = open_database(config)?;

    let engine = query_engine(config, db.clone());
    let search = SearchSettings {
        cbd_radius_km: config.chat.cbd_radius_km,
        nearby_limit: config.chat.nearby_limit,
        search_limit: config.chat.search_limit,
        fuzzy_threshold: config.chat.fuzzy_threshold,
    };
    let listings = Arc::new(ListingService::new(db.clone(), engine, search));
    let chat = chat_service(config, db)?;

    let registry = default_registry(listings.clone());
    let dispatcher = Arc::new(Dispatcher::new(&registry, chat.clone()));
    tracing::info!("Capabilities: {}", dispatcher.capability_names().join(", "));

    Ok(AppState {
        dispatcher,
        chat,
        listings,
    })
}

async fn serve(mut config: Config, bind: Option<String>) -> Result<(), ChatError> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let state = build_state(&config)?;
    http::serve(state, &config.server).await
}

async fn chat(config: Config, user_id: Option<i64>) -> Result<(), ChatError> {
    let state = build_state(&config)?;
    ConsoleAdapter::new(state.dispatcher).with_user(user_id).run().await
}

fn seed(config: &Config, with_samples: bool) -> Result<(), ChatError> {
    let db = open_database(config)?;
    let mut report = SeedReport::default();

    db.seed_cbds(&mut report)?;
    db.seed_amenities(&mut report)?;
    if with_samples {
        db.seed_sample_listings(&mut report)?;
    }

    println!(
        "CBDs: {} created, {} updated. Amenities: {} created. Listings: {} created.",
        report.cbds_created, report.cbds_updated, report.amenities_created, report.listings_created
    );
    Ok(())
}

async fn cleanup(config: Config, dry_run: bool, enforce_limits: bool) -> Result<(), ChatError> {
    let db = open_database(&config)?;
    let chat = chat_service(&config, db)?;

    let expired = chat.cleanup_expired(dry_run).await?;
    let verb = if dry_run { "Would delete" } else { "Deleted" };
    println!("{} {} expired sessions", verb, expired);

    if enforce_limits {
        let report = chat.enforce_limits(dry_run).await?;
        println!(
            "{} {} sessions from {} users over the limit of {}",
            verb, report.sessions_removed, report.users_over_limit, config.chat.max_sessions_per_user
        );
    }
    Ok(())
}
