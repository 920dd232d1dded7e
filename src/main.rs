use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ebpfhub::auth::TokenGenerator;
use ebpfhub::config::ServerConfig;
use ebpfhub::reconcile::outbox::{drain_state, spawn_sync_worker};
use ebpfhub::server::{AppState, create_router};
use ebpfhub::store::{SqliteStore, Store};
use ebpfhub::types::Identity;

#[derive(Parser)]
#[command(name = "ebpfhub")]
#[command(about = "eBPF repository catalog server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the data directory and database
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Issue a bearer token for an account
    IssueToken {
        /// Account the token resolves to
        #[arg(long)]
        account: String,

        /// Token lifetime; omit for a token that never expires
        #[arg(long)]
        expires_in_seconds: Option<i64>,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Retry pending search index writes once
    Sync {
        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let mut config = ServerConfig::load(path)?;
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    Ok(config)
}

fn open_store(db_path: &Path) -> anyhow::Result<SqliteStore> {
    if !db_path.exists() {
        bail!("Server not initialized. Run 'ebpfhub admin init' first to create the database.");
    }
    let store = SqliteStore::new(db_path)?;
    store.initialize()?;
    Ok(store)
}

fn run_init(data_dir: PathBuf) -> anyhow::Result<()> {
    fs::create_dir_all(&data_dir)?;

    let config = ServerConfig {
        data_dir,
        ..ServerConfig::default()
    };
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    println!("Database ready at {}", config.db_path().display());
    Ok(())
}

fn run_issue_token(
    account: String,
    expires_in_seconds: Option<i64>,
    data_dir: PathBuf,
) -> anyhow::Result<()> {
    if account.trim().is_empty() {
        bail!("Account cannot be empty");
    }
    if expires_in_seconds.is_some_and(|s| s <= 0) {
        bail!("--expires-in-seconds must be positive");
    }

    let config = ServerConfig {
        data_dir,
        ..ServerConfig::default()
    };
    let store = open_store(&config.db_path())?;

    let (raw_token, key) = TokenGenerator::new().generate();
    let now = Utc::now();
    let identity = Identity {
        key,
        belong: account.clone(),
        created_at: now,
        expires_at: expires_in_seconds.map(|s| now + chrono::Duration::seconds(s)),
    };
    store.create_identity(&identity)?;

    println!();
    println!("========================================");
    println!("Token for account '{account}' (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("========================================");
    println!();

    Ok(())
}

async fn run_sync(config: ServerConfig) -> anyhow::Result<()> {
    let store = open_store(&config.db_path())?;
    let state = AppState::new(Arc::new(store), &config)?;

    let report = drain_state(&state).await?;
    println!(
        "Delivered {} pending search writes, {} still failing",
        report.delivered, report.failed
    );
    Ok(())
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    let store = open_store(&config.db_path())?;

    if let Err(e) = config.search.credentials() {
        warn!("Search index not configured, submissions will be rejected: {e}");
    }

    let state = Arc::new(AppState::new(Arc::new(store), &config)?);

    if config.sync_interval_secs > 0 {
        spawn_sync_worker(
            state.clone(),
            Duration::from_secs(config.sync_interval_secs),
        );
    }

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ebpfhub=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => run_init(data_dir)?,
            AdminCommands::IssueToken {
                account,
                expires_in_seconds,
                data_dir,
            } => run_issue_token(account, expires_in_seconds, data_dir)?,
            AdminCommands::Sync { config, data_dir } => {
                run_sync(load_config(config.as_deref(), data_dir)?).await?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
        } => {
            let mut config = load_config(config.as_deref(), data_dir)?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            run_serve(config).await?;
        }
    }

    Ok(())
}
