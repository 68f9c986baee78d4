//! notecache CLI
//!
//! Command-line client for a local note account mirror.
//!
//! # Commands
//!
//! - `sync` - Pull all changes since the last sync
//! - `notes` - List cached notes with their notebook names
//! - `notebooks` - List cached notebooks
//! - `content` - Sync, then print a note body, fetching it on a cache miss
//! - `inspect` - Show snapshot metadata without contacting the server

mod client;
mod commands;
mod error;

use clap::{Parser, Subcommand};
use client::ReqwestClient;
use error::CliError;
use notecache_protocol::MAX_SYNC_ENTRIES;
use notecache_sync::{HttpGateway, NoteCache, SyncConfig, DEFAULT_CACHE_ROOT, DEFAULT_HOST};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Gateway used by every online command.
type RemoteCache = NoteCache<HttpGateway<ReqwestClient>>;

/// Local mirror of a note account.
#[derive(Parser)]
#[command(name = "notecache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Developer or OAuth token
    #[arg(global = true, long, env = "NOTECACHE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Service host
    #[arg(global = true, short = 's', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Cache root directory
    #[arg(global = true, short = 'd', long, default_value = DEFAULT_CACHE_ROOT)]
    cache_dir: PathBuf,

    /// Maximum entries per change-log request
    #[arg(global = true, long, default_value_t = MAX_SYNC_ENTRIES)]
    page_size: u32,

    /// Request timeout in seconds
    #[arg(global = true, long, default_value = "30")]
    timeout: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull all changes since the last sync
    Sync,

    /// List cached notes
    Notes {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// List what is cached without syncing first
        #[arg(long)]
        no_sync: bool,
    },

    /// List cached notebooks
    Notebooks {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// List what is cached without syncing first
        #[arg(long)]
        no_sync: bool,
    },

    /// Print a note body
    Content {
        /// Note GUID
        guid: String,

        /// Read what is cached without syncing first
        #[arg(long)]
        no_sync: bool,
    },

    /// Show snapshot metadata for an account without contacting the server
    Inspect {
        /// Numeric account identifier
        user_id: i64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn config(&self) -> SyncConfig {
        SyncConfig::new(self.host.clone(), self.cache_dir.clone()).with_page_size(self.page_size)
    }

    fn open_cache(&self) -> Result<RemoteCache, CliError> {
        let token = self.token.as_deref().ok_or(CliError::MissingToken)?;
        let client = ReqwestClient::new(Duration::from_secs(self.timeout))?;
        let gateway = HttpGateway::new(format!("https://{}", self.host), client);
        tracing::debug!(
            base_url = gateway.base_url(),
            cache_dir = %self.cache_dir.display(),
            "connecting"
        );
        Ok(NoteCache::open(token, gateway, self.config())?)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so `--format json` output stays parseable.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Sync => {
            let mut cache = cli.open_cache()?;
            commands::sync::run(&mut cache)?;
        }
        Commands::Notes { format, no_sync } => {
            let mut cache = cli.open_cache()?;
            commands::notes::run(&mut cache, format, *no_sync)?;
        }
        Commands::Notebooks { format, no_sync } => {
            let mut cache = cli.open_cache()?;
            commands::notebooks::run(&mut cache, format, *no_sync)?;
        }
        Commands::Content { guid, no_sync } => {
            let mut cache = cli.open_cache()?;
            commands::content::run(&mut cache, guid, *no_sync)?;
        }
        Commands::Inspect { user_id, format } => {
            commands::inspect::run(&cli.cache_dir, &cli.host, *user_id, format)?;
        }
        Commands::Version => {
            println!("notecache CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
