use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use regex::Regex;

use crate::api::SeedData;
use crate::database::memory::InMemoryDB;
use crate::database::sqlite::SqliteDB;
use crate::database::Database;
use crate::errors::{Error, Result};
use crate::validation::ValidationMode;

/// Default address for both the client and the server
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9898";

const ADDRESS_PATTERN: &str = r"^[a-zA-Z0-9\.\-]+:\d{1,5}$";

/// Errors that can occur when parsing the command line arguments
#[derive(Debug, Clone, thiserror::Error)]
pub enum CLIError {
    #[error("Invalid target format. Should be <host>:<port>")]
    InvalidUrlFormat,
    #[error("Invalid JSON argument: {0}")]
    InvalidJson(String),
}

/// Validate the format of the TCP address provided by the user
///
/// Returns its input if the address is in the format <host>:<port>, otherwise InvalidUrlFormat
pub fn validate_address(url: &str) -> std::result::Result<String, CLIError> {
    let valid = Regex::new(ADDRESS_PATTERN).map_or(false, |re| re.is_match(url));
    if valid {
        Ok(url.to_string())
    } else {
        Err(CLIError::InvalidUrlFormat)
    }
}

/// Parse a JSON document given on the command line
pub fn parse_json(arg: &str) -> std::result::Result<serde_json::Value, CLIError> {
    serde_json::from_str(arg).map_err(|err| CLIError::InvalidJson(err.to_string()))
}

/// Where records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// Plain vectors
    #[default]
    Memory,
    /// An in-memory SQLite database
    Sqlite,
}

impl Backend {
    /// Open an empty store of this kind
    pub fn open(self) -> Result<Box<dyn Database>> {
        let db: Box<dyn Database> = match self {
            Backend::Memory => Box::new(InMemoryDB::new()?),
            Backend::Sqlite => Box::new(SqliteDB::new()?),
        };
        Ok(db)
    }
}

/// Dishes and orders API server
#[derive(Debug, Parser)]
#[command(name = "server", version)]
pub struct ServerArgs {
    /// Address to listen on, as <host>:<port>
    #[arg(long, env = "GRUBDASH_ADDRESS", default_value = DEFAULT_ADDRESS, value_parser = validate_address)]
    pub address: String,

    /// Storage backend
    #[arg(long, env = "GRUBDASH_BACKEND", value_enum, default_value_t = Backend::Memory)]
    pub backend: Backend,

    /// How order validation failures are handled
    #[arg(long, env = "GRUBDASH_VALIDATION", value_enum, default_value_t = ValidationMode::Strict)]
    pub validation: ValidationMode,

    /// JSON file with initial dishes and orders
    #[arg(long, env = "GRUBDASH_SEED")]
    pub seed: Option<PathBuf>,

    /// Number of worker threads, defaults to the available parallelism
    #[arg(long, env = "GRUBDASH_WORKERS")]
    pub workers: Option<usize>,
}

impl ServerArgs {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|x| x.into())
                .unwrap_or(4)
        })
    }

    /// Open the configured store, loaded with the seed file if there is one
    pub fn open_database(&self) -> Result<Box<dyn Database>> {
        let mut db = self.backend.open()?;
        if let Some(path) = &self.seed {
            let seed = load_seed(path)?;
            tracing::info!(
                path = %path.display(),
                dishes = seed.dishes.len(),
                orders = seed.orders.len(),
                "Loading seed data"
            );
            db.load(seed)?;
        }
        Ok(db)
    }
}

/// Read a seed file: `{"dishes": [...], "orders": [...]}`, both lists optional
pub fn load_seed(path: &Path) -> Result<SeedData> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| Error::Config(format!("cannot read {}: {}", path.display(), err)))?;
    serde_json::from_str(&content)
        .map_err(|err| Error::Config(format!("invalid seed file {}: {}", path.display(), err)))
}

/// Command line client for the dishes and orders API
#[derive(Debug, Parser)]
#[command(name = "client", version)]
pub struct ClientArgs {
    /// Server address, as <host>:<port>
    #[arg(long, env = "GRUBDASH_ADDRESS", default_value = DEFAULT_ADDRESS, value_parser = validate_address)]
    pub target: String,

    #[command(subcommand)]
    pub resource: Resource,
}

#[derive(Debug, Subcommand)]
pub enum Resource {
    /// Operations on dishes
    Dishes {
        #[command(subcommand)]
        action: DishAction,
    },
    /// Operations on orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum DishAction {
    /// List every dish
    List,
    /// Show one dish
    Get { id: String },
    /// Create a dish from a JSON object
    Create {
        #[arg(value_parser = parse_json)]
        data: serde_json::Value,
    },
    /// Replace the fields of a dish with a JSON object
    Update {
        id: String,
        #[arg(value_parser = parse_json)]
        data: serde_json::Value,
    },
}

#[derive(Debug, Subcommand)]
pub enum OrderAction {
    /// List every order
    List,
    /// Show one order
    Get { id: String },
    /// Create an order from a JSON object
    Create {
        #[arg(value_parser = parse_json)]
        data: serde_json::Value,
    },
    /// Update an order with a JSON object
    Update {
        id: String,
        #[arg(value_parser = parse_json)]
        data: serde_json::Value,
    },
    /// Delete a pending order
    Delete { id: String },
}
