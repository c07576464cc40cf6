//! CLI command implementations.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod hostess;

use std::sync::Arc;

use luma_storefront::api::{ApiClient, ApiError};
use luma_storefront::cart::CartStore;
use luma_storefront::config::StorefrontConfig;
use luma_storefront::error::{AppError, ErrorKind};
use luma_storefront::storage::{FileStore, KeyValueStore, StorageError};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Reading from the terminal failed.
    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::App(err.into())
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        Self::App(err.into())
    }
}

impl CliError {
    pub fn user_message(&self) -> String {
        match self {
            Self::App(err) => err.user_message(),
            Self::NotFound(what) => what.clone(),
            Self::Input(_) => "Não foi possível ler a entrada.".to_string(),
        }
    }

    pub fn is_session_error(&self) -> bool {
        matches!(self, Self::App(err) if err.kind() == ErrorKind::Session)
    }

    pub fn report(&self) {
        match self {
            Self::App(err) => err.report(),
            Self::NotFound(_) => {}
            Self::Input(err) => tracing::debug!(error = %err, "Terminal input failed"),
        }
    }
}

/// Shared handles every command works with.
pub struct Context {
    pub store: Arc<dyn KeyValueStore>,
    pub client: ApiClient,
}

impl Context {
    /// Open the data directory and build the API client over it.
    pub fn open(config: StorefrontConfig) -> Result<Self, CliError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
        let client = ApiClient::new(&config, Arc::clone(&store))?;
        tracing::debug!(data_dir = %config.data_dir.display(), "Context opened");
        Ok(Self { store, client })
    }

    pub fn cart(&self) -> Result<CartStore, CliError> {
        Ok(CartStore::load(Arc::clone(&self.store))?)
    }
}

/// Read one trimmed line from stdin. EOF yields an empty string.
pub async fn read_line() -> Result<String, CliError> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}
