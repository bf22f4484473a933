//! CLI command implementations.

pub mod blogs;
pub mod delivery;
pub mod pincode;
pub mod promos;

use serde::Serialize;
use thiserror::Error;

use freshcart_storefront::backend::{BackendClient, BackendError};
use freshcart_storefront::config::{BackendConfig, ConfigError};

/// Errors shared by all commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Build a backend client from `--backend-url` or the environment.
///
/// # Errors
///
/// Returns an error if no backend is configured or the client cannot be built.
pub fn connect(backend_url: Option<String>) -> Result<BackendClient, CommandError> {
    dotenvy::dotenv().ok();

    let config = match backend_url {
        Some(url) => BackendConfig::for_url(url),
        None => BackendConfig::from_env()?,
    };
    tracing::debug!(backend = %config.base_url, "Connecting to backend");
    Ok(BackendClient::new(&config)?)
}

/// Print a value as pretty JSON on stdout.
#[allow(clippy::print_stdout)]
fn emit(value: &impl Serialize) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
