//! Configuration module for Socksgate
//!
//! This module provides configuration types and parsing for the server.

mod server;

pub use server::{Config, ServerConfig, UserConfig, MAX_CREDENTIAL_LEN};

use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config = parse_config(&content)?;
    config
        .validate()
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("Invalid configuration in {:?}", path.as_ref()))?;

    tracing::info!("Loaded {} users.", config.users.len());
    Ok(config)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}
