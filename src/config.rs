//! Configuration for ring settlement

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::context::{CollaboratorPolicy, HashAlgorithm};
use crate::{Error, Result};

/// LRC token, the default fee token
pub const LRC_TOKEN: Address = address!("ef68e7c694f40c8202821edf525de3782458639f");

/// Ring settlement configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Percentage of fees (and complement of margin) shared with referring
    /// wallets, 0-100 inclusive
    pub wallet_split_percentage: i64,

    /// Token fees are paid in
    pub fee_token: Address,

    /// Hash function for order and ring identity hashes
    pub hash_algorithm: HashAlgorithm,

    /// Collaborator call bounds
    pub collaborator: CollaboratorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "ring-settlement".to_string(),
            wallet_split_percentage: 20,
            fee_token: LRC_TOKEN,
            hash_algorithm: HashAlgorithm::default(),
            collaborator: CollaboratorConfig::default(),
        }
    }
}

/// Collaborator call configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorConfig {
    /// Timeout per scaler/registry call in milliseconds
    pub timeout_ms: u64,

    /// Maximum concurrent scaler calls per ring
    pub scale_concurrency: usize,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            scale_concurrency: 8,
        }
    }
}

impl CollaboratorConfig {
    /// Convert to the runtime policy
    pub fn policy(&self) -> CollaboratorPolicy {
        CollaboratorPolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            scale_concurrency: self.scale_concurrency,
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Configuration(format!("Invalid {}='{}': {}", name, value, e)))
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    /// Parse from a TOML string and validate
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        Config::default().with_env_overrides()
    }

    /// Apply environment variable overrides and validate
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(pct) = std::env::var("RING_WALLET_SPLIT_PERCENTAGE") {
            self.wallet_split_percentage = parse_env("RING_WALLET_SPLIT_PERCENTAGE", &pct)?;
        }

        if let Ok(token) = std::env::var("RING_FEE_TOKEN") {
            self.fee_token = parse_env("RING_FEE_TOKEN", &token)?;
        }

        if let Ok(algorithm) = std::env::var("RING_HASH_ALGORITHM") {
            self.hash_algorithm = algorithm.parse()?;
        }

        if let Ok(timeout) = std::env::var("RING_COLLABORATOR_TIMEOUT_MS") {
            self.collaborator.timeout_ms = parse_env("RING_COLLABORATOR_TIMEOUT_MS", &timeout)?;
        }

        if let Ok(concurrency) = std::env::var("RING_SCALE_CONCURRENCY") {
            self.collaborator.scale_concurrency = parse_env("RING_SCALE_CONCURRENCY", &concurrency)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject out-of-domain values
    pub fn validate(&self) -> Result<()> {
        if !(0..=100).contains(&self.wallet_split_percentage) {
            return Err(Error::Configuration(format!(
                "wallet_split_percentage {} outside 0..=100",
                self.wallet_split_percentage
            )));
        }
        if self.collaborator.timeout_ms == 0 {
            return Err(Error::Configuration("collaborator.timeout_ms must be positive".into()));
        }
        if self.collaborator.scale_concurrency == 0 {
            return Err(Error::Configuration(
                "collaborator.scale_concurrency must be positive".into(),
            ));
        }
        Ok(())
    }
}
