//! Session configuration from environment variables.

use crate::domain::{AbiError, ContractInterface};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// First deployment address on a fresh local development chain.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Failed to read contract artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid contract artifact {path}: {source}")]
    ArtifactParse {
        path: PathBuf,
        #[source]
        source: AbiError,
    },
}

/// Wallet session configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Deployment address of the contract (validated at bind time)
    pub contract_address: String,
    /// Interface description of the contract
    pub interface: Arc<ContractInterface>,
    /// Confirmations awaited per transaction
    pub confirmations: u64,
    /// Beyond this a submitted transaction is reported never confirmed
    pub confirmation_timeout: Duration,
    /// Refresh every field right after binding
    pub refresh_on_connect: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            interface: Arc::new(ContractInterface::atm()),
            confirmations: 1,
            confirmation_timeout: Duration::from_secs(120),
            refresh_on_connect: true,
        }
    }
}

impl SessionConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ATM_CONTRACT_ADDRESS`: Contract address (default: first devnet deployment)
    /// - `ATM_CONTRACT_ARTIFACT`: Path to an artifact JSON or bare ABI (default: built-in ATM)
    /// - `ATM_CONFIRMATIONS`: Confirmations per transaction (default: 1)
    /// - `ATM_CONFIRMATION_TIMEOUT_SECS`: Confirmation timeout (default: 120)
    /// - `ATM_REFRESH_ON_CONNECT`: Refresh read state after connecting (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let interface = match lookup("ATM_CONTRACT_ARTIFACT") {
            Some(path) => Arc::new(load_artifact(PathBuf::from(path))?),
            None => defaults.interface,
        };

        Ok(Self {
            contract_address: lookup("ATM_CONTRACT_ADDRESS").unwrap_or(defaults.contract_address),
            interface,
            confirmations: parse_var(&lookup, "ATM_CONFIRMATIONS")?
                .filter(|n| *n > 0)
                .unwrap_or(defaults.confirmations),
            confirmation_timeout: parse_var(&lookup, "ATM_CONFIRMATION_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.confirmation_timeout),
            refresh_on_connect: lookup("ATM_REFRESH_ON_CONNECT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.refresh_on_connect),
        })
    }

    /// Use a different interface description.
    pub fn with_interface(mut self, interface: ContractInterface) -> Self {
        self.interface = Arc::new(interface);
        self
    }

    pub fn with_contract_address(mut self, address: impl Into<String>) -> Self {
        self.contract_address = address.into();
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_refresh_on_connect(mut self, enabled: bool) -> Self {
        self.refresh_on_connect = enabled;
        self
    }
}

fn parse_var<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var, value })
        })
        .transpose()
}

fn load_artifact(path: PathBuf) -> Result<ContractInterface, ConfigError> {
    let json = std::fs::read_to_string(&path).map_err(|source| ConfigError::ArtifactRead {
        path: path.clone(),
        source,
    })?;
    ContractInterface::from_json(&json).map_err(|source| ConfigError::ArtifactParse { path, source })
}
