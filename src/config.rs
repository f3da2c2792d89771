//! Configuration module
//!
//! Settings come from an optional TOML file, then `.env` / environment
//! variables, then command-line flags, each layer overriding the previous.
//! Secrets never live here: the wallet section only names a keypair file.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::rpc_manager::RpcEndpointConfig;

/// Environment variable overriding `rpc.url`
pub const ENV_URL: &str = "MINTFORGE_URL";
/// Environment variable overriding `wallet.keypair_path`
pub const ENV_KEYPAIR: &str = "MINTFORGE_KEYPAIR";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Ledger endpoint
    #[serde(default)]
    pub rpc: RpcEndpointConfig,

    /// Signing identity
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletConfig {
    /// Path to keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

fn default_keypair_path() -> String {
    "./id.json".to_string()
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides
    ///
    /// A missing file falls back to defaults; a malformed one is an error.
    pub fn from_file_with_env(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(
            std::env::var(ENV_URL).ok(),
            std::env::var(ENV_KEYPAIR).ok(),
        ))
    }

    /// Replace the endpoint and keypair path where a value is given
    pub fn with_overrides(mut self, url: Option<String>, keypair_path: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.rpc.url = url;
        }
        if let Some(path) = keypair_path.filter(|p| !p.trim().is_empty()) {
            self.wallet.keypair_path = path;
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        self.rpc.validate().map_err(anyhow::Error::msg)?;
        if self.wallet.keypair_path.trim().is_empty() {
            anyhow::bail!("wallet.keypair_path must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc_manager::Commitment;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rpc.url, "https://api.devnet.solana.com");
        assert_eq!(config.rpc.commitment, Commitment::Confirmed);
        assert_eq!(config.rpc.timeout_secs, 30);
        assert_eq!(config.wallet.keypair_path, "./id.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[rpc]\nurl = \"localnet\"\ncommitment = \"finalized\"\n\n[wallet]\nkeypair_path = \"/tmp/payer.json\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.rpc.resolved_url(), "http://127.0.0.1:8899");
        assert_eq!(config.rpc.commitment, Commitment::Finalized);
        assert_eq!(config.rpc.timeout_secs, 30);
        assert_eq!(config.wallet.keypair_path, "/tmp/payer.json");
    }

    #[test]
    fn test_from_file_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rpc\nurl = ").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(
            Some("http://localhost:8899".to_string()),
            Some(String::new()),
        );
        assert_eq!(config.rpc.url, "http://localhost:8899");
        assert_eq!(config.wallet.keypair_path, "./id.json");
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = Config::default().with_overrides(Some("ftp://nowhere".to_string()), None);
        assert!(config.validate().is_err());
    }
}
