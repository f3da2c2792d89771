use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;

/// Configuration for the RPC endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcEndpointConfig {
    /// Endpoint URL or cluster moniker (`devnet`, `testnet`, `mainnet-beta`, `localnet`)
    #[serde(default = "default_url")]
    pub url: String,

    /// Confirmation level used for queries and for waiting on submissions
    #[serde(default)]
    pub commitment: Commitment,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    Cluster::Devnet.url().to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RpcEndpointConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            commitment: Commitment::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RpcEndpointConfig {
    /// The URL to connect to, with cluster monikers expanded
    pub fn resolved_url(&self) -> String {
        match self.url.parse::<Cluster>() {
            Ok(cluster) => cluster.url().to_string(),
            Err(_) => self.url.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let url = self.resolved_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("rpc.url must be http(s) or a cluster name, got '{}'", self.url));
        }
        if self.timeout_secs == 0 {
            return Err("rpc.timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Confirmation level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl From<Commitment> for CommitmentConfig {
    fn from(commitment: Commitment) -> Self {
        match commitment {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

/// Well-known public clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn url(&self) -> &'static str {
        match self {
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Self::Localnet => "http://127.0.0.1:8899",
        }
    }

    /// Explorer `cluster=` query value
    pub fn explorer_param(&self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::MainnetBeta => "mainnet-beta",
            Self::Localnet => "custom",
        }
    }

    /// Best-effort guess of the cluster behind an endpoint URL
    pub fn from_url(url: &str) -> Option<Self> {
        [Self::Devnet, Self::Testnet, Self::MainnetBeta, Self::Localnet]
            .into_iter()
            .find(|c| url.trim_end_matches('/') == c.url())
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Self::MainnetBeta),
            "localnet" | "localhost" => Ok(Self::Localnet),
            other => Err(format!("unknown cluster '{}'", other)),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.explorer_param())
    }
}

/// Explorer link for a transaction signature, when the cluster is known
pub fn explorer_tx_url(signature: &str, endpoint: &str) -> Option<String> {
    Cluster::from_url(endpoint).map(|cluster| {
        format!(
            "https://explorer.solana.com/tx/{}?cluster={}",
            signature,
            cluster.explorer_param()
        )
    })
}
