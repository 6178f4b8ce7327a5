use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::EncodableKey;

use crate::client::SendOptions;
use crate::error::{Error, Result};

pub const DEFAULT_KEYPAIR_PATH: &str = "~/.config/solana/id.json";

/// Where to connect and who signs. Passed explicitly to the client entry point.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// A cluster name (`devnet`, `testnet`, `mainnet`, `localnet`) or an RPC URL.
    pub cluster: String,

    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,

    #[serde(default = "default_commitment")]
    pub commitment: String,

    #[serde(default)]
    pub skip_preflight: bool,

    /// How long to wait for a submitted transaction to confirm.
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    /// Total time spent retrying transient failures before giving up.
    #[serde(default = "default_retry_max_elapsed_secs")]
    pub retry_max_elapsed_secs: u64,
}

fn default_keypair_path() -> String {
    DEFAULT_KEYPAIR_PATH.to_string()
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_confirm_timeout_secs() -> u64 {
    60
}

fn default_retry_max_elapsed_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            cluster: "localnet".to_string(),
            keypair_path: default_keypair_path(),
            commitment: default_commitment(),
            skip_preflight: false,
            confirm_timeout_secs: default_confirm_timeout_secs(),
            retry_max_elapsed_secs: default_retry_max_elapsed_secs(),
        }
    }
}

pub fn cluster_url(cluster: &str) -> &str {
    match cluster {
        "devnet" => "https://api.devnet.solana.com",
        "testnet" => "https://api.testnet.solana.com",
        "mainnet" => "https://api.mainnet-beta.solana.com",
        "localnet" => "http://127.0.0.1:8899",
        custom => custom,
    }
}

impl ProviderConfig {
    /// Reads a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        content.parse()
    }

    pub fn validate(&self) -> Result<()> {
        self.commitment()?;
        if self.confirm_timeout_secs == 0 {
            return Err(Error::Config(
                "confirm_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> &str {
        cluster_url(&self.cluster)
    }

    pub fn commitment(&self) -> Result<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|_| Error::Config(format!("unknown commitment `{}`", self.commitment)))
    }

    pub fn load_keypair(&self) -> Result<Keypair> {
        let path = shellexpand::tilde(&self.keypair_path);
        Keypair::read_from_file(&*path).map_err(|e| Error::Keypair(format!("{path}: {e}")))
    }

    pub fn send_options(&self) -> SendOptions {
        SendOptions {
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            retry_max_elapsed: Duration::from_secs(self.retry_max_elapsed_secs),
            ..SendOptions::default()
        }
    }
}

impl FromStr for ProviderConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
