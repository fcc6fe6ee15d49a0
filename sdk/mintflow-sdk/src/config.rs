//! Lifecycle configuration.
//!
//! Every field has a default matching the fixed quantities the workflow was designed
//! around, so an empty TOML file (or `LifecycleConfig::default()`) is a valid config.

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::core::constants::{
    DEFAULT_FUNDING_LAMPORTS, DEFAULT_RECIPIENT, DEFAULT_RPC_URL, INITIAL_MINT_AMOUNT,
    MINT_AGAIN_AMOUNT, TOKEN_DECIMALS, TRANSFER_AMOUNT,
};
use crate::error::{MintflowError, Result};

/// Overrides `rpc_url` when set.
pub const RPC_URL_ENV_VAR: &str = "MINTFLOW_RPC_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    pub rpc_url: String,
    /// "processed", "confirmed" or "finalized"
    pub commitment: String,
    pub funding_lamports: u64,
    pub decimals: u8,
    pub initial_mint_amount: u64,
    pub mint_again_amount: u64,
    pub transfer_amount: u64,
    /// Base58 address receiving wallet-signed transfers
    pub recipient: String,
    pub rpc_timeout_secs: u64,
    pub confirm_timeout_secs: u64,
    pub confirm_poll_ms: u64,
    pub connect_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: "confirmed".to_string(),
            funding_lamports: DEFAULT_FUNDING_LAMPORTS,
            decimals: TOKEN_DECIMALS,
            initial_mint_amount: INITIAL_MINT_AMOUNT,
            mint_again_amount: MINT_AGAIN_AMOUNT,
            transfer_amount: TRANSFER_AMOUNT,
            recipient: DEFAULT_RECIPIENT.to_string(),
            rpc_timeout_secs: 30,
            confirm_timeout_secs: 60,
            confirm_poll_ms: 500,
            connect_timeout_secs: 120,
        }
    }
}

impl LifecycleConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LifecycleConfig =
            toml::from_str(content).map_err(|e| MintflowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the current values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(RPC_URL_ENV_VAR) {
            if !url.trim().is_empty() {
                self.rpc_url = url;
            }
        }
        self
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        let commitment = CommitmentLevel::from_str(&self.commitment).map_err(|_| {
            MintflowError::Config(format!("unknown commitment level '{}'", self.commitment))
        })?;
        Ok(CommitmentConfig { commitment })
    }

    pub fn recipient(&self) -> Result<Pubkey> {
        Pubkey::from_str(&self.recipient)
            .map_err(|e| MintflowError::Config(format!("invalid recipient '{}': {}", self.recipient, e)))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Reject configs the workflow cannot run with. Reports every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.rpc_url.trim().is_empty() {
            problems.push("rpc_url is empty".to_string());
        }
        if let Err(e) = self.commitment_config() {
            problems.push(e.to_string());
        }
        if let Err(e) = self.recipient() {
            problems.push(e.to_string());
        }
        for (name, value) in [
            ("funding_lamports", self.funding_lamports),
            ("initial_mint_amount", self.initial_mint_amount),
            ("mint_again_amount", self.mint_again_amount),
            ("transfer_amount", self.transfer_amount),
            ("rpc_timeout_secs", self.rpc_timeout_secs),
            ("confirm_timeout_secs", self.confirm_timeout_secs),
            ("confirm_poll_ms", self.confirm_poll_ms),
            ("connect_timeout_secs", self.connect_timeout_secs),
        ] {
            if value == 0 {
                problems.push(format!("{} must be greater than zero", name));
            }
        }
        if self.decimals > 9 {
            problems.push(format!("decimals must be at most 9, got {}", self.decimals));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(MintflowError::Config(problems.join(", ")))
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LifecycleConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| MintflowError::Config(format!("{}: {}", path.display(), e)))?;
    LifecycleConfig::from_toml_str(&content)
}
