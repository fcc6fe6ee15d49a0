//! JSON-RPC backed [`LedgerClient`].
//!
//! Wraps the nonblocking `RpcClient`. Each call is bounded by the configured RPC
//! timeout; confirmation is a status poll bounded by its own timeout.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

use crate::config::LifecycleConfig;
use crate::core::connection::LedgerClient;
use crate::error::{MintflowError, Result};

pub struct RpcLedger {
    client: RpcClient,
    rpc_timeout: Duration,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl RpcLedger {
    pub fn new(config: &LifecycleConfig) -> Result<Self> {
        let commitment = config.commitment_config()?;
        let rpc_timeout = Duration::from_secs(config.rpc_timeout_secs);
        let client = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            rpc_timeout,
            commitment,
        );

        tracing::info!(rpc_url = %config.rpc_url, commitment = ?commitment.commitment, "RPC ledger initialized");

        Ok(Self {
            client,
            rpc_timeout,
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            poll_interval: Duration::from_millis(config.confirm_poll_ms),
        })
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    async fn bounded<T, F>(&self, what: &'static str, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = std::result::Result<T, solana_client::client_error::ClientError>>,
    {
        match timeout(self.rpc_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::debug!(call = what, error = %e, "RPC error");
                Err(e.into())
            },
            Err(_) => {
                tracing::debug!(call = what, "RPC timeout");
                Err(MintflowError::Network(format!(
                    "{} timed out after {:?}",
                    what, self.rpc_timeout
                )))
            },
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature> {
        self.bounded("requestAirdrop", self.client.request_airdrop(pubkey, lamports))
            .await
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<()> {
        let started = Instant::now();
        loop {
            let statuses = self
                .bounded(
                    "getSignatureStatuses",
                    self.client.get_signature_statuses(&[*signature]),
                )
                .await?;

            if let Some(Some(status)) = statuses.value.into_iter().next() {
                if let Some(err) = status.err {
                    return Err(MintflowError::RejectedByNetwork(err.to_string()));
                }
                if status.satisfies_commitment(commitment) {
                    return Ok(());
                }
            }

            if started.elapsed() >= self.confirm_timeout {
                return Err(MintflowError::ConfirmationTimeout {
                    signature: *signature,
                    waited: started.elapsed(),
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.bounded("getLatestBlockhash", self.client.get_latest_blockhash())
            .await
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        if !tx.is_signed() {
            return Err(MintflowError::RejectedByNetwork(
                "transaction is missing required signatures".to_string(),
            ));
        }
        self.bounded("sendTransaction", self.client.send_transaction(tx))
            .await
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>> {
        let response = self
            .bounded(
                "getAccountInfo",
                self.client
                    .get_account_with_commitment(pubkey, self.client.commitment()),
            )
            .await?;
        Ok(response.value)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64> {
        self.bounded(
            "getMinimumBalanceForRentExemption",
            self.client.get_minimum_balance_for_rent_exemption(data_len),
        )
        .await
    }
}
