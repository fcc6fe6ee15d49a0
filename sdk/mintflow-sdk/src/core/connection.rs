use async_trait::async_trait;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::error::Result;

/// Thin adapter over the ledger network.
///
/// Every method is a network round-trip and may fail transiently. Implementations
/// must not retry on their own; the orchestrator decides what a failure means.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Ask the network to credit `lamports` to `pubkey`. Returns the funding signature
    /// without waiting for it to settle.
    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature>;

    /// Poll until `signature` is observed at `commitment`.
    ///
    /// Fails with `ConfirmationTimeout` if it never gets there and with
    /// `RejectedByNetwork` if the transaction landed with an error.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<()>;

    /// Freshness token for a new transaction. Fetch it right before signing.
    async fn get_latest_blockhash(&self) -> Result<Hash>;

    /// Broadcast a fully signed transaction.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature>;

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64>;

    /// Airdrop and block until the funding transaction reaches `commitment`.
    async fn fund_account(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
        commitment: CommitmentConfig,
    ) -> Result<Signature> {
        let signature = self.request_airdrop(pubkey, lamports).await?;
        self.confirm_transaction(&signature, commitment).await?;
        tracing::debug!(%pubkey, lamports, %signature, "Account funded");
        Ok(signature)
    }

    /// Broadcast then confirm.
    async fn send_and_confirm(
        &self,
        tx: &Transaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature> {
        let signature = self.send_transaction(tx).await?;
        self.confirm_transaction(&signature, commitment).await?;
        Ok(signature)
    }
}
