use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;

use crate::core::connection::LedgerClient;
use crate::error::{MintflowError, Result};

/// Collects instructions and turns them into a transaction stamped with a fresh blockhash.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    fee_payer: Pubkey,
    instructions: Vec<Instruction>,
}

impl TransactionBuilder {
    pub fn new(fee_payer: Pubkey) -> Self {
        Self {
            fee_payer,
            instructions: Vec::new(),
        }
    }

    pub fn add_instruction(mut self, ix: Instruction) -> Self {
        self.instructions.push(ix);
        self
    }

    pub fn add_instructions(mut self, ixs: impl IntoIterator<Item = Instruction>) -> Self {
        self.instructions.extend(ixs);
        self
    }

    /// Unsigned transaction for an external signer. The blockhash is fetched here,
    /// so hand it to the signer right away.
    pub async fn build_unsigned(&self, connection: &impl LedgerClient) -> Result<Transaction> {
        let recent_blockhash = connection.get_latest_blockhash().await?;
        let message = Message::new_with_blockhash(
            &self.instructions,
            Some(&self.fee_payer),
            &recent_blockhash,
        );
        Ok(Transaction::new_unsigned(message))
    }

    /// Fully signed by local keypairs. The fee payer must be among `signers`.
    pub async fn build_signed(
        &self,
        connection: &impl LedgerClient,
        signers: &[&Keypair],
    ) -> Result<Transaction> {
        let mut tx = self.build_unsigned(connection).await?;
        let recent_blockhash = tx.message.recent_blockhash;
        tx.try_sign(signers, recent_blockhash)
            .map_err(|e| MintflowError::Signing(e.to_string()))?;
        Ok(tx)
    }

    pub async fn send_signed(
        &self,
        connection: &impl LedgerClient,
        signers: &[&Keypair],
        commitment: CommitmentConfig,
    ) -> Result<Signature> {
        let tx = self.build_signed(connection, signers).await?;
        connection.send_and_confirm(&tx, commitment).await
    }
}
