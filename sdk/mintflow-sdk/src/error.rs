use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::basic::state::StateKind;

/// SDK-specific error types for token lifecycle operations
#[derive(Debug, Error)]
pub enum MintflowError {
    /// No compatible wallet signer was found in the environment
    #[error("No compatible wallet found; install one from {install_url}")]
    EnvironmentUnavailable { install_url: String },

    /// The wallet signer declined the request
    #[error("Wallet rejected the request: {0}")]
    UserRejected(String),

    /// The wallet signer is gone (disconnected, never connected, or crashed)
    #[error("Wallet signer unavailable: {0}")]
    SignerUnavailable(String),

    /// The signer returned something other than the proposed transaction plus its signature
    #[error("Wallet signer returned a tampered transaction: {0}")]
    SignerMisbehaved(String),

    /// Wallet approval did not arrive in time
    #[error("Wallet did not approve the connection within {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// Caller abandoned the connect wait
    #[error("Wallet connection was cancelled")]
    ConnectCancelled,

    /// Connection or RPC error
    #[error("Network error: {0}")]
    Network(String),

    /// Transaction never reached the requested commitment
    #[error("Transaction {signature} was not confirmed within {waited:?}")]
    ConfirmationTimeout {
        signature: Signature,
        waited: std::time::Duration,
    },

    /// Transaction invalid per program rules (insufficient funds, wrong authority, ...)
    #[error("Transaction rejected by network: {0}")]
    RejectedByNetwork(String),

    /// Another lifecycle operation has not settled yet
    #[error("Another lifecycle operation is still in progress")]
    OperationInProgress,

    /// Operation invoked outside its precondition state
    #[error("{operation} is not allowed in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: StateKind,
    },

    /// Account not found on-chain
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    /// Invalid account data or deserialization error
    #[error("Invalid account data: {0}")]
    InvalidAccountData(String),

    /// Keypair bytes could not be restored
    #[error("Invalid keypair material: {0}")]
    InvalidKeypair(String),

    /// Local keypairs could not sign a transaction (missing or unexpected signer)
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Token program instruction could not be built
    #[error("Instruction error: {0}")]
    Instruction(#[from] solana_sdk::program_error::ProgramError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MintflowError {
    /// True for errors raised before anything was sent to the network
    pub fn is_local_rejection(&self) -> bool {
        matches!(
            self,
            MintflowError::OperationInProgress | MintflowError::InvalidState { .. }
        )
    }
}

impl From<solana_client::client_error::ClientError> for MintflowError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        match err.get_transaction_error() {
            Some(tx_err) => MintflowError::RejectedByNetwork(tx_err.to_string()),
            None => MintflowError::Network(err.to_string()),
        }
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, MintflowError>;
