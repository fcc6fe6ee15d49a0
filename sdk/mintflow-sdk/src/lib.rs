pub mod advanced;
pub mod basic;
pub mod config;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::basic::authority::{EphemeralKeypair, EphemeralMintAuthority, ExportedKeypair};
pub use crate::basic::orchestrator::TokenLifecycleOrchestrator;
pub use crate::basic::state::{StateKind, TokenContext, WorkflowState};
pub use crate::config::{load_config, LifecycleConfig};
pub use crate::core::connection::LedgerClient;
pub use crate::core::rpc::RpcLedger;
pub use crate::core::signer::{LocalEnvironment, LocalWallet, WalletAdapter, WalletEnvironment};
pub use crate::error::{MintflowError, Result};
pub use crate::types::{AssociatedAccountRef, LifecycleOperation, LifecycleReceipt, MintInfo};
pub use crate::utils::{
    derive_associated_account, fetch_mint_info, fetch_token_balance,
    get_or_create_associated_account,
};
