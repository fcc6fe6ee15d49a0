use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::error::{MintflowError, Result};

/// Abstraction over an external wallet that can sign transactions.
/// This allows the SDK to work with:
/// 1. Local Keypairs (Backend/CLI)
/// 2. Wallet Adapters (Frontend - the user approves every request)
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Human readable wallet name, used in logs.
    fn name(&self) -> &str;

    /// Public key exposed by the wallet once the user approved the connection.
    fn public_key(&self) -> Option<Pubkey>;

    /// Ask the wallet to connect.
    ///
    /// Returns as soon as the request is delivered. The approval arrives later on the
    /// returned receiver; a dropped sender means the user declined.
    async fn connect(&self) -> Result<oneshot::Receiver<Pubkey>>;

    async fn disconnect(&self);

    /// Sign `tx` with the wallet key. Must not alter the message.
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction>;
}

/// The place wallets are discovered in (a browser window, a keystore directory...).
pub trait WalletEnvironment: Send + Sync {
    /// A compatible wallet, if one is installed.
    fn detect(&self) -> Option<Arc<dyn WalletAdapter>>;

    /// Fallback when no wallet is installed: point the user at an install page.
    fn open_install_page(&self, url: &str);
}

/// Keypair-backed wallet that approves every request immediately.
pub struct LocalWallet {
    keypair: Keypair,
    connected: AtomicBool,
}

impl LocalWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            connected: AtomicBool::new(false),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

#[async_trait]
impl WalletAdapter for LocalWallet {
    fn name(&self) -> &str {
        "local"
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.keypair.pubkey())
    }

    async fn connect(&self) -> Result<oneshot::Receiver<Pubkey>> {
        let (tx, rx) = oneshot::channel();
        self.connected.store(true, Ordering::SeqCst);
        // Receiver may already be gone if the caller gave up; nothing to do then.
        let _ = tx.send(self.keypair.pubkey());
        Ok(rx)
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(MintflowError::SignerUnavailable(
                "local wallet is not connected".to_string(),
            ));
        }
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| MintflowError::Signing(e.to_string()))?;
        Ok(tx)
    }
}

/// Environment holding at most one pre-installed wallet.
#[derive(Default)]
pub struct LocalEnvironment {
    wallet: Option<Arc<dyn WalletAdapter>>,
    install_requests: Mutex<Vec<String>>,
}

impl LocalEnvironment {
    pub fn with_wallet(wallet: Arc<dyn WalletAdapter>) -> Self {
        Self {
            wallet: Some(wallet),
            install_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Install pages requested so far.
    pub fn install_requests(&self) -> Vec<String> {
        self.install_requests
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

impl WalletEnvironment for LocalEnvironment {
    fn detect(&self) -> Option<Arc<dyn WalletAdapter>> {
        self.wallet.clone()
    }

    fn open_install_page(&self, url: &str) {
        tracing::info!(url, "No wallet installed; opening install page");
        if let Ok(mut urls) = self.install_requests.lock() {
            urls.push(url.to_string());
        }
    }
}
