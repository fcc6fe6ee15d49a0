use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

use crate::core::constants::WALLET_INSTALL_URL;
use crate::core::signer::{WalletAdapter, WalletEnvironment};
use crate::error::{MintflowError, Result};

/// The connected wallet: its public key plus the right to ask it for signatures.
#[derive(Clone)]
pub struct WalletIdentity {
    pubkey: Pubkey,
    adapter: Arc<dyn WalletAdapter>,
}

impl std::fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("pubkey", &self.pubkey)
            .field("wallet", &self.adapter.name())
            .finish()
    }
}

impl WalletIdentity {
    pub fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    /// Have the wallet sign `tx` and check it came back with only a signature added.
    pub async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction> {
        let proposed = tx.message.clone();
        let signed = self.adapter.sign_transaction(tx).await?;

        if signed.message != proposed {
            return Err(MintflowError::SignerMisbehaved(
                "message differs from the proposed transaction".to_string(),
            ));
        }

        let required = signed.message.header.num_required_signatures as usize;
        let index = signed.message.account_keys[..required.min(signed.message.account_keys.len())]
            .iter()
            .position(|key| key == &self.pubkey)
            .ok_or_else(|| {
                MintflowError::SignerMisbehaved("wallet is not a required signer".to_string())
            })?;

        let valid = signed
            .signatures
            .get(index)
            .map(|sig| sig.verify(self.pubkey.as_ref(), &signed.message_data()))
            .unwrap_or(false);
        if !valid {
            return Err(MintflowError::SignerMisbehaved(
                "missing or invalid wallet signature".to_string(),
            ));
        }

        Ok(signed)
    }
}

/// Connect/disconnect lifecycle around an external wallet.
pub struct WalletSession {
    environment: Arc<dyn WalletEnvironment>,
    connect_timeout: Duration,
    identity: Mutex<Option<WalletIdentity>>,
}

impl WalletSession {
    pub fn new(environment: Arc<dyn WalletEnvironment>, connect_timeout: Duration) -> Self {
        Self {
            environment,
            connect_timeout,
            identity: Mutex::new(None),
        }
    }

    /// Connect and wait for the user's approval, bounded by the connect timeout.
    pub async fn connect(&self) -> Result<WalletIdentity> {
        self.connect_until(std::future::pending()).await
    }

    /// Like [`connect`](Self::connect), abandoned early when `cancel` resolves.
    pub async fn connect_until<F>(&self, cancel: F) -> Result<WalletIdentity>
    where
        F: Future<Output = ()> + Send,
    {
        let Some(adapter) = self.environment.detect() else {
            self.environment.open_install_page(WALLET_INSTALL_URL);
            return Err(MintflowError::EnvironmentUnavailable {
                install_url: WALLET_INSTALL_URL.to_string(),
            });
        };

        let approval = adapter.connect().await?;

        let outcome = tokio::select! {
            result = timeout(self.connect_timeout, approval) => match result {
                Ok(Ok(pubkey)) => Ok(pubkey),
                Ok(Err(_)) => Err(MintflowError::UserRejected(
                    "connection request was declined".to_string(),
                )),
                Err(_) => Err(MintflowError::ConnectTimeout(self.connect_timeout)),
            },
            _ = cancel => Err(MintflowError::ConnectCancelled),
        };

        let pubkey = match outcome {
            Ok(pubkey) => pubkey,
            Err(e) => {
                adapter.disconnect().await;
                return Err(e);
            },
        };

        let identity = WalletIdentity { pubkey, adapter };
        *self.slot() = Some(identity.clone());

        tracing::info!(wallet = %pubkey, "Wallet connected");
        Ok(identity)
    }

    /// Drop the held identity. Safe to call when already disconnected.
    pub async fn disconnect(&self) {
        let previous = self.slot().take();
        if let Some(identity) = previous {
            identity.adapter.disconnect().await;
            tracing::info!(wallet = %identity.pubkey, "Wallet disconnected");
        }
    }

    pub fn identity(&self) -> Option<WalletIdentity> {
        self.slot().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.slot().is_some()
    }

    pub async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction> {
        let identity = self.identity().ok_or_else(|| {
            MintflowError::SignerUnavailable("no wallet connected".to_string())
        })?;
        identity.sign_transaction(tx).await
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<WalletIdentity>> {
        self.identity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signer::{LocalEnvironment, LocalWallet};
    use async_trait::async_trait;
    use solana_sdk::hash::Hash;
    use solana_sdk::signature::{Keypair, Signer};
    use solana_sdk::system_instruction;
    use tokio::sync::oneshot;

    /// Wallet that never answers the connect request.
    struct SilentWallet {
        pending: Mutex<Option<oneshot::Sender<Pubkey>>>,
    }

    #[async_trait]
    impl WalletAdapter for SilentWallet {
        fn name(&self) -> &str {
            "silent"
        }

        fn public_key(&self) -> Option<Pubkey> {
            None
        }

        async fn connect(&self) -> Result<oneshot::Receiver<Pubkey>> {
            let (tx, rx) = oneshot::channel();
            *self.pending.lock().unwrap() = Some(tx);
            Ok(rx)
        }

        async fn disconnect(&self) {}

        async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction> {
            Ok(tx)
        }
    }

    fn transfer_from(wallet: &Pubkey) -> Transaction {
        let ix = system_instruction::transfer(wallet, &Pubkey::new_unique(), 1);
        let mut tx = Transaction::new_with_payer(&[ix], Some(wallet));
        tx.message.recent_blockhash = Hash::new_unique();
        tx
    }

    #[tokio::test]
    async fn missing_wallet_opens_install_page() {
        let env = Arc::new(LocalEnvironment::empty());
        let session = WalletSession::new(env.clone(), Duration::from_secs(1));

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, MintflowError::EnvironmentUnavailable { .. }));
        assert_eq!(env.install_requests(), vec![WALLET_INSTALL_URL.to_string()]);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn connect_then_disconnect() {
        let keypair = Keypair::new();
        let expected = keypair.pubkey();
        let wallet = Arc::new(LocalWallet::new(keypair));
        let env = Arc::new(LocalEnvironment::with_wallet(wallet.clone()));
        let session = WalletSession::new(env, Duration::from_secs(1));

        let identity = session.connect().await.unwrap();
        assert_eq!(identity.pubkey(), expected);
        assert_eq!(wallet.public_key(), Some(expected));

        session.disconnect().await;
        session.disconnect().await;
        assert!(!session.is_connected());
        assert_eq!(wallet.public_key(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_connect_times_out() {
        let wallet = Arc::new(SilentWallet {
            pending: Mutex::new(None),
        });
        let session = WalletSession::new(
            Arc::new(LocalEnvironment::with_wallet(wallet)),
            Duration::from_secs(5),
        );

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, MintflowError::ConnectTimeout(_)));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn connect_can_be_cancelled() {
        let wallet = Arc::new(SilentWallet {
            pending: Mutex::new(None),
        });
        let session = WalletSession::new(
            Arc::new(LocalEnvironment::with_wallet(wallet)),
            Duration::from_secs(60),
        );

        let err = session
            .connect_until(std::future::ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, MintflowError::ConnectCancelled));
    }

    #[tokio::test]
    async fn sign_without_connection_is_unavailable() {
        let session = WalletSession::new(Arc::new(LocalEnvironment::empty()), Duration::from_secs(1));
        let err = session
            .sign_transaction(transfer_from(&Pubkey::new_unique()))
            .await
            .unwrap_err();
        assert!(matches!(err, MintflowError::SignerUnavailable(_)));
    }

    #[tokio::test]
    async fn signed_transaction_keeps_message() {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        let session = WalletSession::new(
            Arc::new(LocalEnvironment::with_wallet(Arc::new(LocalWallet::new(keypair)))),
            Duration::from_secs(1),
        );
        session.connect().await.unwrap();

        let tx = transfer_from(&pubkey);
        let message = tx.message.clone();
        let signed = session.sign_transaction(tx).await.unwrap();
        assert_eq!(signed.message, message);
        assert!(signed.is_signed());
    }

    #[tokio::test]
    async fn unsigned_return_is_flagged() {
        let wallet = Arc::new(SilentWallet {
            pending: Mutex::new(None),
        });
        let identity = WalletIdentity {
            pubkey: Pubkey::new_unique(),
            adapter: wallet,
        };
        let err = identity
            .sign_transaction(transfer_from(&identity.pubkey()))
            .await
            .unwrap_err();
        assert!(matches!(err, MintflowError::SignerMisbehaved(_)));
    }
}
