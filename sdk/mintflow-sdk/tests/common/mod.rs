#![allow(dead_code)]

use async_trait::async_trait;
use mintflow_sdk::core::connection::LedgerClient;
use mintflow_sdk::core::signer::{LocalEnvironment, LocalWallet, WalletAdapter};
use mintflow_sdk::error::{MintflowError, Result};
use mintflow_sdk::{LifecycleConfig, TokenLifecycleOrchestrator};
use solana_program_test::{BanksClient, ProgramTest, ProgramTestContext};
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction,
    transaction::Transaction,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

//=============================================================================
// Banks-backed ledger
//=============================================================================

/// In-process ledger with the SPL token and associated token account programs loaded.
/// Airdrops are paid by the genesis payer.
pub struct TestContext {
    pub context: Arc<Mutex<ProgramTestContext>>,
    pub payer: Keypair,
}

impl TestContext {
    pub async fn new() -> Self {
        // ProgramTest preloads the SPL programs
        let program_test = ProgramTest::default();
        let context = program_test.start_with_context().await;
        let payer = context.payer.insecure_clone();

        Self {
            context: Arc::new(Mutex::new(context)),
            payer,
        }
    }

    pub async fn get_client(&self) -> BanksClient {
        self.context.lock().await.banks_client.clone()
    }

    pub async fn balance(&self, pubkey: &Pubkey) -> u64 {
        self.get_client().await.get_balance(*pubkey).await.unwrap()
    }
}

fn network_error(e: impl std::fmt::Display) -> MintflowError {
    MintflowError::Network(e.to_string())
}

#[async_trait]
impl LedgerClient for TestContext {
    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature> {
        let blockhash = self.get_latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(
            &[system_instruction::transfer(&self.payer.pubkey(), pubkey, lamports)],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        );
        self.send_transaction(&tx).await
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> Result<()> {
        let status = self
            .get_client()
            .await
            .get_transaction_status(*signature)
            .await
            .map_err(network_error)?;
        match status {
            Some(status) => match status.err {
                Some(err) => Err(MintflowError::RejectedByNetwork(err.to_string())),
                None => Ok(()),
            },
            None => Err(MintflowError::ConfirmationTimeout {
                signature: *signature,
                waited: Duration::ZERO,
            }),
        }
    }

    // A fresh blockhash per call keeps identical transactions from colliding.
    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.context
            .lock()
            .await
            .get_new_latest_blockhash()
            .await
            .map_err(network_error)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        let signature = *tx
            .signatures
            .first()
            .ok_or_else(|| MintflowError::Signing("transaction has no signatures".to_string()))?;
        self.get_client()
            .await
            .process_transaction(tx.clone())
            .await
            .map_err(|e| MintflowError::RejectedByNetwork(e.to_string()))?;
        Ok(signature)
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>> {
        self.get_client()
            .await
            .get_account(*pubkey)
            .await
            .map_err(network_error)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64> {
        let rent = self
            .get_client()
            .await
            .get_rent()
            .await
            .map_err(network_error)?;
        Ok(rent.minimum_balance(data_len))
    }
}

pub async fn setup_test_context() -> TestContext {
    init_tracing();
    TestContext::new().await
}

//=============================================================================
// Scripted ledger
//=============================================================================

/// Ledger that never reaches a network. Airdrops can be made to fail, or held at a
/// gate until the test releases them.
#[derive(Default)]
pub struct ScriptedLedger {
    pub airdrops: AtomicUsize,
    pub sends: AtomicUsize,
    pub fail_airdrops: AtomicBool,
    gated: AtomicBool,
    pub airdrop_entered: Notify,
    pub airdrop_release: Notify,
}

impl ScriptedLedger {
    pub fn failing() -> Self {
        let ledger = Self::default();
        ledger.fail_airdrops.store(true, Ordering::SeqCst);
        ledger
    }

    /// Airdrops block until `airdrop_release` is notified, then fail.
    pub fn gated() -> Self {
        let ledger = Self::failing();
        ledger.gated.store(true, Ordering::SeqCst);
        ledger
    }

    pub fn network_calls(&self) -> usize {
        self.airdrops.load(Ordering::SeqCst) + self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn request_airdrop(&self, _pubkey: &Pubkey, _lamports: u64) -> Result<Signature> {
        self.airdrops.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            self.airdrop_entered.notify_one();
            self.airdrop_release.notified().await;
        }
        if self.fail_airdrops.load(Ordering::SeqCst) {
            return Err(MintflowError::Network("airdrop rate limited".to_string()));
        }
        Ok(Signature::new_unique())
    }

    async fn confirm_transaction(
        &self,
        _signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> Result<()> {
        Ok(())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(tx.signatures.first().copied().unwrap_or_default())
    }

    async fn get_account(&self, _pubkey: &Pubkey) -> Result<Option<Account>> {
        Ok(None)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, _data_len: usize) -> Result<u64> {
        Ok(1_461_600)
    }
}

//=============================================================================
// Orchestrator fixtures
//=============================================================================

/// Orchestrator over `ledger` with a local wallet installed.
pub fn orchestrator_with_wallet<L: LedgerClient>(
    ledger: L,
) -> (TokenLifecycleOrchestrator<L>, Arc<LocalWallet>) {
    init_tracing();
    let wallet = Arc::new(LocalWallet::new(Keypair::new()));
    let adapter: Arc<dyn WalletAdapter> = wallet.clone();
    let environment = Arc::new(LocalEnvironment::with_wallet(adapter));
    let orchestrator =
        TokenLifecycleOrchestrator::new(ledger, environment, LifecycleConfig::default()).unwrap();
    (orchestrator, wallet)
}

/// Connected orchestrator over the Banks ledger. The wallet holds enough lamports
/// to pay for its own transfers.
pub async fn connected_lifecycle() -> (TokenLifecycleOrchestrator<TestContext>, Arc<LocalWallet>) {
    let context = setup_test_context().await;
    let (orchestrator, wallet) = orchestrator_with_wallet(context);
    orchestrator.connect_wallet().await.unwrap();
    (orchestrator, wallet)
}

pub async fn fund_wallet(orchestrator: &TokenLifecycleOrchestrator<TestContext>, wallet: &Pubkey) {
    orchestrator
        .ledger()
        .fund_account(wallet, 1_000_000_000, CommitmentConfig::confirmed())
        .await
        .unwrap();
}
