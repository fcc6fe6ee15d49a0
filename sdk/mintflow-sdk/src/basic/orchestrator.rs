//! Token lifecycle orchestration.
//!
//! Sequences wallet connection, the initial mint, repeated mints, wallet-signed
//! transfers and the final supply cap. Every public operation:
//! - claims the in-flight slot before its first network call,
//! - checks its precondition state before touching the network,
//! - commits a state transition only after every step settled.
//!
//! Funds spent by a step of an aborted operation are not recovered.

use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::advanced::builders::TransactionBuilder;
use crate::advanced::instructions;
use crate::basic::authority::{EphemeralKeypair, EphemeralMintAuthority};
use crate::basic::guard::InFlight;
use crate::basic::session::{WalletIdentity, WalletSession};
use crate::basic::state::{StateKind, TokenContext, WorkflowState};
use crate::config::LifecycleConfig;
use crate::core::connection::LedgerClient;
use crate::core::signer::WalletEnvironment;
use crate::error::{MintflowError, Result};
use crate::types::{LifecycleOperation, LifecycleReceipt, MintInfo};
use crate::utils;

pub struct TokenLifecycleOrchestrator<L: LedgerClient> {
    ledger: L,
    session: WalletSession,
    config: LifecycleConfig,
    commitment: CommitmentConfig,
    recipient: Pubkey,
    workflow: Mutex<WorkflowState>,
    in_flight: InFlight,
    authority_uses: AtomicU64,
}

impl<L: LedgerClient> TokenLifecycleOrchestrator<L> {
    pub fn new(
        ledger: L,
        environment: Arc<dyn WalletEnvironment>,
        config: LifecycleConfig,
    ) -> Result<Self> {
        config.validate()?;
        let commitment = config.commitment_config()?;
        let recipient = config.recipient()?;

        Ok(Self {
            ledger,
            session: WalletSession::new(environment, config.connect_timeout()),
            config,
            commitment,
            recipient,
            workflow: Mutex::new(WorkflowState::Disconnected),
            in_flight: InFlight::new(),
            authority_uses: AtomicU64::new(0),
        })
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn state_kind(&self) -> StateKind {
        self.workflow().kind()
    }

    pub fn mint(&self) -> Option<Pubkey> {
        self.workflow().mint()
    }

    /// Public key of the saved mint authority. The secret half never leaves the orchestrator.
    pub fn mint_authority(&self) -> Option<Pubkey> {
        self.workflow().token().map(|token| token.authority.pubkey())
    }

    pub fn wallet(&self) -> Option<Pubkey> {
        self.session.identity().map(|identity| identity.pubkey())
    }

    pub fn is_supply_capped(&self) -> bool {
        self.workflow().is_supply_capped()
    }

    /// True while a lifecycle operation has not settled. UIs disable their controls on it.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// How many operations have drawn on the current mint authority, failed ones included.
    pub fn authority_uses(&self) -> u64 {
        self.authority_uses.load(Ordering::SeqCst)
    }

    /// Units of the created token held by `owner`.
    pub async fn token_balance(&self, owner: &Pubkey) -> Result<u64> {
        let mint = self.require_mint("token balance")?;
        utils::fetch_token_balance(&self.ledger, owner, &mint).await
    }

    /// On-chain view of the created mint.
    pub async fn mint_info(&self) -> Result<MintInfo> {
        let mint = self.require_mint("mint info")?;
        utils::fetch_mint_info(&self.ledger, &mint).await
    }

    //=========================================================================
    // Wallet session
    //=========================================================================

    pub async fn connect_wallet(&self) -> Result<Pubkey> {
        self.connect_wallet_until(std::future::pending()).await
    }

    /// Connect, giving up when `cancel` resolves before the wallet approves.
    pub async fn connect_wallet_until<F>(&self, cancel: F) -> Result<Pubkey>
    where
        F: Future<Output = ()> + Send,
    {
        let _lease = self.in_flight.try_acquire()?;
        self.workflow().require_disconnected("connect wallet")?;

        let identity = self.session.connect_until(cancel).await?;
        self.workflow().on_connected();
        Ok(identity.pubkey())
    }

    /// End the session. The mint identity and authority are forgotten.
    pub async fn disconnect_wallet(&self) -> Result<()> {
        let _lease = self.in_flight.try_acquire()?;
        self.session.disconnect().await;
        self.workflow().on_disconnected();
        self.authority_uses.store(0, Ordering::SeqCst);
        Ok(())
    }

    //=========================================================================
    // Lifecycle operations
    //=========================================================================

    /// Create the token and hand the initial supply to the connected wallet.
    pub async fn initial_mint(&self) -> Result<LifecycleReceipt> {
        let _lease = self.in_flight.try_acquire()?;
        self.workflow().require_connected("initial mint")?;
        let wallet = self.connected_wallet()?;
        let minting = MintingLease::begin(&self.workflow)?;

        match self.run_initial_mint(&wallet).await {
            Ok((token, receipt)) => {
                minting.finish(token);
                tracing::info!(
                    mint = %receipt.mint,
                    wallet = %wallet.pubkey(),
                    amount = receipt.amount,
                    "Token created"
                );
                Ok(receipt)
            },
            Err(e) => {
                drop(minting);
                tracing::warn!(operation = "initial mint", error = %e, "Lifecycle operation failed");
                Err(e)
            },
        }
    }

    /// Mint another batch with the saved authority and hand it to the wallet.
    pub async fn mint_again(&self) -> Result<LifecycleReceipt> {
        let _lease = self.in_flight.try_acquire()?;
        let token = self.workflow().require_operable("mint again")?;
        let wallet = self.connected_wallet()?;

        let result = self.run_mint_again(&token, &wallet).await;
        self.settle("mint again", result, false)
    }

    /// Move units from the wallet to the configured recipient. Signed by the wallet.
    pub async fn transfer(&self) -> Result<LifecycleReceipt> {
        let _lease = self.in_flight.try_acquire()?;
        let token = self.workflow().require_operable("transfer")?;
        let wallet = self.connected_wallet()?;

        let result = self.run_transfer(&token, &wallet).await;
        self.settle("transfer", result, false)
    }

    /// Revoke the mint authority. No further minting is possible afterwards.
    pub async fn cap_supply(&self) -> Result<LifecycleReceipt> {
        let _lease = self.in_flight.try_acquire()?;
        let token = self.workflow().require_operable("cap supply")?;

        let result = self.run_cap_supply(&token).await;
        self.settle("cap supply", result, true)
    }

    //=========================================================================
    // Steps
    //=========================================================================

    async fn run_initial_mint(
        &self,
        wallet: &WalletIdentity,
    ) -> Result<(TokenContext, LifecycleReceipt)> {
        let authority = EphemeralMintAuthority::generate();
        self.authority_uses.store(1, Ordering::SeqCst);
        let authority_key = authority.pubkey();
        let mut signatures = vec![self.fund(&authority_key).await?];

        let mint_keypair = Keypair::new();
        let mint = mint_keypair.pubkey();
        let rent = self
            .ledger
            .get_minimum_balance_for_rent_exemption(Mint::LEN)
            .await?;
        let create = TransactionBuilder::new(authority_key)
            .add_instructions(instructions::create_mint(
                &authority_key,
                &mint,
                &authority_key,
                self.config.decimals,
                rent,
            )?)
            .send_signed(&self.ledger, &[authority.keypair(), &mint_keypair], self.commitment)
            .await?;
        signatures.push(create);
        tracing::info!(%mint, authority = %authority_key, signature = %create, "Mint account created");

        let amount = self.config.initial_mint_amount;
        signatures.extend(
            self.mint_and_deliver(&authority, &mint, &wallet.pubkey(), amount)
                .await?,
        );

        let token = TokenContext {
            mint,
            authority: authority.export(),
        };
        let receipt = LifecycleReceipt {
            operation: LifecycleOperation::InitialMint,
            mint,
            amount,
            signatures,
        };
        Ok((token, receipt))
    }

    async fn run_mint_again(
        &self,
        token: &TokenContext,
        wallet: &WalletIdentity,
    ) -> Result<LifecycleReceipt> {
        let authority = self.restore_authority(token)?;
        let mut signatures = vec![self.fund(&authority.pubkey()).await?];

        let amount = self.config.mint_again_amount;
        signatures.extend(
            self.mint_and_deliver(&authority, &token.mint, &wallet.pubkey(), amount)
                .await?,
        );

        Ok(LifecycleReceipt {
            operation: LifecycleOperation::MintAgain,
            mint: token.mint,
            amount,
            signatures,
        })
    }

    async fn run_transfer(
        &self,
        token: &TokenContext,
        wallet: &WalletIdentity,
    ) -> Result<LifecycleReceipt> {
        let authority = self.restore_authority(token)?;
        let mut signatures = vec![self.fund(&authority.pubkey()).await?];

        let source = utils::get_or_create_associated_account(
            &self.ledger,
            authority.keypair(),
            &wallet.pubkey(),
            &token.mint,
            self.commitment,
        )
        .await?;
        let destination = utils::get_or_create_associated_account(
            &self.ledger,
            authority.keypair(),
            &self.recipient,
            &token.mint,
            self.commitment,
        )
        .await?;

        let amount = self.config.transfer_amount;
        let unsigned = TransactionBuilder::new(wallet.pubkey())
            .add_instruction(instructions::transfer(
                &source.address,
                &destination.address,
                &wallet.pubkey(),
                amount,
            )?)
            .build_unsigned(&self.ledger)
            .await?;
        let signed = self.session.sign_transaction(unsigned).await?;
        let signature = self.ledger.send_and_confirm(&signed, self.commitment).await?;
        signatures.push(signature);

        tracing::info!(
            mint = %token.mint,
            from = %wallet.pubkey(),
            to = %self.recipient,
            amount,
            %signature,
            "Wallet transfer settled"
        );

        Ok(LifecycleReceipt {
            operation: LifecycleOperation::Transfer,
            mint: token.mint,
            amount,
            signatures,
        })
    }

    async fn run_cap_supply(&self, token: &TokenContext) -> Result<LifecycleReceipt> {
        let authority = self.restore_authority(token)?;
        let mut signatures = vec![self.fund(&authority.pubkey()).await?];

        let signature = TransactionBuilder::new(authority.pubkey())
            .add_instruction(instructions::revoke_mint_authority(
                &token.mint,
                &authority.pubkey(),
            )?)
            .send_signed(&self.ledger, &[authority.keypair()], self.commitment)
            .await?;
        signatures.push(signature);

        tracing::info!(mint = %token.mint, %signature, "Mint authority revoked");

        Ok(LifecycleReceipt {
            operation: LifecycleOperation::CapSupply,
            mint: token.mint,
            amount: 0,
            signatures,
        })
    }

    /// Mint `amount` into the authority's own account, then move all of it to `recipient`.
    async fn mint_and_deliver(
        &self,
        authority: &EphemeralKeypair,
        mint: &Pubkey,
        recipient: &Pubkey,
        amount: u64,
    ) -> Result<Vec<Signature>> {
        let authority_key = authority.pubkey();

        let source = utils::get_or_create_associated_account(
            &self.ledger,
            authority.keypair(),
            &authority_key,
            mint,
            self.commitment,
        )
        .await?;
        let minted = TransactionBuilder::new(authority_key)
            .add_instruction(instructions::mint_to(
                mint,
                &source.address,
                &authority_key,
                amount,
            )?)
            .send_signed(&self.ledger, &[authority.keypair()], self.commitment)
            .await?;
        tracing::info!(%mint, amount, signature = %minted, "Units minted");

        let destination = utils::get_or_create_associated_account(
            &self.ledger,
            authority.keypair(),
            recipient,
            mint,
            self.commitment,
        )
        .await?;
        let delivered = TransactionBuilder::new(authority_key)
            .add_instruction(instructions::transfer(
                &source.address,
                &destination.address,
                &authority_key,
                amount,
            )?)
            .send_signed(&self.ledger, &[authority.keypair()], self.commitment)
            .await?;
        tracing::info!(%mint, %recipient, amount, signature = %delivered, "Units delivered");

        Ok(vec![minted, delivered])
    }

    async fn fund(&self, pubkey: &Pubkey) -> Result<Signature> {
        self.ledger
            .fund_account(pubkey, self.config.funding_lamports, self.commitment)
            .await
    }

    //=========================================================================
    // Helpers
    //=========================================================================

    fn settle(
        &self,
        operation: &'static str,
        result: Result<LifecycleReceipt>,
        caps_supply: bool,
    ) -> Result<LifecycleReceipt> {
        match result {
            Ok(receipt) => {
                self.workflow().record_operation(caps_supply);
                tracing::info!(
                    operation,
                    mint = %receipt.mint,
                    amount = receipt.amount,
                    transactions = receipt.signatures.len(),
                    "Lifecycle operation settled"
                );
                Ok(receipt)
            },
            Err(e) => {
                tracing::warn!(operation, error = %e, "Lifecycle operation failed");
                Err(e)
            },
        }
    }

    fn restore_authority(&self, token: &TokenContext) -> Result<EphemeralKeypair> {
        let authority = EphemeralMintAuthority::restore(&token.authority)?;
        self.authority_uses.fetch_add(1, Ordering::SeqCst);
        Ok(authority)
    }

    fn connected_wallet(&self) -> Result<WalletIdentity> {
        self.session
            .identity()
            .ok_or_else(|| MintflowError::SignerUnavailable("no wallet connected".to_string()))
    }

    fn require_mint(&self, operation: &'static str) -> Result<Pubkey> {
        let workflow = self.workflow();
        let mint = workflow.mint().ok_or(MintflowError::InvalidState {
            operation,
            state: workflow.kind(),
        });
        mint
    }

    fn workflow(&self) -> MutexGuard<'_, WorkflowState> {
        lock(&self.workflow)
    }
}

/// Holds the workflow in `Minting`. Dropping it unfinished (an error, or the
/// caller abandoning the future) returns the workflow to `Connected`.
struct MintingLease<'a> {
    workflow: &'a Mutex<WorkflowState>,
    finished: bool,
}

impl<'a> MintingLease<'a> {
    fn begin(workflow: &'a Mutex<WorkflowState>) -> Result<Self> {
        lock(workflow).begin_mint()?;
        Ok(Self {
            workflow,
            finished: false,
        })
    }

    fn finish(mut self, token: TokenContext) {
        lock(self.workflow).finish_mint(token);
        self.finished = true;
    }
}

impl Drop for MintingLease<'_> {
    fn drop(&mut self) {
        if !self.finished {
            lock(self.workflow).abort_mint();
        }
    }
}

fn lock(workflow: &Mutex<WorkflowState>) -> MutexGuard<'_, WorkflowState> {
    workflow
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
