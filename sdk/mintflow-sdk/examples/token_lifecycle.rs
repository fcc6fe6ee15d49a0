use anyhow::Result;
use mintflow_sdk::{
    load_config, LedgerClient, LifecycleConfig, LocalEnvironment, LocalWallet, RpcLedger,
    TokenLifecycleOrchestrator, WalletAdapter,
};
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Runs the whole lifecycle against devnet (or `MINTFLOW_RPC_URL`).
///
/// Usage: token_lifecycle [config.toml]
/// The wallet keypair is read from `MINTFLOW_WALLET`; a throwaway one is used otherwise.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mintflow_sdk=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => LifecycleConfig::default(),
    }
    .with_env_overrides();

    let keypair = match std::env::var("MINTFLOW_WALLET") {
        Ok(path) => read_keypair_file(&path)
            .map_err(|e| anyhow::anyhow!("reading wallet keypair {}: {}", path, e))?,
        Err(_) => Keypair::new(),
    };

    let ledger = RpcLedger::new(&config)?;
    let wallet = Arc::new(LocalWallet::new(keypair));
    let adapter: Arc<dyn WalletAdapter> = wallet.clone();
    let environment = Arc::new(LocalEnvironment::with_wallet(adapter));
    let orchestrator = TokenLifecycleOrchestrator::new(ledger, environment, config)?;

    let owner = orchestrator.connect_wallet().await?;
    println!("Wallet: {}", owner);

    // The wallet pays the transfer fee itself
    orchestrator
        .ledger()
        .fund_account(
            &wallet.pubkey(),
            orchestrator.config().funding_lamports,
            orchestrator.config().commitment_config()?,
        )
        .await?;

    let receipt = orchestrator.initial_mint().await?;
    println!("Mint: {}", receipt.mint);

    for receipt in [
        orchestrator.mint_again().await?,
        orchestrator.transfer().await?,
        orchestrator.cap_supply().await?,
    ] {
        if let Some(signature) = receipt.last_signature() {
            println!("{:?}: {}", receipt.operation, signature);
        }
    }

    println!(
        "Wallet balance: {} (supply capped: {})",
        orchestrator.token_balance(&owner).await?,
        orchestrator.mint_info().await?.is_supply_capped()
    );

    orchestrator.disconnect_wallet().await?;
    Ok(())
}
