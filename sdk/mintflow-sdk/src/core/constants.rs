use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

// Default RPC endpoint (Devnet, where airdrops are available)
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Where users are sent when no compatible wallet is installed.
pub const WALLET_INSTALL_URL: &str = "https://www.phantom.app/";

/// Lamports requested for the signer before every lifecycle operation.
pub const DEFAULT_FUNDING_LAMPORTS: u64 = LAMPORTS_PER_SOL;

pub const TOKEN_DECIMALS: u8 = 6;

/// Base units minted and handed to the wallet by the initial mint.
pub const INITIAL_MINT_AMOUNT: u64 = 1_000_000;

/// Base units minted and handed to the wallet by every "mint again".
pub const MINT_AGAIN_AMOUNT: u64 = 100_000_000;

/// Base units moved from the wallet to the recipient by a transfer.
pub const TRANSFER_AMOUNT: u64 = 10_000_000;

/// Fixed recipient of wallet-signed transfers.
pub const DEFAULT_RECIPIENT: Pubkey = pubkey!("G7xeABm6JhWsxPkge2dNadMe9PYh4ev9jk8MSPx6yogD");
