use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

/// Associated token account for one (owner, mint) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociatedAccountRef {
    /// Derived account address
    pub address: Pubkey,

    /// Wallet that owns the units held here
    pub owner: Pubkey,

    pub mint: Pubkey,

    /// Whether this lookup had to create the account
    pub created: bool,
}

/// Parsed mint account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintInfo {
    pub address: Pubkey,

    /// Current minting authority; `None` once supply is capped
    pub mint_authority: Option<Pubkey>,

    pub supply: u64,

    pub decimals: u8,
}

impl MintInfo {
    pub fn is_supply_capped(&self) -> bool {
        self.mint_authority.is_none()
    }
}

/// Which lifecycle operation produced a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOperation {
    InitialMint,
    MintAgain,
    Transfer,
    CapSupply,
}

/// Outcome of a settled lifecycle operation
#[derive(Debug, Clone)]
pub struct LifecycleReceipt {
    pub operation: LifecycleOperation,

    pub mint: Pubkey,

    /// Base units minted or moved (0 for CapSupply)
    pub amount: u64,

    /// Funding, mint and transfer signatures in submission order. Associated account
    /// creation is not listed.
    pub signatures: Vec<Signature>,
}

impl LifecycleReceipt {
    /// Signature of the operation's final transaction
    pub fn last_signature(&self) -> Option<&Signature> {
        self.signatures.last()
    }
}
