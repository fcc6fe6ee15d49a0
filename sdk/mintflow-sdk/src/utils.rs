use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use spl_associated_token_account_client::address::get_associated_token_address_with_program_id;
use spl_token::solana_program::program_option::COption;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::{Account as TokenAccount, Mint};

use crate::advanced::builders::TransactionBuilder;
use crate::advanced::instructions;
use crate::core::connection::LedgerClient;
use crate::error::{MintflowError, Result};
use crate::types::{AssociatedAccountRef, MintInfo};

//=============================================================================
// Address Derivation Helpers
//=============================================================================

/// Derive `owner`'s associated token account for `mint`
pub fn derive_associated_account(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(owner, mint, &spl_token::id())
}

//=============================================================================
// Account Fetching & Parsing
//=============================================================================

/// Parse an SPL token account
pub fn parse_token_account(data: &[u8]) -> Result<TokenAccount> {
    TokenAccount::unpack(data).map_err(|e| {
        MintflowError::InvalidAccountData(format!("Failed to parse token account: {:?}", e))
    })
}

/// Parse an SPL mint account
pub fn parse_mint(address: &Pubkey, data: &[u8]) -> Result<MintInfo> {
    let mint = Mint::unpack(data).map_err(|e| {
        MintflowError::InvalidAccountData(format!("Failed to parse mint: {:?}", e))
    })?;

    Ok(MintInfo {
        address: *address,
        mint_authority: match mint.mint_authority {
            COption::Some(authority) => Some(authority),
            COption::None => None,
        },
        supply: mint.supply,
        decimals: mint.decimals,
    })
}

/// Fetch and parse a mint from the ledger
pub async fn fetch_mint_info(connection: &impl LedgerClient, mint: &Pubkey) -> Result<MintInfo> {
    let account = connection
        .get_account(mint)
        .await?
        .ok_or(MintflowError::AccountNotFound(*mint))?;

    parse_mint(mint, &account.data)
}

/// Units of `mint` held in `owner`'s associated account; zero if the account does not exist yet
pub async fn fetch_token_balance(
    connection: &impl LedgerClient,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<u64> {
    let address = derive_associated_account(owner, mint);
    match connection.get_account(&address).await? {
        Some(account) => Ok(parse_token_account(&account.data)?.amount),
        None => Ok(0),
    }
}

//=============================================================================
// Create-or-fetch
//=============================================================================

/// Look up `owner`'s associated account for `mint`, creating it with `payer` if absent
pub async fn get_or_create_associated_account(
    connection: &impl LedgerClient,
    payer: &Keypair,
    owner: &Pubkey,
    mint: &Pubkey,
    commitment: CommitmentConfig,
) -> Result<AssociatedAccountRef> {
    let address = derive_associated_account(owner, mint);

    if let Some(account) = connection.get_account(&address).await? {
        let parsed = parse_token_account(&account.data)?;
        if parsed.mint != *mint || parsed.owner != *owner {
            return Err(MintflowError::InvalidAccountData(format!(
                "{} is not the associated account of {} for {}",
                address, owner, mint
            )));
        }
        return Ok(AssociatedAccountRef {
            address,
            owner: *owner,
            mint: *mint,
            created: false,
        });
    }

    let signature = TransactionBuilder::new(payer.pubkey())
        .add_instruction(instructions::create_associated_account(
            &payer.pubkey(),
            owner,
            mint,
        ))
        .send_signed(connection, &[payer], commitment)
        .await?;

    tracing::debug!(%owner, %mint, account = %address, %signature, "Associated account created");

    Ok(AssociatedAccountRef {
        address,
        owner: *owner,
        mint: *mint,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn associated_account_is_deterministic() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        assert_eq!(
            derive_associated_account(&owner, &mint),
            derive_associated_account(&owner, &mint)
        );
        assert_ne!(
            derive_associated_account(&owner, &mint),
            derive_associated_account(&mint, &owner)
        );
    }

    #[test]
    fn parse_mint_reports_capped_supply() {
        let address = Pubkey::new_unique();
        let mut data = vec![0u8; Mint::LEN];
        Mint::pack(
            Mint {
                mint_authority: COption::None,
                supply: 42,
                decimals: 6,
                is_initialized: true,
                freeze_authority: COption::None,
            },
            &mut data,
        )
        .unwrap();

        let info = parse_mint(&address, &data).unwrap();
        assert!(info.is_supply_capped());
        assert_eq!(info.supply, 42);
        assert_eq!(info.decimals, 6);
    }

    #[test]
    fn parse_token_account_rejects_garbage() {
        assert!(matches!(
            parse_token_account(&[1, 2, 3]),
            Err(MintflowError::InvalidAccountData(_))
        ));
    }
}
