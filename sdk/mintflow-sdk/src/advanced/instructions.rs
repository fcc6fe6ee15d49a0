use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction;
use spl_associated_token_account_client::instruction::create_associated_token_account_idempotent;
use spl_token::instruction::AuthorityType;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;

use crate::error::Result;

/// Allocate a rent-exempt mint account and initialize it.
/// `mint` must sign alongside `payer`. No freeze authority is set.
pub fn create_mint(
    payer: &Pubkey,
    mint: &Pubkey,
    mint_authority: &Pubkey,
    decimals: u8,
    rent_lamports: u64,
) -> Result<Vec<Instruction>> {
    let allocate = system_instruction::create_account(
        payer,
        mint,
        rent_lamports,
        Mint::LEN as u64,
        &spl_token::id(),
    );
    let initialize =
        spl_token::instruction::initialize_mint2(&spl_token::id(), mint, mint_authority, None, decimals)?;

    Ok(vec![allocate, initialize])
}

/// Create `owner`'s associated account for `mint`. A no-op on chain if it already exists.
pub fn create_associated_account(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    create_associated_token_account_idempotent(payer, owner, mint, &spl_token::id())
}

pub fn mint_to(
    mint: &Pubkey,
    destination: &Pubkey,
    mint_authority: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    Ok(spl_token::instruction::mint_to(
        &spl_token::id(),
        mint,
        destination,
        mint_authority,
        &[],
        amount,
    )?)
}

pub fn transfer(
    source: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    Ok(spl_token::instruction::transfer(
        &spl_token::id(),
        source,
        destination,
        owner,
        &[],
        amount,
    )?)
}

/// Set the mint's minting authority to none. Irreversible once executed.
pub fn revoke_mint_authority(mint: &Pubkey, current_authority: &Pubkey) -> Result<Instruction> {
    Ok(spl_token::instruction::set_authority(
        &spl_token::id(),
        mint,
        None,
        AuthorityType::MintTokens,
        current_authority,
        &[],
    )?)
}
