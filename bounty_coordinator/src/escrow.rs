use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::CoordinatorError;

/// Seeds: ["bounty-escrow", owner, bounty_id] for the state account,
/// ["vault", escrow] for the lamport vault it controls.
pub const ESCROW_SEED: &[u8] = b"bounty-escrow";
pub const VAULT_SEED: &[u8] = b"vault";

/// Bounty identifiers double as PDA seed material, capped at one seed's width.
pub const MAX_BOUNTY_ID_LEN: usize = 32;

const DISCRIMINATOR_LEN: usize = 8;

pub fn parse_wallet(address: &str) -> Result<Pubkey, CoordinatorError> {
    Pubkey::from_str(address).map_err(|_| CoordinatorError::InvalidAddress(address.to_string()))
}

/// Derives the escrow state account address for a funder and bounty.
/// Pure function of the program id and seeds; no network call.
pub fn derive_escrow_address(owner: &Pubkey, bounty_id: &str) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[ESCROW_SEED, owner.as_ref(), bounty_id.as_bytes()],
        &crate::ID,
    )
}

/// Derives the vault that holds the escrowed lamports for an escrow account.
pub fn derive_vault_address(escrow: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, escrow.as_ref()], &crate::ID)
}

/// Mirror of the on-chain escrow account body (everything after the 8-byte
/// Anchor discriminator).
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EscrowAccount {
    pub owner: Pubkey,
    pub bounty_id: String,
    pub escrow_amount: u64,
    pub created_at: i64,
    pub bump: u8,
    pub vault_bump: u8,
}

impl EscrowAccount {
    /// Decodes raw account data fetched over RPC. Callers must already have
    /// checked that the account is owned by the escrow program; an account
    /// owned by anything else is not an escrow no matter what its bytes say.
    pub fn from_account_data(data: &[u8]) -> Result<Self, CoordinatorError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(CoordinatorError::MalformedAccountData);
        }
        let mut body = &data[DISCRIMINATOR_LEN..];
        EscrowAccount::deserialize(&mut body).map_err(|_| CoordinatorError::MalformedAccountData)
    }
}
