use anchor_lang::prelude::*;

use crate::constants::MAX_BOUNTY_ID_LEN;

#[account]
pub struct BountyEscrow {
    pub owner: Pubkey,       // Funding company wallet
    pub bounty_id: String,   // Platform bounty identifier, also PDA seed material
    pub escrow_amount: u64,  // Bookkept lamport balance of the vault
    pub created_at: i64,     // Unix timestamp
    pub bump: u8,            // Escrow PDA bump
    pub vault_bump: u8,      // Vault PDA bump
}

impl BountyEscrow {
    pub fn space() -> usize {
        8 +                        // Discriminator
        32 +                       // owner: Pubkey
        4 + MAX_BOUNTY_ID_LEN +    // bounty_id: String
        8 +                        // escrow_amount: u64
        8 +                        // created_at: i64
        1 +                        // bump: u8
        1                          // vault_bump: u8
    }
}
