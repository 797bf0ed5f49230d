use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_program::system_program;

use crate::escrow::{derive_escrow_address, derive_vault_address};

// Anchor instruction discriminators: the first 8 bytes of the instruction
// data, fixed per instruction name.
pub const INITIALIZE_DISCRIMINATOR: [u8; 8] = [175, 175, 109, 31, 13, 152, 155, 237];
pub const DEPOSIT_DISCRIMINATOR: [u8; 8] = [242, 35, 198, 137, 82, 225, 242, 182];
pub const PROCESS_PAYMENT_DISCRIMINATOR: [u8; 8] = [189, 81, 30, 198, 139, 186, 115, 23];
pub const CLOSE_BOUNTY_DISCRIMINATOR: [u8; 8] = [90, 33, 205, 110, 210, 22, 247, 49];

/// Everything `process_payment` needs; reward and submission-count fields are
/// read from the bounty record by the coordinator, not trusted from clients.
#[derive(Debug, Clone)]
pub struct PaymentParams {
    pub owner: Pubkey,
    pub hunter_wallet: Pubkey,
    pub platform_wallet: Pubkey,
    pub bounty_id: String,
    pub submission_id: String,
    pub custom_amount: Option<u64>,
    pub reward_per_submission: u64,
    pub max_submissions: u32,
    pub current_paid_submissions: u32,
}

/// Builds the `initialize` instruction.
///
/// Accounts:
/// 0. `[signer, writable]` Owner - the company wallet funding the escrow
/// 1. `[writable]` Escrow state account (PDA)
/// 2. `[writable]` Vault account (PDA) - receives the locked SOL
/// 3. `[]` System program
pub fn initialize_escrow(owner: &Pubkey, bounty_id: &str, escrow_amount: u64) -> Instruction {
    let (escrow, _) = derive_escrow_address(owner, bounty_id);
    let (vault, _) = derive_vault_address(&escrow);

    let mut data = INITIALIZE_DISCRIMINATOR.to_vec();
    put_str(&mut data, bounty_id);
    put_u64(&mut data, escrow_amount);

    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(escrow, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    }
}

/// Builds the `deposit` instruction.
///
/// Accounts: as `initialize`, with the escrow already existing.
pub fn deposit(owner: &Pubkey, bounty_id: &str, amount: u64) -> Instruction {
    let (escrow, _) = derive_escrow_address(owner, bounty_id);
    let (vault, _) = derive_vault_address(&escrow);

    let mut data = DEPOSIT_DISCRIMINATOR.to_vec();
    put_u64(&mut data, amount);

    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(escrow, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    }
}

/// Builds the `process_payment` instruction.
///
/// Accounts:
/// 0. `[signer, writable]` Owner - the company wallet releasing the payout
/// 1. `[writable]` Escrow state account (PDA)
/// 2. `[writable]` Vault account (PDA) - source of the payout
/// 3. `[writable]` Hunter wallet - receives the net amount
/// 4. `[writable]` Platform wallet - receives the fee
/// 5. `[]` System program
pub fn process_payment(params: &PaymentParams) -> Instruction {
    let (escrow, _) = derive_escrow_address(&params.owner, &params.bounty_id);
    let (vault, _) = derive_vault_address(&escrow);

    let mut data = PROCESS_PAYMENT_DISCRIMINATOR.to_vec();
    put_str(&mut data, &params.bounty_id);
    put_str(&mut data, &params.submission_id);
    put_opt_u64(&mut data, params.custom_amount);
    put_u64(&mut data, params.reward_per_submission);
    put_u32(&mut data, params.max_submissions);
    put_u32(&mut data, params.current_paid_submissions);

    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(params.owner, true),
            AccountMeta::new(escrow, false),
            AccountMeta::new(vault, false),
            AccountMeta::new(params.hunter_wallet, false),
            AccountMeta::new(params.platform_wallet, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    }
}

/// Builds the `close_bounty` instruction.
///
/// Accounts: as `initialize`; the vault is drained back to the owner and the
/// escrow state account is closed.
pub fn close_bounty(owner: &Pubkey, bounty_id: &str) -> Instruction {
    let (escrow, _) = derive_escrow_address(owner, bounty_id);
    let (vault, _) = derive_vault_address(&escrow);

    let mut data = CLOSE_BOUNTY_DISCRIMINATOR.to_vec();
    put_str(&mut data, bounty_id);

    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(escrow, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    }
}

// Borsh wire format, written out by hand: strings are a u32 length prefix
// plus bytes, integers are little-endian, options are a one-byte tag.

fn put_str(data: &mut Vec<u8>, value: &str) {
    data.extend_from_slice(&(value.len() as u32).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
}

fn put_u64(data: &mut Vec<u8>, value: u64) {
    data.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(data: &mut Vec<u8>, value: u32) {
    data.extend_from_slice(&value.to_le_bytes());
}

fn put_opt_u64(data: &mut Vec<u8>, value: Option<u64>) {
    match value {
        Some(value) => {
            data.push(1);
            put_u64(data, value);
        }
        None => data.push(0),
    }
}
