use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;

use crate::error::CoordinatorError;
use crate::escrow::EscrowAccount;

/// Solana transaction signatures are 88 characters in base58.
pub const TX_SIGNATURE_LEN: usize = 88;

/// Outcome of a confirmation query. `Pending` and `NotFound` are retryable;
/// `Failed` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    Confirmed { slot: u64 },
    Pending,
    Failed { reason: String },
    NotFound,
}

impl TxStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TxStatus::Confirmed { .. })
    }
}

/// Read-and-submit interface over the chain, injected into the coordinator so
/// tests can substitute a fake. Implementations report transport failures as
/// `RpcUnavailable`; the coordinator owns the retry policy.
pub trait ChainClient {
    /// Lamport balance of an arbitrary account.
    fn get_balance(&self, address: &Pubkey) -> Result<u64, CoordinatorError>;

    /// Decoded escrow state, or None when the account does not exist.
    fn get_escrow_account(
        &self,
        escrow: &Pubkey,
    ) -> Result<Option<EscrowAccount>, CoordinatorError>;

    /// Finalization status of a previously submitted transaction.
    fn verify_transaction(&self, signature: &str) -> Result<TxStatus, CoordinatorError>;

    /// Signs and submits a single instruction, returning the transaction
    /// signature. Which key signs (custodial, delegated, or session-based)
    /// is the implementation's concern.
    fn submit_instruction(&self, instruction: &Instruction) -> Result<String, CoordinatorError>;
}

/// Validates the wire format of a transaction signature before any network
/// call is made on its behalf.
pub fn validate_tx_signature(signature: &str) -> Result<(), CoordinatorError> {
    if signature.len() != TX_SIGNATURE_LEN {
        return Err(CoordinatorError::InvalidSignature(
            "must be exactly 88 characters",
        ));
    }
    if !signature.chars().all(is_base58_char) {
        return Err(CoordinatorError::InvalidSignature(
            "contains non-base58 characters",
        ));
    }
    Ok(())
}

fn is_base58_char(c: char) -> bool {
    matches!(c, '1'..='9' | 'A'..='H' | 'J'..='N' | 'P'..='Z' | 'a'..='k' | 'm'..='z')
}
