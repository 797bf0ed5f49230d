use anchor_lang::prelude::*;

#[error_code]
pub enum EscrowError {
    #[msg("Insufficient funds in the vault.")]
    InsufficientFunds,

    #[msg("Arithmetic overflow occurred.")]
    Overflow,

    #[msg("Arithmetic underflow occurred.")]
    Underflow,

    #[msg("Invalid escrow amount")]
    InvalidEscrowAmount,

    #[msg("Maximum submissions reached")]
    MaxSubmissionsReached,

    #[msg("Bounty id is too long")]
    BountyIdTooLong,

    #[msg("Bounty id does not match this escrow")]
    BountyIdMismatch,

    #[msg("Cannot deposit zero amount.")]
    ZeroDeposit,

    #[msg("Payment amount must be greater than zero")]
    InvalidPaymentAmount,
}
