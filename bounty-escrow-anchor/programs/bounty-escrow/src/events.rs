use anchor_lang::prelude::*;

#[event]
pub struct EscrowInitialized {
    pub escrow: Pubkey,
    pub owner: Pubkey,
    pub bounty_id: String,
    pub amount: u64,
    pub timestamp: i64,
}

#[event]
pub struct FundsDeposited {
    pub escrow: Pubkey,
    pub depositor: Pubkey,
    pub amount: u64,
    pub new_balance: u64,
    pub timestamp: i64,
}

#[event]
pub struct PaymentProcessed {
    pub bounty_id: String,
    pub submission_id: String,
    pub hunter_wallet: Pubkey,
    pub amount: u64,
    pub platform_fee: u64,
}

#[event]
pub struct BountyClosed {
    pub bounty_id: String,
    pub remaining_amount: u64,
}
