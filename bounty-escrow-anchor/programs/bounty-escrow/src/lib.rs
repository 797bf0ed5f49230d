#![allow(clippy::result_large_err)]

use anchor_lang::prelude::*;

mod constants;
mod errors;
mod events;
mod helpers;
mod instructions;
mod state;

pub use constants::*;
pub use errors::*;
pub use events::*;
pub use helpers::*;
pub use instructions::*;
pub use state::*;

declare_id!("8K6AdQyPxjCfVoTZtAZW7TnQjhsJFjEdR5tzVWzESVvB");

#[program]
pub mod bounty_escrow {
    use super::*;

    /// Initializes a new bounty escrow.
    /// Companies deposit funds into escrow for bounty payouts.
    pub fn initialize(
        ctx: Context<Initialize>,
        bounty_id: String,
        escrow_amount: u64,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, bounty_id, escrow_amount)
    }

    /// Deposits additional funds into an existing bounty escrow.
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        instructions::deposit::handler(ctx, amount)
    }

    /// Processes payment for an approved submission.
    /// Pays the bounty hunter and deducts the platform fee.
    /// Reward and submission-count parameters are provided by the backend.
    pub fn process_payment(
        ctx: Context<ProcessPayment>,
        bounty_id: String,
        submission_id: String,
        custom_amount: Option<u64>,
        reward_per_submission: u64,
        max_submissions: u32,
        current_paid_submissions: u32,
    ) -> Result<()> {
        instructions::process_payment::handler(
            ctx,
            bounty_id,
            submission_id,
            custom_amount,
            reward_per_submission,
            max_submissions,
            current_paid_submissions,
        )
    }

    /// Closes the bounty and returns remaining funds to the owner.
    pub fn close_bounty(ctx: Context<CloseBounty>, bounty_id: String) -> Result<()> {
        instructions::close_bounty::handler(ctx, bounty_id)
    }
}
