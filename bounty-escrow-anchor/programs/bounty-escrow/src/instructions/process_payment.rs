use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, helpers::split_payment, state::*};

#[derive(Accounts)]
#[instruction(bounty_id: String, submission_id: String)]
pub struct ProcessPayment<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        has_one = owner,
        seeds = [
            ESCROW_SEED,
            escrow.owner.as_ref(),
            escrow.bounty_id.as_bytes()
        ],
        bump = escrow.bump,
        constraint = escrow.bounty_id == bounty_id @ EscrowError::BountyIdMismatch,
    )]
    pub escrow: Account<'info, BountyEscrow>,

    #[account(
        mut,
        seeds = [
            VAULT_SEED,
            escrow.key().as_ref()
        ],
        bump = escrow.vault_bump
    )]
    /// CHECK: Data-less system account that holds the escrowed lamports
    pub vault: AccountInfo<'info>,

    /// CHECK: Receives the net payout; matched to the approved submission off-chain
    #[account(mut)]
    pub hunter_wallet: AccountInfo<'info>,

    /// CHECK: Receives the platform fee
    #[account(mut)]
    pub platform_wallet: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<ProcessPayment>,
    bounty_id: String,
    submission_id: String,
    custom_amount: Option<u64>,
    reward_per_submission: u64,
    max_submissions: u32,
    current_paid_submissions: u32,
) -> Result<()> {
    require!(
        current_paid_submissions < max_submissions,
        EscrowError::MaxSubmissionsReached
    );

    let gross = custom_amount.unwrap_or(reward_per_submission);
    require!(gross > 0, EscrowError::InvalidPaymentAmount);
    require!(
        ctx.accounts.escrow.escrow_amount >= gross,
        EscrowError::InsufficientFunds
    );
    require!(
        ctx.accounts.vault.lamports() >= gross,
        EscrowError::InsufficientFunds
    );

    let (platform_fee, hunter_amount) = split_payment(gross)?;

    let escrow_key = ctx.accounts.escrow.key();
    let vault_bump = ctx.accounts.escrow.vault_bump;
    let vault_seeds = &[VAULT_SEED, escrow_key.as_ref(), &[vault_bump]];

    // Pay the hunter from the vault
    anchor_lang::solana_program::program::invoke_signed(
        &anchor_lang::solana_program::system_instruction::transfer(
            ctx.accounts.vault.key,
            ctx.accounts.hunter_wallet.key,
            hunter_amount,
        ),
        &[
            ctx.accounts.vault.to_account_info(),
            ctx.accounts.hunter_wallet.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
        &[vault_seeds],
    )?;

    // Collect the platform fee in the same transaction
    if platform_fee > 0 {
        anchor_lang::solana_program::program::invoke_signed(
            &anchor_lang::solana_program::system_instruction::transfer(
                ctx.accounts.vault.key,
                ctx.accounts.platform_wallet.key,
                platform_fee,
            ),
            &[
                ctx.accounts.vault.to_account_info(),
                ctx.accounts.platform_wallet.to_account_info(),
                ctx.accounts.system_program.to_account_info(),
            ],
            &[vault_seeds],
        )?;
    }

    let escrow = &mut ctx.accounts.escrow;
    escrow.escrow_amount = escrow
        .escrow_amount
        .checked_sub(gross)
        .ok_or(error!(EscrowError::Underflow))?;

    emit!(PaymentProcessed {
        bounty_id,
        submission_id,
        hunter_wallet: ctx.accounts.hunter_wallet.key(),
        amount: hunter_amount,
        platform_fee,
    });

    msg!(
        "Paid {} lamports to hunter {} ({} lamports platform fee)",
        hunter_amount,
        ctx.accounts.hunter_wallet.key,
        platform_fee
    );

    Ok(())
}
