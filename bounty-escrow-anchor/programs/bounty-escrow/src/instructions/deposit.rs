use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

#[derive(Accounts)]
pub struct Deposit<'info> {
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
        bump = escrow.bump
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

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    require!(amount > 0, EscrowError::ZeroDeposit);

    let owner = &ctx.accounts.owner;
    let vault = &ctx.accounts.vault;

    let transfer_ix = anchor_lang::solana_program::system_instruction::transfer(
        owner.key,
        vault.key,
        amount,
    );

    anchor_lang::solana_program::program::invoke(
        &transfer_ix,
        &[
            owner.to_account_info(),
            vault.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
    )?;

    let escrow = &mut ctx.accounts.escrow;
    escrow.escrow_amount = escrow
        .escrow_amount
        .checked_add(amount)
        .ok_or(error!(EscrowError::Overflow))?;

    emit!(FundsDeposited {
        escrow: escrow.key(),
        depositor: *owner.key,
        amount,
        new_balance: escrow.escrow_amount,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Deposited {} lamports into escrow", amount);

    Ok(())
}
