use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

#[derive(Accounts)]
#[instruction(bounty_id: String, escrow_amount: u64)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        init,
        payer = owner,
        space = BountyEscrow::space(),
        seeds = [
            ESCROW_SEED,
            owner.key().as_ref(),
            bounty_id.as_bytes()
        ],
        bump
    )]
    pub escrow: Account<'info, BountyEscrow>,

    #[account(
        mut,
        seeds = [
            VAULT_SEED,
            escrow.key().as_ref()
        ],
        bump
    )]
    /// CHECK: Data-less system account that holds the escrowed lamports
    pub vault: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, bounty_id: String, escrow_amount: u64) -> Result<()> {
    require!(
        bounty_id.len() <= MAX_BOUNTY_ID_LEN,
        EscrowError::BountyIdTooLong
    );
    require!(
        escrow_amount >= MIN_ESCROW_AMOUNT,
        EscrowError::InvalidEscrowAmount
    );

    let owner = &ctx.accounts.owner;
    let vault = &ctx.accounts.vault;

    // Transfer the initial funding from the owner into the vault
    let transfer_ix = anchor_lang::solana_program::system_instruction::transfer(
        owner.key,
        vault.key,
        escrow_amount,
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
    escrow.owner = *owner.key;
    escrow.bounty_id = bounty_id.clone();
    escrow.escrow_amount = escrow_amount;
    escrow.created_at = Clock::get()?.unix_timestamp;
    escrow.bump = ctx.bumps.escrow;
    escrow.vault_bump = ctx.bumps.vault;

    emit!(EscrowInitialized {
        escrow: escrow.key(),
        owner: escrow.owner,
        bounty_id,
        amount: escrow_amount,
        timestamp: escrow.created_at,
    });

    msg!(
        "Escrow initialized by {} with {} lamports",
        owner.key,
        escrow_amount
    );

    Ok(())
}
