use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

#[derive(Accounts)]
#[instruction(bounty_id: String)]
pub struct CloseBounty<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        has_one = owner,
        close = owner,
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

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<CloseBounty>, bounty_id: String) -> Result<()> {
    let remaining = ctx.accounts.vault.lamports();

    if remaining > 0 {
        let escrow_key = ctx.accounts.escrow.key();
        let vault_bump = ctx.accounts.escrow.vault_bump;
        let vault_seeds = &[VAULT_SEED, escrow_key.as_ref(), &[vault_bump]];

        // Return everything left in the vault to the owner
        anchor_lang::solana_program::program::invoke_signed(
            &anchor_lang::solana_program::system_instruction::transfer(
                ctx.accounts.vault.key,
                ctx.accounts.owner.key,
                remaining,
            ),
            &[
                ctx.accounts.vault.to_account_info(),
                ctx.accounts.owner.to_account_info(),
                ctx.accounts.system_program.to_account_info(),
            ],
            &[vault_seeds],
        )?;
    }

    emit!(BountyClosed {
        bounty_id,
        remaining_amount: remaining,
    });

    msg!("Bounty escrow closed, {} lamports returned", remaining);

    Ok(())
}
