use anchor_lang::prelude::*;

use crate::constants::{BPS_DENOMINATOR, PLATFORM_FEE_BPS};
use crate::errors::EscrowError;

/// Split a gross payout into (platform_fee, hunter_amount).
/// Integer basis-point math only; the multiply is widened to u128 so it
/// cannot overflow for any u64 gross.
pub fn split_payment(gross: u64) -> Result<(u64, u64)> {
    let fee = (gross as u128)
        .checked_mul(PLATFORM_FEE_BPS as u128)
        .ok_or(error!(EscrowError::Overflow))?
        / (BPS_DENOMINATOR as u128);
    // fee <= gross, so the narrowing cast is lossless
    let fee = fee as u64;
    let net = gross.checked_sub(fee).ok_or(error!(EscrowError::Underflow))?;
    Ok((fee, net))
}
