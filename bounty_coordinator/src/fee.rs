use crate::error::CoordinatorError;

pub const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub fee: u64,
    pub net: u64,
}

/// Splits a gross lamport amount into platform fee and net payout.
/// Integer basis-point math only; the multiply is widened to u128 so it
/// cannot overflow, and `fee + net == gross` holds exactly.
pub fn compute_fee(gross: u64, fee_bps: u16) -> Result<FeeBreakdown, CoordinatorError> {
    if u64::from(fee_bps) > BPS_DENOMINATOR {
        return Err(CoordinatorError::InvalidAmount("fee rate above 100%"));
    }
    let fee = (u128::from(gross) * u128::from(fee_bps) / u128::from(BPS_DENOMINATOR)) as u64;
    Ok(FeeBreakdown {
        fee,
        net: gross - fee,
    })
}
