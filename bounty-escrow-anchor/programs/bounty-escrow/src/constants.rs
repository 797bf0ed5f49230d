pub const ESCROW_SEED: &[u8] = b"bounty-escrow";
pub const VAULT_SEED: &[u8] = b"vault";

/// Minimum escrow funding (0.1 SOL).
pub const MIN_ESCROW_AMOUNT: u64 = 100_000_000;

/// Platform fee in basis points (2%).
pub const PLATFORM_FEE_BPS: u64 = 200;
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Bounty identifiers double as PDA seed material, capped at one seed's width.
pub const MAX_BOUNTY_ID_LEN: usize = 32;
