pub mod auth;
pub mod coordinator;
pub mod error;
pub mod escrow;
pub mod fee;
pub mod instruction;
pub mod oracle;
pub mod store;

use solana_program::pubkey::Pubkey;

// Must match the keypair the escrow program is deployed with
solana_program::declare_id!("8K6AdQyPxjCfVoTZtAZW7TnQjhsJFjEdR5tzVWzESVvB");

/// Minimum escrow amount (0.1 SOL = 100,000,000 lamports).
pub const MIN_ESCROW_AMOUNT: u64 = 100_000_000;

/// Platform fee (2%) in basis points.
pub const PLATFORM_FEE_BPS: u16 = 200;

/// Platform wallet that collects fees.
pub const PLATFORM_WALLET: Pubkey =
    solana_program::pubkey!("GbLLTkUjCznwRrkLM6tewimmW6ZCC4AP8eF9yAD8e5qT");

pub use coordinator::{CoordinatorConfig, EscrowCoordinator};
pub use error::{CoordinatorError, ErrorKind};
