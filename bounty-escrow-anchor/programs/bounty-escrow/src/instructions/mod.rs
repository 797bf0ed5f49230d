pub mod close_bounty;
pub mod deposit;
pub mod initialize;
pub mod process_payment;

// Re-export structs (and anchor-generated client-account modules) for cleaner imports
pub use close_bounty::*;
pub use deposit::*;
pub use initialize::*;
pub use process_payment::*;
