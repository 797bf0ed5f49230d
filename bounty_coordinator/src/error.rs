use thiserror::Error;

use crate::store::{BountyStatus, EscrowState, PaymentStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction signature: {0}")]
    InvalidSignature(&'static str),

    #[error("escrow amount {amount} is below the {minimum} lamport minimum")]
    BelowMinimumEscrow { amount: u64, minimum: u64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),

    #[error("bounty id is too long")]
    BountyIdTooLong,

    #[error("malformed escrow account data")]
    MalformedAccountData,

    #[error("bounty {0} not found")]
    BountyNotFound(String),

    #[error("company {0} not found")]
    CompanyNotFound(String),

    #[error("payment {0} not found")]
    PaymentNotFound(String),

    #[error("caller is not allowed to {0}")]
    Unauthorized(&'static str),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("bounty {bounty_id} is {actual:?}, expected {expected:?}")]
    WrongBountyStatus {
        bounty_id: String,
        actual: BountyStatus,
        expected: BountyStatus,
    },

    #[error("escrow for bounty {0} is not initialized")]
    EscrowNotInitialized(String),

    #[error("escrow address does not match bounty {0}")]
    EscrowMismatch(String),

    #[error("escrow for bounty {bounty_id} is {actual:?}")]
    EscrowStateConflict {
        bounty_id: String,
        actual: EscrowState,
    },

    #[error("payment {payment_id} is already {actual:?}")]
    PaymentStateConflict {
        payment_id: String,
        actual: PaymentStatus,
    },

    #[error("payment already processed for submission {0}")]
    PaymentAlreadyProcessed(String),

    #[error("maximum paid submissions reached for bounty {0}")]
    MaxSubmissionsReached(String),

    #[error("transaction {0} is not confirmed on-chain")]
    UnconfirmedTransaction(String),

    #[error("transaction {signature} failed on-chain: {reason}")]
    TransactionFailed { signature: String, reason: String },

    #[error("rpc unavailable: {0}")]
    RpcUnavailable(String),
}

/// Coarse classification used by the web tier to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    Conflict,
    Unavailable,
}

impl ErrorKind {
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Authorization => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::Unavailable => 503,
        }
    }
}

impl CoordinatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::InvalidAddress(_)
            | CoordinatorError::InvalidSignature(_)
            | CoordinatorError::BelowMinimumEscrow { .. }
            | CoordinatorError::InvalidAmount(_)
            | CoordinatorError::BountyIdTooLong
            | CoordinatorError::MalformedAccountData
            | CoordinatorError::InsufficientFunds { .. }
            | CoordinatorError::WrongBountyStatus { .. }
            | CoordinatorError::EscrowNotInitialized(_)
            | CoordinatorError::EscrowMismatch(_)
            | CoordinatorError::PaymentAlreadyProcessed(_)
            | CoordinatorError::MaxSubmissionsReached(_)
            | CoordinatorError::UnconfirmedTransaction(_)
            | CoordinatorError::TransactionFailed { .. } => ErrorKind::Validation,

            CoordinatorError::BountyNotFound(_)
            | CoordinatorError::CompanyNotFound(_)
            | CoordinatorError::PaymentNotFound(_) => ErrorKind::NotFound,

            CoordinatorError::Unauthorized(_) => ErrorKind::Authorization,

            CoordinatorError::EscrowStateConflict { .. }
            | CoordinatorError::PaymentStateConflict { .. } => ErrorKind::Conflict,

            CoordinatorError::RpcUnavailable(_) => ErrorKind::Unavailable,
        }
    }

    /// Only transport failures are worth retrying; everything else is a
    /// definitive answer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoordinatorError::RpcUnavailable(_))
    }
}
