//! Error types and handling for the fairspin engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error taxonomy
///
/// Local recovery is limited to transparent `NonceConflict` retries inside the
/// engine; every other variant propagates to the caller layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A secure random source could not be obtained. Fatal for the current
    /// operation; no commitment is opened.
    #[error("entropy unavailable: {0}")]
    EntropyUnavailable(String),

    /// Session lifecycle violation (reveal before end, malformed seed material).
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("session not found")]
    SessionNotFound,

    /// Spin attempted against an ended session.
    #[error("session closed")]
    SessionClosed,

    #[error("account not found")]
    AccountNotFound,

    #[error("invalid bet: {0}")]
    InvalidBet(String),

    /// Bet exceeds current balance. No state is mutated and no nonce is
    /// consumed when this is returned.
    #[error("insufficient funds: balance {balance}, bet {bet}")]
    InsufficientFunds { balance: u64, bet: u64 },

    /// Concurrent nonce reservation race detected by the storage layer's
    /// conditional advance. Retried transparently by the engine.
    #[error("nonce conflict")]
    NonceConflict,

    /// The storage layer could not commit the atomic debit/credit/record
    /// write. State is unchanged; the caller may retry.
    #[error("transaction failure: {0}")]
    TransactionFailure(String),

    #[error("invalid game config: {0}")]
    InvalidConfig(String),
}
