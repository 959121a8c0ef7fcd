//! Error types for `trading-core` (spec.md §7 classes 1–3).
//!
//! Mirrors the teacher's `DataError` (`trendlab-core/src/data/provider.rs`):
//! a `thiserror::Error` enum with one `#[error("...")]` variant per failure
//! mode, surfaced to the caller as a `Result`.

use thiserror::Error;

/// Class 1 errors (spec.md §7): an invalid parameter key/type passed to
/// `TradingSystem::set_param`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("parameter {name} expects a {expected} value")]
    WrongValueType { name: String, expected: &'static str },
}

/// Class 1 errors (spec.md §7): `readyForRun()` failed because a required
/// plugin is missing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReadyError {
    #[error("no TradeManager bound")]
    MissingTradeManager,

    #[error("no MoneyManager bound")]
    MissingMoneyManager,

    #[error("no Signal bound")]
    MissingSignal,
}
