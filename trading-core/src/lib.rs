//! Trading Core — domain types, plugin contracts, and the per-bar trading
//! system state machine.
//!
//! This crate contains:
//! - Domain types (bars, orders, positions, trades, instruments, time)
//! - Plugin trait contracts (environment, condition, signal, stoploss,
//!   take-profit, profit goal, money manager, slippage, cost model, trade
//!   manager) plus a set of reference fixture implementations
//! - The `TradingSystem` bar-by-bar state machine
//! - Structured configuration and error types

pub mod domain;
pub mod error;
pub mod plugins;
pub mod system;
