//! Plugin contracts consumed by the trading system (spec.md §6).
//!
//! Every trait is `CloneBoxed` — a `clone_box(&self) -> Box<dyn Trait>`
//! method backing a blanket `Clone for Box<dyn Trait>` impl — so that
//! `TradingSystem::clone()` can deep-copy its entire plugin tree (spec.md §5:
//! "Clones produce deep copies of all plugin trees").

mod condition;
mod cost_model;
mod environment;
pub mod fixtures;
mod money_manager;
mod profit_goal;
mod signal;
mod slippage;
mod stoploss;
mod trade_manager;

pub use condition::Condition;
pub use cost_model::CostModel;
pub use environment::Environment;
pub use money_manager::MoneyManager;
pub use profit_goal::ProfitGoal;
pub use signal::Signal;
pub use slippage::Slippage;
pub use stoploss::{Stoploss, TakeProfit};
pub use trade_manager::TradeManager;
