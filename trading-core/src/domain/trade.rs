//! `TradeRecord` and the enums that tag it: `Business`, `Part`.

use super::cost::CostRecord;
use super::stock::Stock;
use super::time::Datetime;
use serde::{Deserialize, Serialize};

/// What kind of trade a `TradeRecord` represents. `None` means "no trade
/// occurred" — a placeholder some call sites return instead of `Option`,
/// matching spec.md §3's "`NONE` means 'no trade'".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Business {
    Buy,
    Sell,
    BuyShort,
    SellShort,
    Init,
    None,
}

impl Business {
    pub fn is_trade(&self) -> bool {
        !matches!(self, Business::None | Business::Init)
    }
}

/// Which subsystem originated a trade decision (GLOSSARY: "Part").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Part {
    BuySignal,
    SellSignal,
    Stoploss,
    TakeProfit,
    ProfitGoal,
    Environment,
    Condition,
    Portfolio,
    AllocateFunds,
    Other,
}

/// A single executed (or rejected) trade. Rejections are represented by a
/// `TradeRecord` with `business = Business::None` per spec.md §4.1.4, rather
/// than by `Option` — callers check `business.is_trade()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub datetime: Datetime,
    pub stock: Stock,
    pub business: Business,
    pub price: f64,
    pub number: f64,
    pub cost: CostRecord,
    pub plan_price: f64,
    pub stoploss: f64,
    pub goal_price: f64,
    pub real_price: f64,
    pub part: Part,
    /// Cash balance snapshot immediately after this trade.
    pub cash: f64,
    /// Position size snapshot immediately after this trade.
    pub position: f64,
}

impl TradeRecord {
    pub fn rejected(datetime: Datetime, stock: Stock, part: Part) -> Self {
        Self {
            datetime,
            stock,
            business: Business::None,
            price: 0.0,
            number: 0.0,
            cost: CostRecord::zero(),
            plan_price: 0.0,
            stoploss: 0.0,
            goal_price: 0.0,
            real_price: 0.0,
            part,
            cash: 0.0,
            position: 0.0,
        }
    }

    pub fn is_trade(&self) -> bool {
        self.business.is_trade()
    }
}
