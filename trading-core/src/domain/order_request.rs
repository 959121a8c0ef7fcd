//! `OrderRequest` — the deferred-order buffer, and `Direction`, its key.

use super::time::Datetime;
use super::trade::{Business, Part};
use serde::{Deserialize, Serialize};

/// Which of the four live order slots a request occupies (spec.md §3
/// invariant 3, and the REDESIGN FLAGS note: "best modelled as an array
/// indexed by (side, direction) to avoid code duplication").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    LongBuy,
    LongSell,
    ShortSell,
    ShortBuy,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::LongBuy,
        Direction::LongSell,
        Direction::ShortSell,
        Direction::ShortBuy,
    ];

    /// Index into the fixed-size order-request buffer array.
    pub fn slot(&self) -> usize {
        match self {
            Direction::LongBuy => 0,
            Direction::LongSell => 1,
            Direction::ShortSell => 2,
            Direction::ShortBuy => 3,
        }
    }

    pub fn business(&self) -> Business {
        match self {
            Direction::LongBuy => Business::Buy,
            Direction::LongSell => Business::Sell,
            Direction::ShortSell => Business::SellShort,
            Direction::ShortBuy => Business::BuyShort,
        }
    }
}

/// A decision awaiting execution on a later bar (spec.md §4.1.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub valid: bool,
    pub business: Business,
    pub from: Part,
    /// The bar on which the decision was made.
    pub datetime: Datetime,
    pub plan_price: f64,
    pub stoploss: f64,
    pub goal: f64,
    pub number: f64,
    /// Number of bars this request has attempted to execute, including the
    /// decision bar. Starts at 1 on submission (spec.md §4.1.2).
    pub count: u32,
}

impl OrderRequest {
    pub fn new(business: Business, from: Part, datetime: Datetime, plan_price: f64, stoploss: f64, goal: f64, number: f64) -> Self {
        Self {
            valid: true,
            business,
            from,
            datetime,
            plan_price,
            stoploss,
            goal,
            number,
            count: 1,
        }
    }

    pub fn is_expired(&self, max_delay_count: u32) -> bool {
        self.count > max_delay_count
    }
}
