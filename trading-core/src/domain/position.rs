//! `PositionRecord` — a held position in one instrument.

use super::stock::Stock;
use super::time::Datetime;
use serde::{Deserialize, Serialize};

/// An open holding. `number == 0` means flat (spec.md §3). Long positions
/// carry `number > 0`; short positions (when `support_borrow_stock` is
/// enabled) carry `number > 0` too — direction is tracked by which side of
/// the `TradeManager`'s ledger the position lives on, not by sign, matching
/// `TradeManager::get_position` / `get_short_position` being distinct calls
/// (spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub stock: Stock,
    pub entry_datetime: Datetime,
    pub number: f64,
    pub avg_cost: f64,
    pub stoploss: f64,
    pub goal_price: f64,
    pub total_risk: f64,
}

impl PositionRecord {
    pub fn flat(stock: Stock) -> Self {
        Self {
            stock,
            entry_datetime: Datetime::min_value(),
            number: 0.0,
            avg_cost: 0.0,
            stoploss: 0.0,
            goal_price: 0.0,
            total_risk: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.number == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_position_has_zero_number() {
        let p = PositionRecord::flat(Stock::new("000001", 100.0, 1_000_000.0, 0.01, 1.0));
        assert!(p.is_flat());
    }
}
