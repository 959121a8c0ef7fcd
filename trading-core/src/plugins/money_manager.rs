//! `MoneyManager` plugin contract (spec.md §6): position sizing.
//!
//! `get_buy_num`/`get_sell_num` return the unrounded desired quantity; the
//! `TradingSystem` is responsible for the lot rounding of invariant 4 — the
//! money manager only answers "how much would you like, ignoring lot size".

use crate::domain::{Datetime, KRecord, Part, Stock, TradeRecord};

pub trait MoneyManager: Send + Sync {
    /// `risk` is `price - stoploss` for a long entry (the per-share amount
    /// at stake); 0 means "do not enter".
    fn get_buy_num(&self, datetime: Datetime, stock: &Stock, price: f64, risk: f64, from: Part) -> f64;

    fn get_sell_num(&self, datetime: Datetime, stock: &Stock, price: f64, risk: f64, from: Part) -> f64;

    fn get_sell_short_num(&self, datetime: Datetime, stock: &Stock, price: f64, risk: f64, from: Part) -> f64;

    fn get_buy_short_num(&self, datetime: Datetime, stock: &Stock, price: f64, risk: f64, from: Part) -> f64;

    /// Notification hooks so sizing strategies can track realized trades
    /// (e.g. Kelly-style managers that need the trade history).
    fn buy_notify(&mut self, _trade: &TradeRecord) {}

    fn sell_notify(&mut self, _trade: &TradeRecord) {}

    fn set_to(&mut self, _series: &[KRecord]) {}
    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn MoneyManager>;
}

impl Clone for Box<dyn MoneyManager> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
