//! `TradeManager` plugin contract (spec.md §6): cash/position bookkeeping.
//!
//! The core consumes this interface only; the ledger arithmetic behind it is
//! an external collaborator per spec.md §1. A rejected order is represented
//! by a `TradeRecord` with `business = Business::None` (spec.md §4.1.4)
//! rather than an `Err`, since rejection is routine domain behavior, not a
//! configuration error.

use crate::domain::{Datetime, Part, PositionRecord, Stock, TradeRecord};

pub trait TradeManager: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn buy(
        &mut self,
        datetime: Datetime,
        stock: &Stock,
        plan_price: f64,
        real_price: f64,
        number: f64,
        stoploss: f64,
        goal_price: f64,
        from: Part,
    ) -> TradeRecord;

    #[allow(clippy::too_many_arguments)]
    fn sell(
        &mut self,
        datetime: Datetime,
        stock: &Stock,
        plan_price: f64,
        real_price: f64,
        number: f64,
        stoploss: f64,
        goal_price: f64,
        from: Part,
    ) -> TradeRecord;

    #[allow(clippy::too_many_arguments)]
    fn buy_short(
        &mut self,
        datetime: Datetime,
        stock: &Stock,
        plan_price: f64,
        real_price: f64,
        number: f64,
        stoploss: f64,
        goal_price: f64,
        from: Part,
    ) -> TradeRecord;

    #[allow(clippy::too_many_arguments)]
    fn sell_short(
        &mut self,
        datetime: Datetime,
        stock: &Stock,
        plan_price: f64,
        real_price: f64,
        number: f64,
        stoploss: f64,
        goal_price: f64,
        from: Part,
    ) -> TradeRecord;

    fn get_position(&self, stock: &Stock) -> Option<PositionRecord>;
    fn get_short_position(&self, stock: &Stock) -> Option<PositionRecord>;
    fn have(&self, stock: &Stock) -> bool;
    fn get_hold_number(&self, datetime: Datetime, stock: &Stock) -> f64;
    fn init_datetime(&self) -> Datetime;

    /// `name` is one of `"support_borrow_cash"` / `"support_borrow_stock"`
    /// per spec.md §6; any other key is a configuration error the caller
    /// (the `TradingSystem`'s own `set_param`) is responsible for rejecting
    /// before it reaches here.
    fn set_param(&mut self, name: &str, value: bool);

    fn trade_list(&self) -> &[TradeRecord];

    fn reset(&mut self);

    fn clone_box(&self) -> Box<dyn TradeManager>;
}

impl Clone for Box<dyn TradeManager> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
