//! `CostModel` plugin contract (spec.md §6). Consumed by `TradeManager`
//! implementations, not called directly by `TradingSystem` — specified here
//! only by contract, per spec.md §1 ("their internal accounting is not
//! respecified here").

use crate::domain::{CostRecord, Datetime, Stock};

pub trait CostModel: Send + Sync {
    fn get_buy_cost(&self, datetime: Datetime, stock: &Stock, price: f64, num: f64) -> CostRecord;
    fn get_sell_cost(&self, datetime: Datetime, stock: &Stock, price: f64, num: f64) -> CostRecord;

    /// Defaults return zero cost (spec.md §6: "Default borrow/return
    /// implementations return zero cost").
    fn get_borrow_cash_cost(&self, _datetime: Datetime, _cash: f64) -> CostRecord {
        CostRecord::zero()
    }

    fn get_return_cash_cost(&self, _datetime: Datetime, _borrowed: f64, _returned: f64, _cash: f64) -> CostRecord {
        CostRecord::zero()
    }

    fn get_borrow_stock_cost(&self, _datetime: Datetime, _stock: &Stock, _num: f64) -> CostRecord {
        CostRecord::zero()
    }

    fn get_return_stock_cost(&self, _datetime: Datetime, _stock: &Stock, _num: f64) -> CostRecord {
        CostRecord::zero()
    }

    fn clone_box(&self) -> Box<dyn CostModel>;
}

impl Clone for Box<dyn CostModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
