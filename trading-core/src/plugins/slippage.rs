//! `Slippage` plugin contract (spec.md §6): translates a plan price into the
//! realistically achievable execution price.

use crate::domain::{Datetime, KRecord};

pub trait Slippage: Send + Sync {
    fn get_real_buy_price(&self, datetime: Datetime, plan_price: f64) -> f64;
    fn get_real_sell_price(&self, datetime: Datetime, plan_price: f64) -> f64;

    fn set_to(&mut self, _series: &[KRecord]) {}
    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn Slippage>;
}

impl Clone for Box<dyn Slippage> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
