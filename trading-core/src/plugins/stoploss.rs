//! `Stoploss` and `TakeProfit` plugin contracts (spec.md §6). Same shape:
//! `get(datetime, price) -> price`, where `0.0` means "no such bound".

use crate::domain::{Datetime, KRecord};

pub trait Stoploss: Send + Sync {
    fn get(&self, datetime: Datetime, price: f64) -> f64;

    fn set_to(&mut self, _series: &[KRecord]) {}
    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn Stoploss>;
}

impl Clone for Box<dyn Stoploss> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A second, independently-configured instance is used for trailing
/// take-profit (spec.md §4.1 table: "TakeProfit (2 instances)").
pub trait TakeProfit: Send + Sync {
    fn get(&self, datetime: Datetime) -> f64;

    fn set_to(&mut self, _series: &[KRecord]) {}
    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn TakeProfit>;
}

impl Clone for Box<dyn TakeProfit> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
