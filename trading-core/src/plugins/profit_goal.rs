//! `ProfitGoal` plugin contract (spec.md §6): a profit target; `0.0` means
//! "no such bound".

use crate::domain::{Datetime, KRecord};

pub trait ProfitGoal: Send + Sync {
    fn get(&self, datetime: Datetime, price: f64) -> f64;

    fn set_to(&mut self, _series: &[KRecord]) {}
    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn ProfitGoal>;
}

impl Clone for Box<dyn ProfitGoal> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
