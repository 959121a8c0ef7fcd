//! `Signal` plugin contract (spec.md §6): the buy/sell trigger.

use crate::domain::{Datetime, KRecord};

/// `should_buy` and `should_sell` are not mutually exclusive — both may be
/// true on the same bar; spec.md §4.1.1 step 5 resolves that by checking
/// buy first ("buy wins"), an arbitrary tie-break preserved from the source
/// and not to be relied on by callers (spec.md §9 Open Questions).
pub trait Signal: Send + Sync {
    fn should_buy(&self, datetime: Datetime) -> bool;
    fn should_sell(&self, datetime: Datetime) -> bool;

    fn set_to(&mut self, _series: &[KRecord]) {}
    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn Signal>;
}

impl Clone for Box<dyn Signal> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
