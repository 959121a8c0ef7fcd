//! `Environment` plugin contract (spec.md §6): a pure query over external
//! market state, e.g. "is the broad market in an uptrend regime".

use crate::domain::{Datetime, KRecord};

/// Queried once per bar in the Environment phase (spec.md §4.1.1 step 3).
/// `isValid` must be a pure function of external state — it must not
/// observe or mutate the trading system (spec.md §9: "Reentrancy of plugin
/// callbacks").
pub trait Environment: Send + Sync {
    fn is_valid(&self, datetime: Datetime) -> bool;

    /// Bind the plugin to a candle series (spec.md §3: "Plugin state ... is
    /// mutated through `setTO(kdata)`"). Default no-op for plugins with no
    /// series-dependent state.
    fn set_to(&mut self, _series: &[KRecord]) {}

    /// Return the plugin to pristine state (spec.md §3: "`reset()` returns
    /// all plugins to pristine state").
    fn reset(&mut self) {}

    fn clone_box(&self) -> Box<dyn Environment>;
}

impl Clone for Box<dyn Environment> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
