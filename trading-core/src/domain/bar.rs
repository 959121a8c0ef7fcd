//! `KRecord` — one OHLCV bar for one instrument at one instant.

use super::time::Datetime;
use serde::{Deserialize, Serialize};

/// One candle. All price fields share the instrument's quote currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KRecord {
    pub datetime: Datetime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
}

impl KRecord {
    pub fn new(
        datetime: Datetime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        amount: f64,
    ) -> Self {
        Self {
            datetime,
            open,
            high,
            low,
            close,
            volume,
            amount,
        }
    }

    /// Basic OHLCV sanity check, per the domain rule implied by spec.md §3:
    /// no NaN fields, `high` is the max and `low` the min of the bar.
    pub fn is_valid(&self) -> bool {
        if self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
        {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }

    /// `high == low` (degenerate, no intrabar range) — spec.md §4.1.1 step 1.
    pub fn is_degenerate(&self) -> bool {
        self.high == self.low
    }

    /// `close` outside `[low, high]` — the other half of the step-1 gate.
    pub fn close_out_of_range(&self) -> bool {
        self.close < self.low || self.close > self.high
    }
}
