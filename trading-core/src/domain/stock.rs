//! `Stock` — opaque instrument identifier plus trading metadata.

use serde::{Deserialize, Serialize};

/// Trading metadata for one instrument. The core treats this as an opaque
/// lookup result from the external `DataSource` (spec.md §1); only the
/// fields the trading system itself needs to round numbers are modeled here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub code: String,
    min_trade_number: f64,
    max_trade_number: f64,
    tick_size: f64,
    multiplier: f64,
}

impl Stock {
    pub fn new(code: impl Into<String>, min_trade_number: f64, max_trade_number: f64, tick_size: f64, multiplier: f64) -> Self {
        Self {
            code: code.into(),
            min_trade_number,
            max_trade_number,
            tick_size,
            multiplier,
        }
    }

    pub fn min_trade_number(&self) -> f64 {
        self.min_trade_number
    }

    pub fn max_trade_number(&self) -> f64 {
        self.max_trade_number
    }

    pub fn tick_size(&self) -> f64 {
        self.tick_size
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Round `number` down to a multiple of the lot size (`min_trade_number`),
    /// then clamp to `[min_trade_number, max_trade_number]`. Returns 0 if the
    /// rounded result is below one lot — spec.md invariant 4.
    pub fn round_to_lot(&self, number: f64) -> f64 {
        if self.min_trade_number <= 0.0 || number <= 0.0 {
            return 0.0;
        }
        let lots = (number / self.min_trade_number).floor();
        let rounded = lots * self.min_trade_number;
        if rounded < self.min_trade_number {
            return 0.0;
        }
        rounded.min(self.max_trade_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> Stock {
        Stock::new("000001", 100.0, 1_000_000.0, 0.01, 1.0)
    }

    #[test]
    fn rounds_down_to_lot() {
        assert_eq!(stock().round_to_lot(250.0), 200.0);
    }

    #[test]
    fn below_one_lot_is_zero() {
        assert_eq!(stock().round_to_lot(50.0), 0.0);
    }

    #[test]
    fn clamps_to_max() {
        assert_eq!(stock().round_to_lot(10_000_000.0), 1_000_000.0);
    }

    #[test]
    fn zero_input_is_zero() {
        assert_eq!(stock().round_to_lot(0.0), 0.0);
    }
}
