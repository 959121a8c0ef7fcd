//! `CostRecord` — the breakdown of trading costs for one execution.

use serde::{Deserialize, Serialize};

/// Commission/tax/fee breakdown. `total` is always the sum of the other
/// four fields — enforced at construction (spec.md §3 invariant 1), not as
/// a runtime assertion scattered at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub commission: f64,
    pub stamp_tax: f64,
    pub transfer_fee: f64,
    pub other: f64,
    total: f64,
}

impl CostRecord {
    pub fn new(commission: f64, stamp_tax: f64, transfer_fee: f64, other: f64) -> Self {
        Self {
            commission,
            stamp_tax,
            transfer_fee,
            other,
            total: commission + stamp_tax + transfer_fee + other,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

impl Default for CostRecord {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_components() {
        let c = CostRecord::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(c.total(), 10.0);
    }

    #[test]
    fn zero_cost_has_zero_total() {
        assert_eq!(CostRecord::zero().total(), 0.0);
    }
}
