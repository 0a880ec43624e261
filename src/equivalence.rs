//! Value-parity computation between two baskets of service items
use crate::item::{self, Currency, ServiceItem};
use std::collections::BTreeMap;

/// Baskets within this percentage difference of each other count as equal.
pub const EQUIVALENCE_TOLERANCE_PCT: f64 = 0.01;

/// Derived value parity between two baskets. Always recomputed from the
/// current version's baskets, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceResult {
    pub total_offered: f64,
    pub total_requested: f64,
    /// Signed: positive when the offered basket is worth more.
    pub balance: f64,
    pub absolute_balance: f64,
    pub percentage_difference: f64,
    pub is_equal: bool,
    pub offered_by_currency: BTreeMap<Currency, f64>,
    pub requested_by_currency: BTreeMap<Currency, f64>,
}

/// Pure parity computation. The per-currency subtotals let the caller detect
/// multi-currency mismatches; no conversion happens here.
pub fn calculate_equivalence(
    offered: &[ServiceItem],
    requested: &[ServiceItem],
) -> EquivalenceResult {
    let total_offered = item::sum(offered);
    let total_requested = item::sum(requested);

    let balance = total_offered - total_requested;
    let absolute_balance = balance.abs();

    let average = (total_offered + total_requested) / 2.0;
    let percentage_difference = if average > 0.0 {
        absolute_balance / average * 100.0
    } else {
        0.0
    };

    EquivalenceResult {
        total_offered,
        total_requested,
        balance,
        absolute_balance,
        percentage_difference,
        is_equal: percentage_difference <= EQUIVALENCE_TOLERANCE_PCT,
        offered_by_currency: item::sum_by_currency(offered),
        requested_by_currency: item::sum_by_currency(requested),
    }
}
