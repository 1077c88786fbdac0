//! Checkout totals.
//!
//! Sums are taken at full precision and rounded once per aggregate. The total is built from the
//! rounded parts so `total == subtotal + tax + shipping` holds exactly.

use serde::Serialize;
use crate::domain::value_objects::Money;
use crate::StoreError;

/// One priced line: unit price and per-unit tax captured from the product.
#[derive(Clone, Debug, PartialEq)]
pub struct LineEntry {
    pub unit_price: Money,
    pub tax_rate: Money,
    pub quantity: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

pub fn calculate_totals(entries: &[LineEntry], shipping: Money) -> Result<Totals, StoreError> {
    if entries.is_empty() {
        return Err(StoreError::InvalidInput("no line entries to price".into()));
    }
    if shipping.is_negative() {
        return Err(StoreError::InvalidInput(format!("shipping cannot be negative: {shipping}")));
    }
    for e in entries {
        if e.quantity <= 0 {
            return Err(StoreError::InvalidInput(format!("quantity must be positive, got {}", e.quantity)));
        }
        if e.unit_price.is_negative() {
            return Err(StoreError::InvalidInput(format!("unit price cannot be negative: {}", e.unit_price)));
        }
        if e.tax_rate.is_negative() {
            return Err(StoreError::InvalidInput(format!("tax cannot be negative: {}", e.tax_rate)));
        }
    }

    let subtotal = entries.iter().map(|e| e.unit_price.times(e.quantity)).sum::<Money>().rounded();
    let tax = entries.iter().map(|e| e.tax_rate.times(e.quantity)).sum::<Money>().rounded();
    let shipping = shipping.rounded();
    let total = (subtotal + tax + shipping).rounded();
    Ok(Totals { subtotal, tax, shipping, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Money { s.parse().unwrap() }
    fn entry(price: &str, tax: &str, quantity: i64) -> LineEntry {
        LineEntry { unit_price: m(price), tax_rate: m(tax), quantity }
    }

    #[test]
    fn test_reference_cart() {
        let totals = calculate_totals(&[entry("10.00", "1.00", 2), entry("5.00", "0", 1)], Money::ZERO).unwrap();
        assert_eq!(totals.subtotal, m("25.00"));
        assert_eq!(totals.tax, m("2.00"));
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, m("27.00"));
    }

    #[test]
    fn test_rounds_once_at_aggregate() {
        // Per-line rounding would give 0.01 + 0.01 + 0.00 = 0.02.
        let totals = calculate_totals(&[entry("0.005", "0", 1), entry("0.005", "0", 1), entry("0.004", "0", 1)], Money::ZERO).unwrap();
        assert_eq!(totals.subtotal, m("0.01"));
    }

    #[test]
    fn test_total_is_sum_of_rounded_parts() {
        let cases = [
            vec![entry("0.333", "0.0049", 3)],
            vec![entry("19.995", "1.625", 1), entry("0.015", "0.005", 7)],
            vec![entry("1234.5678", "98.7654", 11), entry("0", "0", 1)],
        ];
        for entries in cases {
            for shipping in [Money::ZERO, m("4.995"), m("12.50")] {
                let t = calculate_totals(&entries, shipping).unwrap();
                assert_eq!(t.total, t.subtotal + t.tax + t.shipping);
            }
        }
    }

    #[test]
    fn test_subtotal_scales_with_quantity() {
        let single = calculate_totals(&[entry("3.25", "0.10", 2), entry("7.50", "0", 1)], Money::ZERO).unwrap();
        let doubled = calculate_totals(&[entry("3.25", "0.10", 4), entry("7.50", "0", 2)], Money::ZERO).unwrap();
        assert_eq!(doubled.subtotal, single.subtotal + single.subtotal);
        assert_eq!(doubled.tax, single.tax + single.tax);
    }

    #[test]
    fn test_tax_is_independent_of_subtotal() {
        let t = calculate_totals(&[entry("100.00", "0.004", 1)], Money::ZERO).unwrap();
        assert_eq!(t.tax, Money::ZERO);
        let t = calculate_totals(&[entry("100.00", "0.004", 2)], Money::ZERO).unwrap();
        assert_eq!(t.tax, m("0.01"));
    }

    #[test]
    fn test_shipping_is_added() {
        let t = calculate_totals(&[entry("10.00", "0", 1)], m("5.00")).unwrap();
        assert_eq!(t.total, m("15.00"));
    }

    #[test]
    fn test_rejects_invalid_entries() {
        assert!(matches!(calculate_totals(&[], Money::ZERO), Err(StoreError::InvalidInput(_))));
        assert!(matches!(calculate_totals(&[entry("1.00", "0", 0)], Money::ZERO), Err(StoreError::InvalidInput(_))));
        assert!(matches!(calculate_totals(&[entry("1.00", "0", -1)], Money::ZERO), Err(StoreError::InvalidInput(_))));
        assert!(matches!(calculate_totals(&[entry("-1.00", "0", 1)], Money::ZERO), Err(StoreError::InvalidInput(_))));
        assert!(matches!(calculate_totals(&[entry("1.00", "0", 1)], m("-1")), Err(StoreError::InvalidInput(_))));
    }
}
