//! Cart Aggregate
//!
//! A read model over the caller's `cart_items` rows joined with their products.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::Product;
use crate::domain::pricing::{calculate_totals, LineEntry, Totals};
use crate::domain::value_objects::{Money, Quantity};
use crate::StoreError;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: Product,
    pub quantity: i64,
}

impl CartLine {
    pub fn line_total(&self) -> Money { self.product.price.times(self.quantity) }
}

#[derive(Clone, Debug)]
pub struct Cart {
    user_id: Uuid,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(user_id: Uuid, lines: Vec<CartLine>) -> Self { Self { user_id, lines } }

    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn into_lines(self) -> Vec<CartLine> { self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn item_count(&self) -> i64 { self.lines.iter().map(|l| l.quantity).sum() }

    pub fn line_entries(&self) -> Vec<LineEntry> {
        self.lines.iter().map(|l| l.product.snapshot(l.quantity)).collect()
    }

    /// Price preview; `None` for an empty cart.
    pub fn totals(&self, shipping: Money) -> Result<Option<Totals>, StoreError> {
        if self.is_empty() { return Ok(None); }
        calculate_totals(&self.line_entries(), shipping).map(Some)
    }
}

/// One entry of the client-held cart as sent to `/cart/sync`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItem {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Folds repeated products into one line. Any non-positive quantity rejects the whole sync.
pub fn collapse_sync_items(items: &[SyncItem]) -> Result<Vec<(Uuid, Quantity)>, StoreError> {
    let mut merged: BTreeMap<Uuid, Quantity> = BTreeMap::new();
    for item in items {
        let qty = Quantity::new(item.quantity)?;
        merged.entry(item.product_id).and_modify(|q| *q = q.add(qty)).or_insert(qty);
    }
    Ok(merged.into_iter().collect())
}
