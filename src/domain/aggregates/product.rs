//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use crate::domain::pricing::LineEntry;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub price: Money,
    #[sqlx(try_from = "String")]
    pub tax: Money,
    pub stock: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn can_supply(&self, quantity: i64) -> bool { self.active && quantity <= self.stock }

    /// Price and tax as they stand right now; later product edits do not reach the entry.
    pub fn snapshot(&self, quantity: i64) -> LineEntry {
        LineEntry { unit_price: self.price, tax_rate: self.tax, quantity }
    }
}

/// Lowercase ASCII alphanumerics, every other run collapsed to a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') { slug.pop(); }
    if slug.is_empty() { "product".to_string() } else { slug }
}

/// Attempt 1 is the bare slug, attempt n > 1 appends `-n`.
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 { base.to_string() } else { format!("{base}-{attempt}") }
}
