//! Wishlist storage. A (user, product) pair exists at most once.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;
use crate::domain::aggregates::Product;
use crate::repository::{is_unique_violation, products};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    #[sqlx(rename = "wishlist_id")]
    pub id: Uuid,
    pub added_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub product: Product,
}

pub async fn list(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<WishlistEntry>> {
    Ok(sqlx::query_as::<_, WishlistEntry>(
        "SELECT w.id AS wishlist_id, w.created_at AS added_at, p.* FROM wishlist_items w JOIN products p ON p.id = w.product_id WHERE w.user_id = ? ORDER BY w.created_at DESC, w.id DESC")
        .bind(user_id).fetch_all(pool).await?)
}

pub async fn add(pool: &SqlitePool, user_id: Uuid, product_id: Uuid) -> Result<WishlistEntry> {
    let product = products::find(pool, product_id).await?
        .filter(|p| p.active)
        .ok_or_else(|| StoreError::NotFound("Product".into()))?;
    let (id, added_at) = (Uuid::now_v7(), Utc::now());
    let inserted = sqlx::query("INSERT INTO wishlist_items (id, user_id, product_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(id).bind(user_id).bind(product_id).bind(added_at).execute(pool).await;
    match inserted {
        Ok(_) => Ok(WishlistEntry { id, added_at, product }),
        Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate("Wishlist item".into())),
        Err(e) => Err(e.into()),
    }
}

pub async fn remove(pool: &SqlitePool, user_id: Uuid, product_id: Uuid) -> Result<()> {
    let done = sqlx::query("DELETE FROM wishlist_items WHERE user_id = ? AND product_id = ?")
        .bind(user_id).bind(product_id).execute(pool).await?;
    if done.rows_affected() == 0 { return Err(StoreError::NotFound("Wishlist item".into())); }
    Ok(())
}
