//! Cart storage: one row per (user, product).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;
use crate::domain::aggregates::{Cart, CartLine, Product};
use crate::domain::value_objects::Quantity;
use crate::repository::{products, single_row};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    product: Product,
    cart_quantity: i64,
}

/// The caller's cart in insertion order, each line joined with its product.
pub async fn load(conn: &mut SqliteConnection, user_id: Uuid) -> Result<Cart> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        "SELECT p.*, c.quantity AS cart_quantity FROM cart_items c JOIN products p ON p.id = c.product_id WHERE c.user_id = ? ORDER BY c.created_at, c.id")
        .bind(user_id).fetch_all(&mut *conn).await?;
    let lines = rows.into_iter().map(|r| CartLine { product: r.product, quantity: r.cart_quantity }).collect();
    Ok(Cart::new(user_id, lines))
}

async fn find_item(conn: &mut SqliteConnection, user_id: Uuid, product_id: Uuid) -> Result<Option<CartItem>> {
    Ok(sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE user_id = ? AND product_id = ?")
        .bind(user_id).bind(product_id).fetch_optional(&mut *conn).await?)
}

async fn available_product(conn: &mut SqliteConnection, product_id: Uuid) -> Result<Product> {
    match products::find(&mut *conn, product_id).await? {
        Some(p) if p.active => Ok(p),
        _ => Err(StoreError::NotFound("Product".into())),
    }
}

fn ensure_stock(product: &Product, quantity: i64) -> Result<()> {
    if product.can_supply(quantity) { return Ok(()); }
    Err(StoreError::InvalidInput(format!("only {} of {} in stock", product.stock, product.name)))
}

async fn upsert(conn: &mut SqliteConnection, user_id: Uuid, product_id: Uuid, quantity: i64) -> Result<CartItem> {
    let rows = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items (id, user_id, product_id, quantity, created_at) VALUES (?, ?, ?, ?, ?) ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = excluded.quantity RETURNING *")
        .bind(Uuid::now_v7()).bind(user_id).bind(product_id).bind(quantity).bind(Utc::now())
        .fetch_all(&mut *conn).await?;
    Ok(single_row(rows)?)
}

/// Adds `quantity` to the line, creating it when absent.
pub async fn add(pool: &SqlitePool, user_id: Uuid, product_id: Uuid, quantity: Quantity) -> Result<CartItem> {
    let mut tx = pool.begin().await?;
    let product = available_product(&mut tx, product_id).await?;
    let current = find_item(&mut tx, user_id, product_id).await?.map(|i| i.quantity).unwrap_or(0);
    let wanted = current.saturating_add(quantity.value());
    ensure_stock(&product, wanted)?;
    let item = upsert(&mut tx, user_id, product_id, wanted).await?;
    tx.commit().await?;
    Ok(item)
}

/// Sets the line to `quantity`; zero removes it. Returns the line if one remains.
pub async fn set_quantity(pool: &SqlitePool, user_id: Uuid, product_id: Uuid, quantity: i64) -> Result<Option<CartItem>> {
    if quantity < 0 {
        return Err(StoreError::InvalidInput(format!("quantity cannot be negative, got {quantity}")));
    }
    let mut tx = pool.begin().await?;
    if find_item(&mut tx, user_id, product_id).await?.is_none() {
        return Err(StoreError::NotFound("Cart item".into()));
    }
    let item = if quantity == 0 {
        delete_line(&mut tx, user_id, product_id).await?;
        None
    } else {
        let product = available_product(&mut tx, product_id).await?;
        ensure_stock(&product, quantity)?;
        Some(upsert(&mut tx, user_id, product_id, quantity).await?)
    };
    tx.commit().await?;
    Ok(item)
}

/// Decrements by `by`, or drops the line outright when `by` is `None` or covers what is left.
pub async fn remove(pool: &SqlitePool, user_id: Uuid, product_id: Uuid, by: Option<Quantity>) -> Result<Option<CartItem>> {
    let mut tx = pool.begin().await?;
    let item = find_item(&mut tx, user_id, product_id).await?.ok_or_else(|| StoreError::NotFound("Cart item".into()))?;
    let remaining = match by {
        Some(by) => Quantity::new(item.quantity)?.subtract(by),
        None => None,
    };
    let left = match remaining {
        Some(q) => Some(upsert(&mut tx, user_id, product_id, q.value()).await?),
        None => { delete_line(&mut tx, user_id, product_id).await?; None }
    };
    tx.commit().await?;
    Ok(left)
}

/// Replaces the server cart with the client's copy in one transaction.
pub async fn sync(pool: &SqlitePool, user_id: Uuid, items: &[(Uuid, Quantity)]) -> Result<Cart> {
    let mut tx = pool.begin().await?;
    clear(&mut tx, user_id).await?;
    for (product_id, quantity) in items {
        let product = available_product(&mut tx, *product_id).await?;
        ensure_stock(&product, quantity.value())?;
        upsert(&mut tx, user_id, *product_id, quantity.value()).await?;
    }
    let cart = load(&mut tx, user_id).await?;
    tx.commit().await?;
    Ok(cart)
}

async fn delete_line(conn: &mut SqliteConnection, user_id: Uuid, product_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = ? AND product_id = ?")
        .bind(user_id).bind(product_id).execute(&mut *conn).await?;
    Ok(())
}

/// Returns the number of lines removed.
pub async fn clear(conn: &mut SqliteConnection, user_id: Uuid) -> std::result::Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM cart_items WHERE user_id = ?").bind(user_id).execute(&mut *conn).await?;
    Ok(done.rows_affected())
}
