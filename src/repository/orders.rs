//! Order storage. Rows are inserted by checkout only; later writes touch status columns alone.

use sqlx::types::Json;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use uuid::Uuid;
use crate::domain::aggregates::{Order, OrderItem, OrderStatus, OrderWithItems};
use crate::repository::is_unique_violation;
use crate::{Result, StoreError};

/// Fresh order numbers drawn before a checkout gives up on a taken one.
const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;

pub(crate) async fn insert_order(conn: &mut SqliteConnection, o: &Order) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, subtotal, tax, shipping, total, payment_method, shipping_address, billing_address, notes, status, payment_status, idempotency_key, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)")
        .bind(o.id).bind(&o.order_number).bind(o.user_id)
        .bind(o.subtotal.to_string()).bind(o.tax.to_string()).bind(o.shipping.to_string()).bind(o.total.to_string())
        .bind(&o.payment_method).bind(Json(&o.shipping_address.0)).bind(Json(&o.billing_address.0)).bind(&o.notes)
        .bind(o.status).bind(o.payment_status).bind(&o.idempotency_key).bind(o.created_at).bind(o.updated_at)
        .execute(&mut *conn).await?;
    Ok(())
}

/// Inserts `o`, drawing a new number from `next_number` while its current one is taken.
pub(crate) async fn insert_order_numbered(
    conn: &mut SqliteConnection,
    o: &mut Order,
    mut next_number: impl FnMut() -> String,
) -> std::result::Result<(), sqlx::Error> {
    for _ in 1..MAX_ORDER_NUMBER_ATTEMPTS {
        match insert_order(&mut *conn, o).await {
            Err(e) if is_unique_violation(&e) && e.to_string().contains("order_number") => {
                tracing::warn!(order_number = %o.order_number, "order number taken, drawing another");
                o.order_number = next_number();
            }
            done => return done,
        }
    }
    insert_order(conn, o).await
}

pub(crate) async fn insert_item(conn: &mut SqliteConnection, i: &OrderItem) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO order_items (id, order_id, product_id, product_name, quantity, price) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(i.id).bind(i.order_id).bind(i.product_id).bind(&i.product_name).bind(i.quantity).bind(i.price.to_string())
        .execute(&mut *conn).await?;
    Ok(())
}

pub async fn items(conn: impl SqliteExecutor<'_>, order_id: Uuid) -> Result<Vec<OrderItem>> {
    Ok(sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ? ORDER BY rowid")
        .bind(order_id).fetch_all(conn).await?)
}

pub async fn find(conn: impl SqliteExecutor<'_>, id: Uuid) -> Result<Option<Order>> {
    Ok(sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?").bind(id).fetch_optional(conn).await?)
}

pub async fn with_items(pool: &SqlitePool, order: Order) -> Result<OrderWithItems> {
    let items = items(pool, order.id).await?;
    Ok(OrderWithItems { order, items })
}

pub async fn find_by_idempotency_key(conn: &mut SqliteConnection, user_id: Uuid, key: &str) -> Result<Option<OrderWithItems>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = ? AND idempotency_key = ?")
        .bind(user_id).bind(key).fetch_optional(&mut *conn).await?;
    match order {
        Some(order) => {
            let items = items(&mut *conn, order.id).await?;
            Ok(Some(OrderWithItems { order, items }))
        }
        None => Ok(None),
    }
}

/// Newest first. `owner` restricts the listing to one user.
pub async fn list(pool: &SqlitePool, owner: Option<Uuid>, limit: i64, offset: i64) -> Result<(Vec<Order>, i64)> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE (?1 IS NULL OR user_id = ?1) ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3")
        .bind(owner).bind(limit).bind(offset).fetch_all(pool).await?;
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE (?1 IS NULL OR user_id = ?1)")
        .bind(owner).fetch_one(pool).await?;
    Ok((orders, total.0))
}

/// Persists a status transition made on the aggregate, provided nobody moved the order off
/// `from` in the meantime.
pub async fn save_status(pool: &SqlitePool, o: &Order, from: OrderStatus) -> Result<()> {
    let done = sqlx::query("UPDATE orders SET status = ?, payment_status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(o.status).bind(o.payment_status).bind(o.updated_at).bind(o.id).bind(from)
        .execute(pool).await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::Conflict(format!("order {} changed concurrently", o.order_number)));
    }
    Ok(())
}
