//! Cart to order.
//!
//! Reading the cart, inserting the order and its items, and clearing the cart happen in one
//! SQLite transaction. The transaction opens with a write so concurrent checkouts queue on the
//! database write lock instead of pricing the same cart twice.

use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::{Address, Order, OrderItem, OrderStatus, OrderWithItems, PaymentStatus};
use crate::domain::pricing::calculate_totals;
use crate::domain::value_objects::Money;
use crate::repository::{addresses, cart, is_unique_violation, orders};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Client copy of the cart. Ignored: the server cart is authoritative.
    #[serde(default)]
    pub items: Option<serde_json::Value>,
    #[validate]
    pub shipping_address: Option<Address>,
    /// Saved address to ship to when no inline address is given.
    pub shipping_address_id: Option<Uuid>,
    /// Defaults to the shipping address.
    #[validate]
    pub billing_address: Option<Address>,
    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug)]
pub enum CheckoutOutcome {
    Created(OrderWithItems),
    /// The idempotency key was already used; this is the order it produced.
    Replayed(OrderWithItems),
}

impl CheckoutOutcome {
    pub fn order(&self) -> &OrderWithItems {
        match self { Self::Created(o) | Self::Replayed(o) => o }
    }
}

fn creation_error(e: StoreError) -> StoreError {
    match e {
        StoreError::Database(e) => StoreError::OrderCreation(e),
        other => other,
    }
}

#[tracing::instrument(skip_all, fields(user_id = %user_id))]
pub async fn create_order(
    pool: &SqlitePool,
    user_id: Uuid,
    request: CheckoutRequest,
    idempotency_key: Option<String>,
    shipping: Money,
) -> Result<CheckoutOutcome> {
    request.validate()?;
    let idempotency_key = idempotency_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
    if let Some(key) = &idempotency_key {
        let mut conn = pool.acquire().await?;
        if let Some(existing) = orders::find_by_idempotency_key(&mut conn, user_id, key).await? {
            tracing::info!(order_id = %existing.order.id, "replaying checkout for idempotency key");
            return Ok(CheckoutOutcome::Replayed(existing));
        }
    }

    let shipping_address = match request.shipping_address {
        Some(a) => a,
        None => addresses::resolve(pool, user_id, request.shipping_address_id).await?
            .ok_or_else(|| StoreError::InvalidInput("a shipping address is required".into()))?,
    };
    let billing_address = request.billing_address.unwrap_or_else(|| shipping_address.clone());

    let mut tx = pool.begin().await.map_err(StoreError::OrderCreation)?;
    // Takes the write lock before the cart is read.
    sqlx::query("UPDATE cart_items SET quantity = quantity WHERE user_id = ?")
        .bind(user_id).execute(&mut *tx).await.map_err(StoreError::OrderCreation)?;
    // A same-key checkout may have committed while this one waited for the lock.
    if let Some(key) = &idempotency_key {
        if let Some(existing) = orders::find_by_idempotency_key(&mut tx, user_id, key).await.map_err(creation_error)? {
            tracing::info!(order_id = %existing.order.id, "replaying checkout for idempotency key");
            return Ok(CheckoutOutcome::Replayed(existing));
        }
    }

    let cart = cart::load(&mut tx, user_id).await.map_err(creation_error)?;
    if cart.is_empty() {
        return Err(StoreError::EmptyCart);
    }
    if let Some(line) = cart.lines().iter().find(|l| !l.product.active) {
        return Err(StoreError::InvalidInput(format!("{} is no longer available", line.product.name)));
    }
    let totals = calculate_totals(&cart.line_entries(), shipping)?;

    let now = Utc::now();
    let mut order = Order {
        id: Uuid::now_v7(),
        order_number: Order::generate_number(),
        user_id,
        subtotal: totals.subtotal,
        tax: totals.tax,
        shipping: totals.shipping,
        total: totals.total,
        payment_method: request.payment_method.trim().to_string(),
        shipping_address: Json(shipping_address),
        billing_address: Json(billing_address),
        notes: request.notes.filter(|n| !n.trim().is_empty()),
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        idempotency_key: idempotency_key.clone(),
        created_at: now,
        updated_at: now,
    };
    let items: Vec<OrderItem> = cart.lines().iter().zip(cart.line_entries()).map(|(line, entry)| OrderItem {
        id: Uuid::now_v7(),
        order_id: order.id,
        product_id: line.product.id,
        product_name: line.product.name.clone(),
        quantity: entry.quantity,
        price: entry.unit_price,
    }).collect();

    if let Err(e) = orders::insert_order_numbered(&mut tx, &mut order, Order::generate_number).await {
        if idempotency_key.is_some() && is_unique_violation(&e) && e.to_string().contains("idempotency_key") {
            drop(tx);
            let key = idempotency_key.as_deref().unwrap_or_default();
            let mut conn = pool.acquire().await?;
            if let Some(existing) = orders::find_by_idempotency_key(&mut conn, user_id, key).await? {
                return Ok(CheckoutOutcome::Replayed(existing));
            }
            return Err(StoreError::Conflict("checkout already in progress".into()));
        }
        return Err(StoreError::OrderCreation(e));
    }
    for item in &items {
        orders::insert_item(&mut tx, item).await.map_err(StoreError::OrderCreation)?;
    }

    let cleared = cart::clear(&mut tx, user_id).await.map_err(StoreError::OrderCreation)?;
    if cleared != cart.lines().len() as u64 {
        return Err(StoreError::Conflict("cart changed during checkout".into()));
    }
    tx.commit().await.map_err(StoreError::OrderCreation)?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, total = %order.total, lines = items.len(), "order placed");
    Ok(CheckoutOutcome::Created(OrderWithItems { order, items }))
}

/// Loads an order, applies an admin status change and stores it.
pub async fn transition(
    pool: &SqlitePool,
    order_id: Uuid,
    apply: impl FnOnce(&mut Order) -> std::result::Result<(), crate::domain::aggregates::OrderError>,
) -> Result<OrderWithItems> {
    let mut order = orders::find(pool, order_id).await?.ok_or_else(|| StoreError::NotFound("Order".into()))?;
    let from = order.status;
    apply(&mut order)?;
    orders::save_status(pool, &order, from).await?;
    tracing::info!(order_id = %order.id, from = from.as_str(), to = order.status.as_str(), "order status changed");
    orders::with_items(pool, order).await
}
