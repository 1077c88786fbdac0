use axum::{extract::State, http::{HeaderMap, StatusCode}, Json};
use uuid::Uuid;
use crate::checkout::{self, CheckoutOutcome, CheckoutRequest};
use crate::domain::aggregates::{Order, OrderWithItems};
use crate::domain::events::OrderEvent;
use crate::handlers::{AppJson, AppPath, AppQuery, ListParams, PaginatedResponse};
use crate::principal::{Admin, Principal};
use crate::repository::orders;
use crate::{AppState, Result, StoreError};

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

pub async fn list_orders(State(s): State<AppState>, user: Principal, AppQuery(p): AppQuery<ListParams>) -> Result<Json<PaginatedResponse<Order>>> {
    let (page, limit, offset) = p.window();
    let (data, total) = orders::list(&s.db, user.owner_scope(), limit, offset).await?;
    Ok(Json(PaginatedResponse { data, total, page }))
}

pub async fn get_order(State(s): State<AppState>, user: Principal, AppPath(id): AppPath<Uuid>) -> Result<Json<OrderWithItems>> {
    let order = orders::find(&s.db, id).await?
        .filter(|o| user.is_admin() || o.user_id == user.id)
        .ok_or_else(|| StoreError::NotFound("Order".into()))?;
    Ok(Json(orders::with_items(&s.db, order).await?))
}

pub async fn create_order(State(s): State<AppState>, user: Principal, headers: HeaderMap, AppJson(r): AppJson<CheckoutRequest>) -> Result<(StatusCode, Json<OrderWithItems>)> {
    let key = headers.get(IDEMPOTENCY_KEY_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string);
    match checkout::create_order(&s.db, user.id, r, key, s.shipping_flat_rate).await? {
        CheckoutOutcome::Created(placed) => {
            s.events.publish(OrderEvent::Placed {
                order_id: placed.order.id, order_number: placed.order.order_number.clone(), user_id: placed.order.user_id,
                total: placed.order.total, item_count: placed.items.len(),
            }).await;
            Ok((StatusCode::CREATED, Json(placed)))
        }
        CheckoutOutcome::Replayed(existing) => Ok((StatusCode::OK, Json(existing))),
    }
}

pub async fn cancel_order(State(s): State<AppState>, Admin(_): Admin, AppPath(id): AppPath<Uuid>) -> Result<Json<OrderWithItems>> {
    let o = checkout::transition(&s.db, id, Order::cancel).await?;
    s.events.publish(OrderEvent::Cancelled { order_id: o.order.id, payment_status: o.order.payment_status }).await;
    Ok(Json(o))
}

pub async fn fulfill_order(State(s): State<AppState>, Admin(_): Admin, AppPath(id): AppPath<Uuid>) -> Result<Json<OrderWithItems>> {
    let o = checkout::transition(&s.db, id, Order::fulfill).await?;
    s.events.publish(OrderEvent::Fulfilled { order_id: o.order.id, status: o.order.status }).await;
    Ok(Json(o))
}

pub async fn pay_order(State(s): State<AppState>, Admin(_): Admin, AppPath(id): AppPath<Uuid>) -> Result<Json<OrderWithItems>> {
    let o = checkout::transition(&s.db, id, Order::mark_paid).await?;
    s.events.publish(OrderEvent::Paid { order_id: o.order.id }).await;
    Ok(Json(o))
}
