use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::{collapse_sync_items, Cart, CartLine, SyncItem};
use crate::domain::pricing::Totals;
use crate::domain::value_objects::Quantity;
use crate::handlers::{AppJson, AppPath, AppQuery};
use crate::principal::Principal;
use crate::repository::cart::{self, CartItem};
use crate::{AppState, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: i64,
    pub totals: Option<Totals>,
}

impl CartView {
    fn build(cart: Cart, s: &AppState) -> Result<Self> {
        let totals = cart.totals(s.shipping_flat_rate)?;
        let item_count = cart.item_count();
        Ok(Self { lines: cart.into_lines(), item_count, totals })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest { pub product_id: Uuid, pub quantity: i64 }

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest { pub quantity: i64 }

#[derive(Debug, Deserialize)]
pub struct RemoveParams { pub quantity: Option<i64> }

#[derive(Debug, Deserialize)]
pub struct SyncRequest { pub items: Vec<SyncItem> }

pub async fn get_cart(State(s): State<AppState>, user: Principal) -> Result<Json<CartView>> {
    let mut conn = s.db.acquire().await?;
    let cart = cart::load(&mut conn, user.id).await?;
    drop(conn);
    Ok(Json(CartView::build(cart, &s)?))
}

pub async fn add_to_cart(State(s): State<AppState>, user: Principal, AppJson(r): AppJson<AddToCartRequest>) -> Result<(StatusCode, Json<CartItem>)> {
    let item = cart::add(&s.db, user.id, r.product_id, Quantity::new(r.quantity)?).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn set_quantity(State(s): State<AppState>, user: Principal, AppPath(product_id): AppPath<Uuid>, AppJson(r): AppJson<SetQuantityRequest>) -> Result<Json<Option<CartItem>>> {
    Ok(Json(cart::set_quantity(&s.db, user.id, product_id, r.quantity).await?))
}

pub async fn remove_from_cart(State(s): State<AppState>, user: Principal, AppPath(product_id): AppPath<Uuid>, AppQuery(p): AppQuery<RemoveParams>) -> Result<StatusCode> {
    let by = p.quantity.map(Quantity::new).transpose()?;
    match cart::remove(&s.db, user.id, product_id, by).await? {
        Some(_) => Ok(StatusCode::OK),
        None => Ok(StatusCode::NO_CONTENT),
    }
}

pub async fn sync_cart(State(s): State<AppState>, user: Principal, AppJson(r): AppJson<SyncRequest>) -> Result<Json<CartView>> {
    let items = collapse_sync_items(&r.items)?;
    let cart = cart::sync(&s.db, user.id, &items).await?;
    Ok(Json(CartView::build(cart, &s)?))
}

pub async fn clear_cart(State(s): State<AppState>, user: Principal) -> Result<StatusCode> {
    let mut conn = s.db.acquire().await?;
    cart::clear(&mut conn, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
