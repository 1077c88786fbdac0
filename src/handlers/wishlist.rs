use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;
use crate::handlers::{AppJson, AppPath};
use crate::principal::Principal;
use crate::repository::wishlist::{self, WishlistEntry};
use crate::{AppState, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlistRequest { pub product_id: Uuid }

pub async fn list_wishlist(State(s): State<AppState>, user: Principal) -> Result<Json<Vec<WishlistEntry>>> {
    Ok(Json(wishlist::list(&s.db, user.id).await?))
}

pub async fn add_to_wishlist(State(s): State<AppState>, user: Principal, AppJson(r): AppJson<AddToWishlistRequest>) -> Result<(StatusCode, Json<WishlistEntry>)> {
    Ok((StatusCode::CREATED, Json(wishlist::add(&s.db, user.id, r.product_id).await?)))
}

pub async fn remove_from_wishlist(State(s): State<AppState>, user: Principal, AppPath(product_id): AppPath<Uuid>) -> Result<StatusCode> {
    wishlist::remove(&s.db, user.id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
