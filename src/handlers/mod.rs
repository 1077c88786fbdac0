//! HTTP handlers. Every handler returns `Result<_, StoreError>`; the error maps itself to a JSON
//! body.

pub mod addresses;
pub mod cart;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use serde::{Deserialize, Serialize};
use crate::StoreError;

/// `axum::Json` whose rejection is a [`StoreError`], so malformed bodies get the JSON error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(StoreError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` with a [`StoreError`] rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(StoreError))]
pub struct AppPath<T>(pub T);

/// `axum::extract::Query` with a [`StoreError`] rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(StoreError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, Default, Deserialize)]
pub struct ListParams { pub page: Option<u32>, pub per_page: Option<u32>, pub search: Option<String> }

impl ListParams {
    /// `(page, limit, offset)`; pages start at 1 and hold at most 100 rows.
    pub fn window(&self) -> (u32, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page as i64, ((page - 1) as i64) * per_page as i64)
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: i64, pub page: u32 }
