use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::Product;
use crate::handlers::{AppJson, AppPath, AppQuery, ListParams, PaginatedResponse};
use crate::principal::Admin;
use crate::repository::products::{self, NewProduct, ProductUpdate};
use crate::{AppState, Result, StoreError};

pub async fn list_products(State(s): State<AppState>, AppQuery(p): AppQuery<ListParams>) -> Result<Json<PaginatedResponse<Product>>> {
    let (page, limit, offset) = p.window();
    let search = p.search.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let (data, total) = products::list(&s.db, limit, offset, search).await?;
    Ok(Json(PaginatedResponse { data, total, page }))
}

pub async fn get_product(State(s): State<AppState>, AppPath(slug): AppPath<String>) -> Result<Json<Product>> {
    products::find_by_slug(&s.db, &slug).await?.map(Json).ok_or_else(|| StoreError::NotFound("Product".into()))
}

pub async fn create_product(State(s): State<AppState>, Admin(admin): Admin, AppJson(r): AppJson<NewProduct>) -> Result<(StatusCode, Json<Product>)> {
    r.validate()?;
    let p = products::create(&s.db, &r).await?;
    tracing::info!(product_id = %p.id, slug = %p.slug, admin = %admin.id, "product created");
    Ok((StatusCode::CREATED, Json(p)))
}

pub async fn update_product(State(s): State<AppState>, Admin(_): Admin, AppPath(id): AppPath<Uuid>, AppJson(r): AppJson<ProductUpdate>) -> Result<Json<Product>> {
    r.validate()?;
    Ok(Json(products::update(&s.db, id, &r).await?))
}

pub async fn delete_product(State(s): State<AppState>, Admin(_): Admin, AppPath(id): AppPath<Uuid>) -> Result<StatusCode> {
    products::deactivate(&s.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
