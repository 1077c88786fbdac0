use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;
use validator::Validate;
use crate::handlers::{AppJson, AppPath};
use crate::principal::Principal;
use crate::repository::addresses::{self, NewAddress, SavedAddress};
use crate::{AppState, Result};

pub async fn list_addresses(State(s): State<AppState>, user: Principal) -> Result<Json<Vec<SavedAddress>>> {
    Ok(Json(addresses::list(&s.db, user.id).await?))
}

pub async fn create_address(State(s): State<AppState>, user: Principal, AppJson(r): AppJson<NewAddress>) -> Result<(StatusCode, Json<SavedAddress>)> {
    r.validate()?;
    Ok((StatusCode::CREATED, Json(addresses::create(&s.db, user.id, &r).await?)))
}

pub async fn set_default_address(State(s): State<AppState>, user: Principal, AppPath(id): AppPath<Uuid>) -> Result<Json<SavedAddress>> {
    Ok(Json(addresses::set_default(&s.db, user.id, id).await?))
}

pub async fn delete_address(State(s): State<AppState>, user: Principal, AppPath(id): AppPath<Uuid>) -> Result<StatusCode> {
    addresses::delete(&s.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
