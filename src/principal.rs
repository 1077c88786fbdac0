//! Authenticated caller, as forwarded by the auth gateway in front of this service.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::StoreError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role { #[default] Customer, Admin }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    /// `None` for admins, who see every user's records.
    pub fn owner_scope(&self) -> Option<Uuid> { if self.is_admin() { None } else { Some(self.id) } }

    pub fn from_parts(parts: &Parts) -> Result<Self, StoreError> {
        let id = parts.headers.get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or(StoreError::Unauthorized)?;
        let role = match parts.headers.get(USER_ROLE_HEADER).and_then(|v| v.to_str().ok()).map(str::trim) {
            Some(r) if r.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::Customer,
        };
        Ok(Self { id, role })
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Principal::from_parts(parts)
    }
}

/// A principal holding the admin role.
#[derive(Clone, Copy, Debug)]
pub struct Admin(pub Principal);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_parts(parts)?;
        if !principal.is_admin() { return Err(StoreError::Forbidden); }
        Ok(Admin(principal))
    }
}
