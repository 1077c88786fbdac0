//! Saved addresses. Each user has at most one default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::Address;
use crate::repository::single_row;
use crate::{Result, StoreError};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedAddress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub address: AddressColumns,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Column-wise mirror of [`Address`].
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AddressColumns {
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl From<AddressColumns> for Address {
    fn from(c: AddressColumns) -> Self {
        Address {
            full_name: c.full_name, line1: c.line1, line2: c.line2, city: c.city,
            region: c.region, postal_code: c.postal_code, country: c.country, phone: c.phone,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    #[validate(length(max = 50))]
    pub label: Option<String>,
    #[serde(flatten)]
    #[validate]
    pub address: Address,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn list(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<SavedAddress>> {
    Ok(sqlx::query_as::<_, SavedAddress>("SELECT * FROM addresses WHERE user_id = ? ORDER BY is_default DESC, created_at, id")
        .bind(user_id).fetch_all(pool).await?)
}

async fn find_owned(conn: &mut SqliteConnection, user_id: Uuid, id: Uuid) -> Result<SavedAddress> {
    sqlx::query_as::<_, SavedAddress>("SELECT * FROM addresses WHERE id = ? AND user_id = ?")
        .bind(id).bind(user_id).fetch_optional(&mut *conn).await?
        .ok_or_else(|| StoreError::NotFound("Address".into()))
}

async fn clear_default(conn: &mut SqliteConnection, user_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE addresses SET is_default = 0 WHERE user_id = ? AND is_default = 1").bind(user_id).execute(&mut *conn).await?;
    Ok(())
}

/// The given saved address, or the user's default when `id` is `None`.
pub async fn resolve(pool: &SqlitePool, user_id: Uuid, id: Option<Uuid>) -> Result<Option<Address>> {
    let saved = match id {
        Some(id) => Some(find_owned(&mut *pool.acquire().await?, user_id, id).await?),
        None => sqlx::query_as::<_, SavedAddress>("SELECT * FROM addresses WHERE user_id = ? AND is_default = 1")
            .bind(user_id).fetch_optional(pool).await?,
    };
    Ok(saved.map(|s| s.address.into()))
}

/// The first saved address becomes the default regardless of `is_default`.
pub async fn create(pool: &SqlitePool, user_id: Uuid, new: &NewAddress) -> Result<SavedAddress> {
    let mut tx = pool.begin().await?;
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM addresses WHERE user_id = ?").bind(user_id).fetch_one(&mut *tx).await?;
    let make_default = new.is_default || existing.0 == 0;
    if make_default { clear_default(&mut tx, user_id).await?; }
    let a = &new.address;
    let saved = sqlx::query_as::<_, SavedAddress>(
        "INSERT INTO addresses (id, user_id, label, full_name, line1, line2, city, region, postal_code, country, phone, is_default, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *")
        .bind(Uuid::now_v7()).bind(user_id).bind(&new.label).bind(&a.full_name).bind(&a.line1).bind(&a.line2)
        .bind(&a.city).bind(&a.region).bind(&a.postal_code).bind(&a.country).bind(&a.phone).bind(make_default).bind(Utc::now())
        .fetch_all(&mut *tx).await
        .and_then(single_row)?;
    tx.commit().await?;
    Ok(saved)
}

pub async fn set_default(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<SavedAddress> {
    let mut tx = pool.begin().await?;
    let mut saved = find_owned(&mut tx, user_id, id).await?;
    clear_default(&mut tx, user_id).await?;
    sqlx::query("UPDATE addresses SET is_default = 1 WHERE id = ?").bind(id).execute(&mut *tx).await?;
    tx.commit().await?;
    saved.is_default = true;
    Ok(saved)
}

/// Deleting the default promotes the oldest remaining address.
pub async fn delete(pool: &SqlitePool, user_id: Uuid, id: Uuid) -> Result<()> {
    let mut tx = pool.begin().await?;
    let saved = find_owned(&mut tx, user_id, id).await?;
    sqlx::query("DELETE FROM addresses WHERE id = ?").bind(id).execute(&mut *tx).await?;
    if saved.is_default {
        sqlx::query("UPDATE addresses SET is_default = 1 WHERE id = (SELECT id FROM addresses WHERE user_id = ? ORDER BY created_at, id LIMIT 1)")
            .bind(user_id).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}
