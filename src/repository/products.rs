//! Catalog storage.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;
use validator::{Validate, ValidationError};
use crate::domain::aggregates::{slug_candidate, slugify, Product};
use crate::domain::value_objects::Money;
use crate::repository::{is_unique_violation, single_row};
use crate::{Result, StoreError};

/// Slug probing gives up after this many taken candidates.
const MAX_SLUG_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Money,
    #[serde(default)]
    #[validate(custom = "non_negative")]
    pub tax: Money,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Option<Money>,
    #[validate(custom = "non_negative")]
    pub tax: Option<Money>,
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
}

fn non_negative(m: &Money) -> std::result::Result<(), ValidationError> {
    if m.is_negative() { Err(ValidationError::new("negative_amount")) } else { Ok(()) }
}

pub async fn list(pool: &SqlitePool, limit: i64, offset: i64, search: Option<&str>) -> Result<(Vec<Product>, i64)> {
    let pattern = search.map(|s| format!("%{}%", s.trim()));
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE active = 1 AND (?1 IS NULL OR name LIKE ?1) ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3")
        .bind(&pattern).bind(limit).bind(offset).fetch_all(pool).await?;
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE active = 1 AND (?1 IS NULL OR name LIKE ?1)")
        .bind(&pattern).fetch_one(pool).await?;
    Ok((products, total.0))
}

pub async fn find(conn: impl SqliteExecutor<'_>, id: Uuid) -> Result<Option<Product>> {
    Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?").bind(id).fetch_optional(conn).await?)
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Product>> {
    Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = ? AND active = 1").bind(slug).fetch_optional(pool).await?)
}

/// Inserts under the first free slug of `base`, `base-2`, `base-3`, ...
pub async fn create(pool: &SqlitePool, new: &NewProduct) -> Result<Product> {
    let base = slugify(&new.name);
    let now = Utc::now();
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let slug = slug_candidate(&base, attempt);
        let inserted = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, slug, description, price, tax, stock, active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?) RETURNING *")
            .bind(Uuid::now_v7()).bind(new.name.trim()).bind(&slug).bind(&new.description)
            .bind(new.price.to_string()).bind(new.tax.to_string()).bind(new.stock).bind(now).bind(now)
            .fetch_all(pool).await
            .and_then(single_row);
        match inserted {
            Ok(p) => return Ok(p),
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!(slug = %slug, "slug taken, probing next");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(StoreError::Conflict(format!("no free slug for {base:?}")))
}

pub async fn update(pool: &SqlitePool, id: Uuid, changes: &ProductUpdate) -> Result<Product> {
    let current = find(pool, id).await?.ok_or_else(|| StoreError::NotFound("Product".into()))?;
    let rows = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = ?2, description = ?3, price = ?4, tax = ?5, stock = ?6, updated_at = ?7 WHERE id = ?1 RETURNING *")
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim).unwrap_or(&current.name))
        .bind(changes.description.as_ref().or(current.description.as_ref()))
        .bind(changes.price.unwrap_or(current.price).to_string())
        .bind(changes.tax.unwrap_or(current.tax).to_string())
        .bind(changes.stock.unwrap_or(current.stock))
        .bind(Utc::now())
        .fetch_all(pool).await?;
    rows.into_iter().next().ok_or_else(|| StoreError::NotFound("Product".into()))
}

/// Soft delete; order items keep their own copy of name and price.
pub async fn deactivate(pool: &SqlitePool, id: Uuid) -> Result<()> {
    let done = sqlx::query("UPDATE products SET active = 0, updated_at = ? WHERE id = ? AND active = 1")
        .bind(Utc::now()).bind(id).execute(pool).await?;
    if done.rows_affected() == 0 { return Err(StoreError::NotFound("Product".into())); }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{file_pool, memory_pool, new_product, on_each_connection};

    #[tokio::test]
    async fn test_slug_collisions_probe_linearly() {
        let pool = memory_pool().await;
        let a = create(&pool, &new_product("Coffee Mug", "9.99")).await.unwrap();
        let b = create(&pool, &new_product("Coffee  Mug!", "9.99")).await.unwrap();
        let c = create(&pool, &new_product("coffee mug", "9.99")).await.unwrap();
        assert_eq!(a.slug, "coffee-mug");
        assert_eq!(b.slug, "coffee-mug-2");
        assert_eq!(c.slug, "coffee-mug-3");
    }

    #[tokio::test]
    async fn test_update_keeps_slug_and_unset_fields() {
        let pool = memory_pool().await;
        let p = create(&pool, &new_product("Lamp", "30.00")).await.unwrap();
        let changes = ProductUpdate { name: Some("Desk Lamp".into()), price: Some("25.00".parse().unwrap()), ..Default::default() };
        let updated = update(&pool, p.id, &changes).await.unwrap();
        assert_eq!(updated.name, "Desk Lamp");
        assert_eq!(updated.slug, "lamp");
        assert_eq!(updated.price, "25.00".parse().unwrap());
        assert_eq!(updated.stock, p.stock);
    }

    #[tokio::test]
    async fn test_writes_are_visible_to_every_connection() {
        let (_dir, pool) = file_pool().await;
        let p = create(&pool, &new_product("Teapot", "2.00")).await.unwrap();
        let names = on_each_connection(&pool, "SELECT name FROM products WHERE id = ?", p.id).await;
        assert!(names.iter().all(|n| n.as_deref() == Some("Teapot")), "{names:?}");

        let changes = ProductUpdate { price: Some("9.00".parse().unwrap()), ..Default::default() };
        let updated = update(&pool, p.id, &changes).await.unwrap();
        assert_eq!(updated.price, "9.00".parse().unwrap());
        let prices = on_each_connection(&pool, "SELECT price FROM products WHERE id = ?", p.id).await;
        assert!(prices.iter().all(|v| v.as_deref() == Some("9.00")), "{prices:?}");
    }

    #[tokio::test]
    async fn test_deactivated_products_leave_listing() {
        let pool = memory_pool().await;
        let keep = create(&pool, &new_product("Red Chair", "40.00")).await.unwrap();
        let gone = create(&pool, &new_product("Blue Chair", "40.00")).await.unwrap();
        deactivate(&pool, gone.id).await.unwrap();

        let (items, total) = list(&pool, 20, 0, None).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, keep.id);
        assert!(find_by_slug(&pool, "blue-chair").await.unwrap().is_none());
        assert!(matches!(deactivate(&pool, gone.id).await, Err(StoreError::NotFound(_))));

        let (found, _) = list(&pool, 20, 0, Some("red")).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_validation() {
        let mut p = new_product("Thing", "1.00");
        assert!(p.validate().is_ok());
        p.price = "-1".parse().unwrap();
        assert!(p.validate().is_err());
        let mut p = new_product("", "1.00");
        assert!(p.validate().is_err());
        p.name = "x".into();
        p.stock = -3;
        assert!(p.validate().is_err());
    }
}
