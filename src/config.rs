//! Environment configuration. `.env` is loaded by `main` before this runs.

use std::env;
use std::str::FromStr;
use anyhow::{Context, Result};
use crate::domain::value_objects::Money;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub nats_url: Option<String>,
    pub event_subject_prefix: String,
    /// Flat shipping charged per order; zero until a shipping policy exists.
    pub shipping_flat_rate: Money,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://storefront.db?mode=rwc".to_string(),
            db_max_connections: 10,
            port: 8083,
            nats_url: None,
            event_subject_prefix: "storefront".to_string(),
            shipping_flat_rate: Money::ZERO,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let shipping_flat_rate = parse_or(&get, "SHIPPING_FLAT_RATE", defaults.shipping_flat_rate)?;
        if shipping_flat_rate.is_negative() {
            anyhow::bail!("SHIPPING_FLAT_RATE cannot be negative");
        }
        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            port: parse_or(&get, "PORT", defaults.port)?,
            nats_url: get("NATS_URL").filter(|s| !s.is_empty()),
            event_subject_prefix: get("EVENT_SUBJECT_PREFIX").unwrap_or(defaults.event_subject_prefix),
            shipping_flat_rate,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}
