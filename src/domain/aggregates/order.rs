//! Order Aggregate
//!
//! Totals and item prices are written once at checkout. Only the status pair moves afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub subtotal: Money,
    #[sqlx(try_from = "String")]
    pub tax: Money,
    #[sqlx(try_from = "String")]
    pub shipping: Money,
    #[sqlx(try_from = "String")]
    pub total: Money,
    pub payment_method: String,
    pub shipping_address: Json<Address>,
    pub billing_address: Json<Address>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at the time of checkout.
    #[sqlx(try_from = "String")]
    pub price: Money,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 2, max = 60))]
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus { #[default] Pending, Paid, Refunded }

impl Order {
    pub fn generate_number() -> String { format!("ORD-{:08}", rand::random::<u32>()) }

    /// Admin cancel. A paid order is marked refunded.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Cancelled | OrderStatus::Delivered => return Err(OrderError::CannotCancel(self.status)),
            _ => {}
        }
        self.status = OrderStatus::Cancelled;
        if self.payment_status == PaymentStatus::Paid { self.payment_status = PaymentStatus::Refunded; }
        self.touch();
        Ok(())
    }

    /// Advances shipping: pending/processing to shipped, shipped to delivered.
    pub fn fulfill(&mut self) -> Result<(), OrderError> {
        self.status = match self.status {
            OrderStatus::Pending | OrderStatus::Processing => OrderStatus::Shipped,
            OrderStatus::Shipped => OrderStatus::Delivered,
            other => return Err(OrderError::CannotFulfill(other)),
        };
        self.touch();
        Ok(())
    }

    pub fn mark_paid(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending || self.payment_status != PaymentStatus::Pending {
            return Err(OrderError::CannotPay(self.status));
        }
        self.payment_status = PaymentStatus::Paid;
        self.status = OrderStatus::Processing;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Processing => "processing", Self::Shipped => "shipped",
            Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone)] pub enum OrderError { CannotCancel(OrderStatus), CannotFulfill(OrderStatus), CannotPay(OrderStatus) }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CannotCancel(s) => write!(f, "cannot cancel an order that is {}", s.as_str()),
            Self::CannotFulfill(s) => write!(f, "cannot fulfill an order that is {}", s.as_str()),
            Self::CannotPay(s) => write!(f, "cannot record payment for an order that is {}", s.as_str()),
        }
    }
}
