//! Domain events
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::{OrderStatus, PaymentStatus};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, order_number: String, user_id: Uuid, total: Money, item_count: usize },
    Paid { order_id: Uuid },
    Fulfilled { order_id: Uuid, status: OrderStatus },
    Cancelled { order_id: Uuid, payment_status: PaymentStatus },
}

impl OrderEvent {
    /// Subject suffix under the configured prefix.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "order.placed",
            Self::Paid { .. } => "order.paid",
            Self::Fulfilled { .. } => "order.fulfilled",
            Self::Cancelled { .. } => "order.cancelled",
        }
    }
}
