use super::money::Amount;
use crate::error::{Result, StorefrontError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle. Created `Pending` at insertion time, reaches a terminal
/// state exactly once, driven by the payment redirect outcome.
///
/// Serialises to the platform's wire labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "결제대기")]
    Pending,
    #[serde(rename = "결제완료")]
    Completed,
    #[serde(rename = "결제실패")]
    Failed,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "결제대기",
            Self::Completed => "결제완료",
            Self::Failed => "결제실패",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != Self::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A product snapshot frozen at order-creation time, so later catalog edits
/// never alter historical orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub total: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_key: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

/// Insertion payload. The store assigns the id and timestamp; status is
/// always `Pending` for a fresh order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: String,
    pub title: String,
    pub total: Amount,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Pending → Completed, persisting the provider transaction key when one
    /// came back with the redirect. Re-completing a completed order is a
    /// no-op; a failed order refuses.
    pub fn complete(&mut self, payment_key: Option<String>) -> Result<()> {
        match self.status {
            OrderStatus::Pending => {
                self.status = OrderStatus::Completed;
                if payment_key.is_some() {
                    self.payment_key = payment_key;
                }
                Ok(())
            }
            OrderStatus::Completed => Ok(()),
            OrderStatus::Failed => Err(StorefrontError::InvalidTransition {
                from: OrderStatus::Failed.label(),
                to: OrderStatus::Completed.label(),
            }),
        }
    }

    /// Pending → Failed. Re-failing a failed order is a no-op; a completed
    /// order refuses.
    pub fn fail(&mut self) -> Result<()> {
        match self.status {
            OrderStatus::Pending => {
                self.status = OrderStatus::Failed;
                Ok(())
            }
            OrderStatus::Failed => Ok(()),
            OrderStatus::Completed => Err(StorefrontError::InvalidTransition {
                from: OrderStatus::Completed.label(),
                to: OrderStatus::Failed.label(),
            }),
        }
    }
}

/// Outcome tag carried back by the payment provider's return URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Fail,
}

/// The parsed return URL: outcome tag, order id, and (on success) the
/// provider's transaction key.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRedirect {
    pub outcome: PaymentOutcome,
    pub order_id: String,
    pub payment_key: Option<String>,
}

/// Outbound invocation of the redirect-based card checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutRequest {
    pub amount: Amount,
    pub order_id: String,
    pub order_name: String,
    pub customer_name: String,
    pub success_url: String,
    pub fail_url: String,
}
