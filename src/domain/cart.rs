use super::money::{self, Amount};
use super::order::OrderItem;
use super::product::Product;
use crate::error::{Result, StorefrontError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A cart row as the store holds it. Quantity is always positive: a quantity
/// update to zero or below deletes the row instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// A cart entry joined with its live product record.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub entry: CartEntry,
    pub product: Product,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.entry.quantity)
    }
}

pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::subtotal).sum()
}

/// Everything the checkout flow needs to materialize an order request:
/// the chargeable amount, the display title, and the frozen line items.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutDraft {
    pub amount: Amount,
    pub title: String,
    pub items: Vec<OrderItem>,
}

impl CheckoutDraft {
    /// Aggregates the current cart lines. Refuses an empty cart and a
    /// non-positive amount before any network call is made.
    pub fn from_lines(lines: &[CartLine]) -> Result<Self> {
        if lines.is_empty() {
            return Err(StorefrontError::Validation(
                "장바구니가 비어있습니다.".to_string(),
            ));
        }

        let amount = money::checkout_amount(cart_total(lines))?;
        Ok(Self {
            amount,
            title: order_title(lines),
            items: lines.iter().map(snapshot).collect(),
        })
    }
}

/// Single item: that item's name. Several: "<first> 외 <n-1>건".
fn order_title(lines: &[CartLine]) -> String {
    let first = lines[0].product.name.as_str();
    if lines.len() == 1 {
        first.to_string()
    } else {
        format!("{} 외 {}건", first, lines.len() - 1)
    }
}

fn snapshot(line: &CartLine) -> OrderItem {
    OrderItem {
        product_id: line.product.id.clone(),
        name: line.product.name.clone(),
        price: line.product.price,
        quantity: line.entry.quantity,
        image_url: line.product.image_url.clone(),
    }
}
