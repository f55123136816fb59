use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog product. Read-only from this system's perspective: the catalog
/// is owned by the hosted platform, and orders snapshot what they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
