use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Stored per-user cart header. `discount` and `cart_total` are never
/// persisted; they are recomputed from live product prices on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct CartHeader {
    pub id: u64,
    pub user_id: String,
    pub coupon_code: Option<String>,
}

impl CartHeader {
    /// Coupon code currently attached to this cart, ignoring empty strings.
    pub fn active_coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref().filter(|code| !code.is_empty())
    }
}

/// One product-quantity row belonging to a cart header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: u64,
    pub header_id: u64,
    pub product_id: u64,
    pub count: u32,
}

/// Product snapshot owned by the remote product service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: u64,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub image_url: String,
}

/// Discount kind transmitted as `"PERCENTAGE"` or `"FIXED"` on the wire.
///
/// Any other wire value deserializes to [`DiscountKind::Fixed`]: only the
/// percentage branch is special-cased by the pricing comparison, and
/// unknown kinds price as flat discounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DiscountKind {
    #[default]
    #[serde(rename = "PERCENTAGE")]
    Percentage,
    #[serde(rename = "FIXED")]
    Fixed,
}

impl<'de> Deserialize<'de> for DiscountKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "PERCENTAGE" => DiscountKind::Percentage,
            _ => DiscountKind::Fixed,
        })
    }
}

/// Coupon snapshot owned by the remote coupon service.
///
/// The validity fields (`date_init`, `date_end`, `state_coupon`,
/// `limit_use`, `category`) arrive on the wire but are not evaluated
/// here; the coupon service enforces validity, and pricing applies any
/// stored coupon whose subtotal qualifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(default)]
    pub coupon_id: u64,
    pub coupon_code: String,
    pub discount_amount: f64,
    #[serde(default)]
    pub min_amount: f64,
    #[serde(default)]
    pub amount_type: DiscountKind,
    #[serde(default)]
    pub limit_use: u32,
    #[serde(default)]
    pub date_init: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_state_coupon")]
    pub state_coupon: bool,
}

fn default_state_coupon() -> bool {
    true
}

/// Cart header as returned to callers, with computed totals attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartHeaderView {
    pub cart_header_id: u64,
    pub user_id: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub discount: f64,
    pub cart_total: f64,
}

/// Line item as returned to callers, joined to its product snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub cart_line_id: u64,
    pub cart_header_id: u64,
    pub product_id: u64,
    pub count: u32,
    pub product: Product,
}

/// Fully priced cart: header totals plus enriched line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub header: CartHeaderView,
    pub items: Vec<CartLineView>,
}

impl CartView {
    /// The priced view of a user with no stored cart: zero totals, no items.
    pub fn empty_for_user(user_id: impl Into<String>) -> Self {
        Self {
            header: CartHeaderView {
                cart_header_id: 0,
                user_id: user_id.into(),
                coupon_code: None,
                discount: 0.0,
                cart_total: 0.0,
            },
            items: Vec::new(),
        }
    }
}

/// Quantity mutation applied by the upsert operation.
///
/// `Add` merges into any existing row for the product; `Set` overwrites the
/// count of one specific row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Add { product_id: u64, count: u32 },
    Set { line_id: u64, product_id: u64, count: u32 },
}

impl QuantityChange {
    pub fn product_id(&self) -> u64 {
        match self {
            QuantityChange::Add { product_id, .. } | QuantityChange::Set { product_id, .. } => {
                *product_id
            }
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            QuantityChange::Add { count, .. } | QuantityChange::Set { count, .. } => *count,
        }
    }
}

/// Upsert request as accepted by the cart service.
#[derive(Debug, Clone)]
pub struct CartUpsert {
    pub user_id: String,
    /// Coupon code carried over when the upsert has to create the header.
    pub coupon_code: Option<String>,
    pub change: QuantityChange,
}
