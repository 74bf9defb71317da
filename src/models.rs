use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// How a voucher discounts an order subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percent,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percent => "percent",
            DiscountType::Fixed => "fixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "percent" => Some(DiscountType::Percent),
            "fixed" => Some(DiscountType::Fixed),
            _ => None,
        }
    }
}

/// Why a voucher cannot be applied to an order. Each reason is reported
/// verbatim to the caller, both from the validate endpoint and from checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VoucherRejection {
    #[error("invalid voucher code")]
    UnknownCode,
    #[error("voucher is not active")]
    Inactive,
    #[error("voucher not yet valid")]
    NotYetValid,
    #[error("voucher has expired")]
    Expired,
    #[error("order value does not meet voucher minimum")]
    BelowMinimum,
    #[error("voucher usage limit reached")]
    LimitReached,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Voucher {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_value: i64,
    pub max_discount_value: Option<i64>,
    pub usage_limit: Option<i32>,
    pub usage_per_user: i32,
    pub used_count: i32,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Voucher {
    /// Decide whether this voucher applies to `subtotal` at instant `now`
    /// and compute the discount. Pure: never mutates usage counters, so the
    /// pre-checkout validate query and checkout itself agree on the verdict.
    ///
    /// A `fixed` discount is intentionally not clamped to the subtotal; a
    /// voucher worth more than the cart yields a negative total.
    pub fn evaluate(&self, subtotal: i64, now: DateTime<Utc>) -> Result<i64, VoucherRejection> {
        if !self.is_active {
            return Err(VoucherRejection::Inactive);
        }
        if let Some(start_at) = self.start_at {
            if start_at > now {
                return Err(VoucherRejection::NotYetValid);
            }
        }
        if let Some(end_at) = self.end_at {
            if end_at < now {
                return Err(VoucherRejection::Expired);
            }
        }
        if subtotal < self.min_order_value {
            return Err(VoucherRejection::BelowMinimum);
        }
        if let Some(limit) = self.usage_limit {
            if self.used_count >= limit {
                return Err(VoucherRejection::LimitReached);
            }
        }

        let discount = match self.discount_type {
            DiscountType::Percent => {
                let raw = subtotal * self.discount_value / 100;
                match self.max_discount_value {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            DiscountType::Fixed => self.discount_value,
        };

        Ok(discount)
    }
}

/// A sellable unit: one purchasable configuration of a product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub price: i64,
    pub stock: i32,
}

/// A user's pre-checkout selection, with every line's variant resolved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn subtotal(&self) -> i64 {
        self.items
            .iter()
            .map(|line| line.variant.price * i64::from(line.quantity))
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub quantity: i32,
    pub variant: Variant,
}

/// Immutable record of a completed checkout, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub voucher_code: Option<String>,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub status: String,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
}

/// Frozen copy of a cart line at order time. `price` is the unit price at
/// the time of purchase, decoupled from the live variant price.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub product_name: String,
    pub variant: Variant,
    pub price: i64,
    pub quantity: i32,
    pub sub_total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub payment_method: String,
    pub payment_status: String,
    pub paid_at: Option<DateTime<Utc>>,
}

pub const ORDER_STATUSES: [&str; 5] = ["pending", "paid", "shipped", "completed", "cancelled"];

pub fn is_valid_order_status(status: &str) -> bool {
    ORDER_STATUSES.contains(&status)
}
