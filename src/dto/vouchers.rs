use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{DiscountType, Voucher};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVoucherRequest {
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    #[serde(default)]
    pub min_order_value: i64,
    pub max_discount_value: Option<i64>,
    pub usage_limit: Option<i32>,
    pub usage_per_user: Option<i32>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVoucherRequest {
    pub id: Uuid,
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,
    pub min_order_value: Option<i64>,
    pub max_discount_value: Option<i64>,
    pub usage_limit: Option<i32>,
    pub usage_per_user: Option<i32>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateVoucherRequest {
    pub code: String,
    pub order_value: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateVoucherResponse {
    pub valid: bool,
    pub message: String,
    pub discount_amount: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherList {
    pub items: Vec<Voucher>,
}
