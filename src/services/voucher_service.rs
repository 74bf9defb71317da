use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::vouchers::{
        CreateVoucherRequest, UpdateVoucherRequest, ValidateVoucherRequest,
        ValidateVoucherResponse,
    },
    error::{AppError, AppResult},
    models::{Voucher, VoucherRejection},
    repository::VoucherRepo,
};

#[derive(Clone)]
pub struct VoucherService {
    vouchers: Arc<dyn VoucherRepo>,
}

impl VoucherService {
    pub fn new(vouchers: Arc<dyn VoucherRepo>) -> Self {
        Self { vouchers }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Voucher>> {
        self.vouchers.list_all().await
    }

    pub async fn list_active(&self) -> AppResult<Vec<Voucher>> {
        self.vouchers.list_active().await
    }

    pub async fn get_by_code(&self, code: &str) -> AppResult<Voucher> {
        self.vouchers
            .find_by_code(code)
            .await?
            .ok_or(AppError::NotFound("voucher"))
    }

    pub async fn create(&self, payload: CreateVoucherRequest) -> AppResult<Voucher> {
        if self.vouchers.find_by_code(&payload.code).await?.is_some() {
            return Err(AppError::Validation(
                "voucher code already exists".to_string(),
            ));
        }

        let voucher = Voucher {
            id: Uuid::new_v4(),
            code: payload.code,
            description: payload.description,
            discount_type: payload.discount_type,
            discount_value: payload.discount_value,
            min_order_value: payload.min_order_value,
            max_discount_value: payload.max_discount_value,
            usage_limit: payload.usage_limit,
            usage_per_user: payload.usage_per_user.unwrap_or(1),
            used_count: 0,
            start_at: payload.start_at,
            end_at: payload.end_at,
            is_active: true,
            created_at: Utc::now(),
        };

        self.vouchers.insert(voucher).await
    }

    pub async fn update(&self, payload: UpdateVoucherRequest) -> AppResult<Voucher> {
        let mut voucher = self
            .vouchers
            .find_by_id(payload.id)
            .await?
            .ok_or(AppError::NotFound("voucher"))?;

        if let Some(description) = payload.description {
            voucher.description = Some(description);
        }
        if let Some(discount_type) = payload.discount_type {
            voucher.discount_type = discount_type;
        }
        if let Some(discount_value) = payload.discount_value {
            voucher.discount_value = discount_value;
        }
        if let Some(min_order_value) = payload.min_order_value {
            voucher.min_order_value = min_order_value;
        }
        if let Some(max_discount_value) = payload.max_discount_value {
            voucher.max_discount_value = Some(max_discount_value);
        }
        if let Some(usage_limit) = payload.usage_limit {
            voucher.usage_limit = Some(usage_limit);
        }
        if let Some(usage_per_user) = payload.usage_per_user {
            voucher.usage_per_user = usage_per_user;
        }
        if let Some(start_at) = payload.start_at {
            voucher.start_at = Some(start_at);
        }
        if let Some(end_at) = payload.end_at {
            voucher.end_at = Some(end_at);
        }
        if let Some(is_active) = payload.is_active {
            voucher.is_active = is_active;
        }

        self.vouchers.update(voucher.clone()).await?;
        Ok(voucher)
    }

    pub async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        self.vouchers.deactivate(id).await
    }

    /// Read-only pre-checkout check. Runs the same evaluation as checkout,
    /// so both produce the same verdict for the same code and subtotal.
    pub async fn validate(
        &self,
        payload: ValidateVoucherRequest,
    ) -> AppResult<ValidateVoucherResponse> {
        let voucher = match self.vouchers.find_by_code(&payload.code).await? {
            Some(voucher) => voucher,
            None => return Ok(rejection(VoucherRejection::UnknownCode)),
        };

        match voucher.evaluate(payload.order_value, Utc::now()) {
            Ok(discount) => Ok(ValidateVoucherResponse {
                valid: true,
                message: "voucher is valid".to_string(),
                discount_amount: Some(discount),
            }),
            Err(reason) => Ok(rejection(reason)),
        }
    }
}

fn rejection(reason: VoucherRejection) -> ValidateVoucherResponse {
    ValidateVoucherResponse {
        valid: false,
        message: reason.to_string(),
        discount_amount: None,
    }
}
