use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, UpdateOrderStatusRequest},
    error::{AppError, AppResult},
    models::{OrderDetail, Voucher, VoucherRejection, is_valid_order_status},
    repository::{CartRepo, NewOrder, NewOrderItem, OrderRepo, ProductRepo, VoucherRepo},
};

/// Turns a priced, discounted cart into a persisted order.
///
/// The commit is deliberately not one transaction: the order and its items
/// are hard-fail inserts, while the stock decrements, the cart clear and
/// the voucher usage increments run afterwards as independent best-effort
/// calls. Once the order row exists, a failure in those later steps is
/// logged and swallowed; the order has already succeeded from the buyer's
/// perspective.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepo>,
    carts: Arc<dyn CartRepo>,
    vouchers: Arc<dyn VoucherRepo>,
    products: Arc<dyn ProductRepo>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepo>,
        carts: Arc<dyn CartRepo>,
        vouchers: Arc<dyn VoucherRepo>,
        products: Arc<dyn ProductRepo>,
    ) -> Self {
        Self {
            orders,
            carts,
            vouchers,
            products,
        }
    }

    pub async fn place_order(
        &self,
        user_id: Uuid,
        payload: CreateOrderRequest,
    ) -> AppResult<OrderDetail> {
        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or(AppError::NotFound("cart"))?;

        if cart.items.is_empty() {
            return Err(AppError::Validation("cart is empty".to_string()));
        }
        for line in &cart.items {
            if line.quantity <= 0 {
                return Err(AppError::Validation("cart has invalid quantity".to_string()));
            }
            if line.variant.stock < line.quantity {
                return Err(AppError::InsufficientStock(line.variant.id));
            }
        }

        let subtotal = cart.subtotal();

        let applied = match payload.voucher_code.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => Some(self.apply_voucher(code, subtotal).await?),
            None => None,
        };

        let discount_amount = applied.as_ref().map(|(_, d)| *d).unwrap_or(0);
        // A fixed voucher above the subtotal drives this negative; kept as-is.
        let total_amount = subtotal - discount_amount;

        let order_id = self
            .orders
            .insert(NewOrder {
                user_id,
                voucher_id: applied.as_ref().map(|(v, _)| v.id),
                discount_amount,
                total_amount,
                status: "pending".to_string(),
                shipping_address: payload.shipping_address,
            })
            .await?;

        let items = cart
            .items
            .iter()
            .map(|line| NewOrderItem {
                product_variant_id: line.variant.id,
                // freeze the unit price at time of purchase
                price: line.variant.price,
                quantity: line.quantity,
            })
            .collect();
        self.orders.insert_items(order_id, items).await?;

        // The order exists from here on; nothing below may undo it.
        for line in &cart.items {
            if let Err(err) = self
                .products
                .adjust_stock(line.variant.id, -line.quantity)
                .await
            {
                tracing::error!(
                    error = %err,
                    variant_id = %line.variant.id,
                    "failed to update stock"
                );
            }
        }

        if let Err(err) = self.carts.clear(cart.id).await {
            tracing::error!(error = %err, cart_id = %cart.id, "failed to clear cart");
        }

        if let Some((voucher, _)) = &applied {
            if let Err(err) = self.vouchers.increment_used_count(voucher.id).await {
                tracing::error!(
                    error = %err,
                    voucher_id = %voucher.id,
                    "failed to increment voucher usage"
                );
            }
            if let Err(err) = self.vouchers.increment_user_usage(user_id, voucher.id).await {
                tracing::error!(
                    error = %err,
                    voucher_id = %voucher.id,
                    "failed to record per-user voucher usage"
                );
            }
        }

        self.orders
            .find_detail(order_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow!("order {order_id} missing after insert")))
    }

    pub async fn get_order(&self, id: Uuid) -> AppResult<OrderDetail> {
        self.orders
            .find_detail(id)
            .await?
            .ok_or(AppError::NotFound("order"))
    }

    pub async fn list_user_orders(&self, user_id: Uuid) -> AppResult<Vec<OrderDetail>> {
        self.orders.list_by_user(user_id).await
    }

    /// Status writes are unguarded: any of the five known statuses may
    /// replace any other. Never touches inventory or vouchers.
    pub async fn update_status(&self, payload: UpdateOrderStatusRequest) -> AppResult<()> {
        if !is_valid_order_status(&payload.status) {
            return Err(AppError::Validation(format!(
                "invalid order status {:?}",
                payload.status
            )));
        }
        self.orders
            .update_status(payload.order_id, &payload.status)
            .await
    }

    async fn apply_voucher(&self, code: &str, subtotal: i64) -> AppResult<(Voucher, i64)> {
        let voucher = self
            .vouchers
            .find_by_code(code)
            .await?
            .ok_or(AppError::VoucherRejected(VoucherRejection::UnknownCode))?;

        let discount = voucher
            .evaluate(subtotal, Utc::now())
            .map_err(AppError::VoucherRejected)?;

        Ok((voucher, discount))
    }
}
