use std::sync::Arc;

use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::{AppError, AppResult},
    models::Cart,
    repository::{CartRepo, ProductRepo},
};

/// Cart reads and mutations. The cart is created lazily on first access;
/// a user has at most one.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepo>,
    products: Arc<dyn ProductRepo>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepo>, products: Arc<dyn ProductRepo>) -> Self {
        Self { carts, products }
    }

    pub async fn get_cart(&self, user_id: Uuid) -> AppResult<Cart> {
        match self.carts.find_by_user(user_id).await? {
            Some(cart) => Ok(cart),
            None => self.carts.create(user_id).await,
        }
    }

    pub async fn add_item(&self, user_id: Uuid, payload: AddToCartRequest) -> AppResult<Cart> {
        if payload.quantity <= 0 {
            return Err(AppError::Validation(
                "quantity must be greater than 0".to_string(),
            ));
        }

        let cart = self.get_cart(user_id).await?;

        let variant = self
            .products
            .find_variant(payload.product_variant_id)
            .await?
            .ok_or(AppError::NotFound("product variant"))?;

        if variant.stock < payload.quantity {
            return Err(AppError::InsufficientStock(variant.id));
        }

        self.carts
            .add_item(cart.id, variant.id, payload.quantity)
            .await?;

        self.get_cart(user_id).await
    }

    pub async fn update_item(&self, payload: UpdateCartItemRequest) -> AppResult<()> {
        if payload.quantity <= 0 {
            return Err(AppError::Validation(
                "quantity must be greater than 0".to_string(),
            ));
        }
        self.carts
            .update_item_quantity(payload.cart_item_id, payload.quantity)
            .await
    }

    pub async fn remove_item(&self, cart_item_id: Uuid) -> AppResult<()> {
        self.carts.remove_item(cart_item_id).await
    }

    pub async fn clear(&self, user_id: Uuid) -> AppResult<()> {
        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or(AppError::NotFound("cart"))?;
        self.carts.clear(cart.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::cart::CartResponse;
    use crate::services::fakes::Fixture;

    #[tokio::test]
    async fn get_cart_creates_lazily_and_only_once() {
        let fx = Fixture::new();
        let service = fx.cart_service();
        let user_id = Uuid::new_v4();

        let first = service.get_cart(user_id).await.unwrap();
        assert!(first.items.is_empty());

        let second = service.get_cart(user_id).await.unwrap();
        assert_eq!(first.id, second.id, "second access must reuse the cart");
    }

    #[tokio::test]
    async fn add_item_rejects_non_positive_quantity() {
        let fx = Fixture::new();
        let service = fx.cart_service();
        let variant = fx.insert_variant(100_000, 10);

        let err = service
            .add_item(
                Uuid::new_v4(),
                AddToCartRequest {
                    product_variant_id: variant.id,
                    quantity: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn add_item_checks_variant_and_stock() {
        let fx = Fixture::new();
        let service = fx.cart_service();
        let user_id = Uuid::new_v4();

        let err = service
            .add_item(
                user_id,
                AddToCartRequest {
                    product_variant_id: Uuid::new_v4(),
                    quantity: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("product variant")));

        let variant = fx.insert_variant(100_000, 2);
        let err = service
            .add_item(
                user_id,
                AddToCartRequest {
                    product_variant_id: variant.id,
                    quantity: 3,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        let cart = service
            .add_item(
                user_id,
                AddToCartRequest {
                    product_variant_id: variant.id,
                    quantity: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.subtotal(), 200_000);
    }

    #[tokio::test]
    async fn cart_response_counts_lines_not_quantities() {
        let fx = Fixture::new();
        let service = fx.cart_service();
        let user_id = Uuid::new_v4();

        let a = fx.insert_variant(100_000, 10);
        let b = fx.insert_variant(50_000, 10);
        service
            .add_item(
                user_id,
                AddToCartRequest {
                    product_variant_id: a.id,
                    quantity: 3,
                },
            )
            .await
            .unwrap();
        let cart = service
            .add_item(
                user_id,
                AddToCartRequest {
                    product_variant_id: b.id,
                    quantity: 2,
                },
            )
            .await
            .unwrap();

        let resp = CartResponse::from(cart);
        assert_eq!(resp.total_item, 2);
        assert_eq!(resp.sub_total, 400_000);
    }
}
