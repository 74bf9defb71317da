use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Cart, CartLine};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_variant_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub cart_item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
    pub total_item: i32,
    pub sub_total: i64,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        let sub_total = cart.subtotal();
        // number of lines, not summed quantities
        let total_item = cart.items.len() as i32;
        Self {
            id: cart.id,
            user_id: cart.user_id,
            items: cart.items,
            total_item,
            sub_total,
        }
    }
}
