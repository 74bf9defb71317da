use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        product_variants::Entity as ProductVariants,
    },
    error::{AppError, AppResult},
    models::{Cart, CartLine},
    repository::product::{product_names, variant_from_entity},
};

#[async_trait]
pub trait CartRepo: Send + Sync {
    /// Load the user's cart with every line's variant resolved. `None`
    /// means the user has no cart yet, which callers treat differently
    /// from a storage failure.
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Cart>>;
    async fn create(&self, user_id: Uuid) -> AppResult<Cart>;
    async fn add_item(&self, cart_id: Uuid, variant_id: Uuid, quantity: i32) -> AppResult<Uuid>;
    async fn update_item_quantity(&self, item_id: Uuid, quantity: i32) -> AppResult<()>;
    async fn remove_item(&self, item_id: Uuid) -> AppResult<()>;
    async fn clear(&self, cart_id: Uuid) -> AppResult<()>;
}

pub struct OrmCartRepo {
    conn: DatabaseConnection,
}

impl OrmCartRepo {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn load_lines(&self, cart_id: Uuid) -> AppResult<Vec<CartLine>> {
        let rows = CartItems::find()
            .filter(CartItemCol::CartId.eq(cart_id))
            .find_also_related(ProductVariants)
            .all(&self.conn)
            .await?;

        let names = product_names(
            &self.conn,
            rows.iter()
                .filter_map(|(_, v)| v.as_ref().map(|v| v.product_id))
                .collect(),
        )
        .await?;

        let lines = rows
            .into_iter()
            .filter_map(|(item, variant)| {
                let variant = variant?;
                let name = names.get(&variant.product_id).cloned().unwrap_or_default();
                Some(CartLine {
                    id: item.id,
                    quantity: item.quantity,
                    variant: variant_from_entity(variant, name),
                })
            })
            .collect();

        Ok(lines)
    }

    async fn cart_from_entity(&self, model: CartModel) -> AppResult<Cart> {
        let items = self.load_lines(model.id).await?;
        Ok(Cart {
            id: model.id,
            user_id: model.user_id,
            created_at: model.created_at.with_timezone(&Utc),
            items,
        })
    }
}

#[async_trait]
impl CartRepo for OrmCartRepo {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Cart>> {
        let cart = Carts::find()
            .filter(CartCol::UserId.eq(user_id))
            .one(&self.conn)
            .await?;

        match cart {
            Some(model) => Ok(Some(self.cart_from_entity(model).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, user_id: Uuid) -> AppResult<Cart> {
        let model = CartActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: NotSet,
        }
        .insert(&self.conn)
        .await?;

        Ok(Cart {
            id: model.id,
            user_id: model.user_id,
            created_at: model.created_at.with_timezone(&Utc),
            items: Vec::new(),
        })
    }

    async fn add_item(&self, cart_id: Uuid, variant_id: Uuid, quantity: i32) -> AppResult<Uuid> {
        let item = CartItemActive {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart_id),
            product_variant_id: Set(variant_id),
            quantity: Set(quantity),
            created_at: NotSet,
        }
        .insert(&self.conn)
        .await?;

        Ok(item.id)
    }

    async fn update_item_quantity(&self, item_id: Uuid, quantity: i32) -> AppResult<()> {
        let result = CartItems::update_many()
            .col_expr(CartItemCol::Quantity, Expr::value(quantity))
            .filter(CartItemCol::Id.eq(item_id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("cart item"));
        }
        Ok(())
    }

    async fn remove_item(&self, item_id: Uuid) -> AppResult<()> {
        let result = CartItems::delete_many()
            .filter(CartItemCol::Id.eq(item_id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("cart item"));
        }
        Ok(())
    }

    async fn clear(&self, cart_id: Uuid) -> AppResult<()> {
        CartItems::delete_many()
            .filter(CartItemCol::CartId.eq(cart_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
