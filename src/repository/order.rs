use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{Column as PaymentCol, Entity as Payments},
        product_variants::Entity as ProductVariants,
        vouchers::Entity as Vouchers,
    },
    error::{AppError, AppResult},
    models::{OrderDetail, OrderLine, Payment},
    repository::product::{product_names, variant_from_entity},
};

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub voucher_id: Option<Uuid>,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub status: String,
    pub shipping_address: String,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_variant_id: Uuid,
    pub price: i64,
    pub quantity: i32,
}

#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn insert(&self, order: NewOrder) -> AppResult<Uuid>;
    async fn insert_items(&self, order_id: Uuid, items: Vec<NewOrderItem>) -> AppResult<()>;
    /// Full order read: items with their variant snapshot, the voucher code
    /// when one was applied, and the payment when one exists.
    async fn find_detail(&self, id: Uuid) -> AppResult<Option<OrderDetail>>;
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<OrderDetail>>;
    /// Unconditional status write; no transition guard.
    async fn update_status(&self, order_id: Uuid, status: &str) -> AppResult<()>;
}

pub struct OrmOrderRepo {
    conn: DatabaseConnection,
}

impl OrmOrderRepo {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn assemble(&self, order: OrderModel) -> AppResult<OrderDetail> {
        let rows = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
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

        let items: Vec<OrderLine> = rows
            .into_iter()
            .filter_map(|(item, variant)| {
                let variant = variant?;
                let name = names.get(&variant.product_id).cloned().unwrap_or_default();
                Some(OrderLine {
                    id: item.id,
                    product_name: name.clone(),
                    variant: variant_from_entity(variant, name),
                    price: item.price,
                    quantity: item.quantity,
                    sub_total: item.price * i64::from(item.quantity),
                })
            })
            .collect();

        let voucher_code = match order.voucher_id {
            Some(voucher_id) => Vouchers::find_by_id(voucher_id)
                .one(&self.conn)
                .await?
                .map(|v| v.code),
            None => None,
        };

        let payment = Payments::find()
            .filter(PaymentCol::OrderId.eq(order.id))
            .one(&self.conn)
            .await?
            .map(|p| Payment {
                id: p.id,
                payment_method: p.payment_method,
                payment_status: p.payment_status,
                paid_at: p.paid_at.map(|dt| dt.with_timezone(&Utc)),
            });

        Ok(OrderDetail {
            id: order.id,
            user_id: order.user_id,
            voucher_code,
            discount_amount: order.discount_amount,
            total_amount: order.total_amount,
            status: order.status,
            shipping_address: order.shipping_address,
            created_at: order.created_at.with_timezone(&Utc),
            items,
            payment,
        })
    }
}

#[async_trait]
impl OrderRepo for OrmOrderRepo {
    async fn insert(&self, order: NewOrder) -> AppResult<Uuid> {
        let model = OrderActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(order.user_id),
            voucher_id: Set(order.voucher_id),
            discount_amount: Set(order.discount_amount),
            total_amount: Set(order.total_amount),
            status: Set(order.status),
            shipping_address: Set(order.shipping_address),
            created_at: NotSet,
        }
        .insert(&self.conn)
        .await?;

        Ok(model.id)
    }

    async fn insert_items(&self, order_id: Uuid, items: Vec<NewOrderItem>) -> AppResult<()> {
        let actives: Vec<OrderItemActive> = items
            .into_iter()
            .map(|item| OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_variant_id: Set(item.product_variant_id),
                price: Set(item.price),
                quantity: Set(item.quantity),
                created_at: NotSet,
            })
            .collect();

        OrderItems::insert_many(actives).exec(&self.conn).await?;
        Ok(())
    }

    async fn find_detail(&self, id: Uuid) -> AppResult<Option<OrderDetail>> {
        let order = Orders::find_by_id(id).one(&self.conn).await?;
        match order {
            Some(model) => Ok(Some(self.assemble(model).await?)),
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<OrderDetail>> {
        let orders = Orders::find()
            .filter(OrderCol::UserId.eq(user_id))
            .order_by_desc(OrderCol::CreatedAt)
            .all(&self.conn)
            .await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            result.push(self.assemble(order).await?);
        }
        Ok(result)
    }

    async fn update_status(&self, order_id: Uuid, status: &str) -> AppResult<()> {
        let result = Orders::update_many()
            .col_expr(OrderCol::Status, Expr::value(status))
            .filter(OrderCol::Id.eq(order_id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("order"));
        }
        Ok(())
    }
}
