use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    entity::{
        user_vouchers::{
            ActiveModel as UserVoucherActive, Column as UserVoucherCol, Entity as UserVouchers,
        },
        vouchers::{
            ActiveModel as VoucherActive, Column as VoucherCol, Entity as Vouchers,
            Model as VoucherModel,
        },
    },
    error::{AppError, AppResult},
    models::{DiscountType, Voucher},
};

#[async_trait]
pub trait VoucherRepo: Send + Sync {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Voucher>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Voucher>>;
    async fn list_all(&self) -> AppResult<Vec<Voucher>>;
    async fn list_active(&self) -> AppResult<Vec<Voucher>>;
    async fn insert(&self, voucher: Voucher) -> AppResult<Voucher>;
    async fn update(&self, voucher: Voucher) -> AppResult<()>;
    /// Soft delete: flips `is_active` instead of removing the row, so
    /// orders that reference the voucher keep resolving its code.
    async fn deactivate(&self, id: Uuid) -> AppResult<()>;
    /// Single-statement `used_count = used_count + 1`; the check against
    /// `usage_limit` happens earlier, without isolation (documented race).
    async fn increment_used_count(&self, voucher_id: Uuid) -> AppResult<()>;
    async fn increment_user_usage(&self, user_id: Uuid, voucher_id: Uuid) -> AppResult<()>;
}

pub struct OrmVoucherRepo {
    conn: DatabaseConnection,
}

impl OrmVoucherRepo {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl VoucherRepo for OrmVoucherRepo {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Voucher>> {
        let model = Vouchers::find()
            .filter(VoucherCol::Code.eq(code))
            .one(&self.conn)
            .await?;
        model.map(voucher_from_entity).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Voucher>> {
        let model = Vouchers::find_by_id(id).one(&self.conn).await?;
        model.map(voucher_from_entity).transpose()
    }

    async fn list_all(&self) -> AppResult<Vec<Voucher>> {
        Vouchers::find()
            .order_by_desc(VoucherCol::CreatedAt)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(voucher_from_entity)
            .collect()
    }

    async fn list_active(&self) -> AppResult<Vec<Voucher>> {
        let now = Utc::now();
        let condition = Condition::all()
            .add(VoucherCol::IsActive.eq(true))
            .add(
                Condition::any()
                    .add(VoucherCol::StartAt.is_null())
                    .add(VoucherCol::StartAt.lte(now)),
            )
            .add(
                Condition::any()
                    .add(VoucherCol::EndAt.is_null())
                    .add(VoucherCol::EndAt.gte(now)),
            );

        Vouchers::find()
            .filter(condition)
            .order_by_desc(VoucherCol::CreatedAt)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(voucher_from_entity)
            .collect()
    }

    async fn insert(&self, voucher: Voucher) -> AppResult<Voucher> {
        let model = voucher_to_active(voucher).insert(&self.conn).await?;
        voucher_from_entity(model)
    }

    async fn update(&self, voucher: Voucher) -> AppResult<()> {
        voucher_to_active(voucher).update(&self.conn).await?;
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let result = Vouchers::update_many()
            .col_expr(VoucherCol::IsActive, Expr::value(false))
            .filter(VoucherCol::Id.eq(id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("voucher"));
        }
        Ok(())
    }

    async fn increment_used_count(&self, voucher_id: Uuid) -> AppResult<()> {
        Vouchers::update_many()
            .col_expr(
                VoucherCol::UsedCount,
                Expr::col(VoucherCol::UsedCount).add(1),
            )
            .filter(VoucherCol::Id.eq(voucher_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    async fn increment_user_usage(&self, user_id: Uuid, voucher_id: Uuid) -> AppResult<()> {
        let existing = UserVouchers::find()
            .filter(
                Condition::all()
                    .add(UserVoucherCol::UserId.eq(user_id))
                    .add(UserVoucherCol::VoucherId.eq(voucher_id)),
            )
            .one(&self.conn)
            .await?;

        match existing {
            Some(row) => {
                UserVouchers::update_many()
                    .col_expr(
                        UserVoucherCol::UsedCount,
                        Expr::col(UserVoucherCol::UsedCount).add(1),
                    )
                    .filter(UserVoucherCol::Id.eq(row.id))
                    .exec(&self.conn)
                    .await?;
            }
            None => {
                UserVoucherActive {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    voucher_id: Set(voucher_id),
                    used_count: Set(1),
                }
                .insert(&self.conn)
                .await?;
            }
        }
        Ok(())
    }
}

fn voucher_from_entity(model: VoucherModel) -> AppResult<Voucher> {
    let discount_type = DiscountType::parse(&model.discount_type)
        .ok_or_else(|| anyhow!("unknown discount type {:?}", model.discount_type))?;

    Ok(Voucher {
        id: model.id,
        code: model.code,
        description: model.description,
        discount_type,
        discount_value: model.discount_value,
        min_order_value: model.min_order_value,
        max_discount_value: model.max_discount_value,
        usage_limit: model.usage_limit,
        usage_per_user: model.usage_per_user,
        used_count: model.used_count,
        start_at: model.start_at.map(|dt| dt.with_timezone(&Utc)),
        end_at: model.end_at.map(|dt| dt.with_timezone(&Utc)),
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn voucher_to_active(voucher: Voucher) -> VoucherActive {
    VoucherActive {
        id: Set(voucher.id),
        code: Set(voucher.code),
        description: Set(voucher.description),
        discount_type: Set(voucher.discount_type.as_str().to_string()),
        discount_value: Set(voucher.discount_value),
        min_order_value: Set(voucher.min_order_value),
        max_discount_value: Set(voucher.max_discount_value),
        usage_limit: Set(voucher.usage_limit),
        usage_per_user: Set(voucher.usage_per_user),
        used_count: Set(voucher.used_count),
        start_at: Set(voucher.start_at.map(Into::into)),
        end_at: Set(voucher.end_at.map(Into::into)),
        is_active: Set(voucher.is_active),
        created_at: Set(voucher.created_at.into()),
    }
}
