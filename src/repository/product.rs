use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::{
        product_variants::{Column as VariantCol, Entity as ProductVariants, Model as VariantModel},
        products::{Column as ProductCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::Variant,
};

#[async_trait]
pub trait ProductRepo: Send + Sync {
    async fn find_variant(&self, id: Uuid) -> AppResult<Option<Variant>>;

    /// Apply `delta` to the variant's stock in a single UPDATE. The call is
    /// atomic per statement but deliberately not combined with any other
    /// write; concurrent callers race exactly as the storage layer allows.
    async fn adjust_stock(&self, variant_id: Uuid, delta: i32) -> AppResult<()>;
}

pub struct OrmProductRepo {
    conn: DatabaseConnection,
}

impl OrmProductRepo {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ProductRepo for OrmProductRepo {
    async fn find_variant(&self, id: Uuid) -> AppResult<Option<Variant>> {
        let row = ProductVariants::find_by_id(id)
            .find_also_related(Products)
            .one(&self.conn)
            .await?;

        Ok(row.map(|(variant, product)| {
            let name = product.map(|p| p.name).unwrap_or_default();
            variant_from_entity(variant, name)
        }))
    }

    async fn adjust_stock(&self, variant_id: Uuid, delta: i32) -> AppResult<()> {
        let result = ProductVariants::update_many()
            .col_expr(VariantCol::Stock, Expr::col(VariantCol::Stock).add(delta))
            .filter(VariantCol::Id.eq(variant_id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("product variant"));
        }
        Ok(())
    }
}

pub(crate) fn variant_from_entity(model: VariantModel, product_name: String) -> Variant {
    Variant {
        id: model.id,
        product_id: model.product_id,
        product_name,
        sku: model.sku,
        price: model.price,
        stock: model.stock,
    }
}

/// Resolve product names for a set of variant rows in one query.
pub(crate) async fn product_names(
    conn: &DatabaseConnection,
    product_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, String>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let names = Products::find()
        .filter(ProductCol::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    Ok(names)
}
