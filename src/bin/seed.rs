use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use uuid::Uuid;

use axum_storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{product_variants, products, users, vouchers},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let conn = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&conn).await?;

    let admin_id = ensure_user(&conn, "admin@example.com").await?;
    let user_id = ensure_user(&conn, "user@example.com").await?;
    seed_catalog(&conn).await?;
    seed_vouchers(&conn).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(conn: &DatabaseConnection, email: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(conn)
        .await?
    {
        return Ok(existing.id);
    }

    let id = Uuid::new_v4();
    users::Entity::insert(users::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        created_at: Set(Utc::now().into()),
    })
    .exec(conn)
    .await?;

    println!("Ensured user {email}");
    Ok(id)
}

async fn seed_catalog(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let catalog = vec![
        (
            "Axum Hoodie",
            "Warm hoodie for Rustaceans",
            vec![("HOODIE-S", 550_000, 20), ("HOODIE-L", 550_000, 30)],
        ),
        (
            "Ferris Mug",
            "Coffee tastes better with Ferris",
            vec![("MUG-STD", 120_000, 100)],
        ),
        (
            "Rust Sticker Pack",
            "Decorate your laptop",
            vec![("STICKER-10", 50_000, 200)],
        ),
    ];

    for (name, description, variants) in catalog {
        let product = match products::Entity::find()
            .filter(products::Column::Name.eq(name))
            .one(conn)
            .await?
        {
            Some(existing) => existing,
            None => {
                let row = products::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(name.to_string()),
                    description: Set(Some(description.to_string())),
                    created_at: Set(Utc::now().into()),
                };
                let res = products::Entity::insert(row).exec(conn).await?;
                products::Entity::find_by_id(res.last_insert_id)
                    .one(conn)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("seeded product missing"))?
            }
        };

        for (sku, price, stock) in variants {
            let exists = product_variants::Entity::find()
                .filter(product_variants::Column::Sku.eq(sku))
                .one(conn)
                .await?
                .is_some();
            if exists {
                continue;
            }
            product_variants::Entity::insert(product_variants::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                sku: Set(sku.to_string()),
                price: Set(price),
                stock: Set(stock),
                created_at: Set(Utc::now().into()),
            })
            .exec(conn)
            .await?;
        }
    }

    println!("Seeded catalog");
    Ok(())
}

async fn seed_vouchers(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let demo = vec![
        ("SAVE10", "percent", 10, Some(40_000), None),
        ("WELCOME20K", "fixed", 20_000, None, Some(100)),
    ];

    for (code, discount_type, value, cap, limit) in demo {
        let exists = vouchers::Entity::find()
            .filter(vouchers::Column::Code.eq(code))
            .one(conn)
            .await?
            .is_some();
        if exists {
            continue;
        }
        vouchers::Entity::insert(vouchers::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            description: Set(None),
            discount_type: Set(discount_type.to_string()),
            discount_value: Set(value),
            min_order_value: Set(0),
            max_discount_value: Set(cap),
            usage_limit: Set(limit),
            usage_per_user: Set(1),
            used_count: Set(0),
            start_at: Set(None),
            end_at: Set(None),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        })
        .exec(conn)
        .await?;
    }

    println!("Seeded vouchers");
    Ok(())
}
