use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    repository::{OrmCartRepo, OrmOrderRepo, OrmProductRepo, OrmVoucherRepo},
    services::{CartService, OrderService, VoucherService},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub carts: CartService,
    pub vouchers: VoucherService,
    pub orders: OrderService,
}

impl AppState {
    pub fn new(orm: DatabaseConnection) -> Self {
        let cart_repo = Arc::new(OrmCartRepo::new(orm.clone()));
        let product_repo = Arc::new(OrmProductRepo::new(orm.clone()));
        let voucher_repo = Arc::new(OrmVoucherRepo::new(orm.clone()));
        let order_repo = Arc::new(OrmOrderRepo::new(orm.clone()));

        Self {
            carts: CartService::new(cart_repo.clone(), product_repo.clone()),
            vouchers: VoucherService::new(voucher_repo.clone()),
            orders: OrderService::new(order_repo, cart_repo, voucher_repo, product_repo),
            orm,
        }
    }
}
