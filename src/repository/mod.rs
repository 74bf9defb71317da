//! Storage access behind narrow traits. The services only see the traits,
//! so every step of the checkout sequence stays an independent capability
//! that a later implementation could run inside one transaction.

pub mod cart;
pub mod order;
pub mod product;
pub mod voucher;

pub use cart::{CartRepo, OrmCartRepo};
pub use order::{NewOrder, NewOrderItem, OrderRepo, OrmOrderRepo};
pub use product::{OrmProductRepo, ProductRepo};
pub use voucher::{OrmVoucherRepo, VoucherRepo};
