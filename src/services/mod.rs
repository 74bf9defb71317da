pub mod cart_service;
pub mod order_service;
pub mod voucher_service;

#[cfg(test)]
pub(crate) mod fakes;

pub use cart_service::CartService;
pub use order_service::OrderService;
pub use voucher_service::VoucherService;
