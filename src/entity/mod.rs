pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod product_variants;
pub mod products;
pub mod user_vouchers;
pub mod users;
pub mod vouchers;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use user_vouchers::Entity as UserVouchers;
pub use users::Entity as Users;
pub use vouchers::Entity as Vouchers;
