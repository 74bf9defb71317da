//! In-memory repository implementations for unit tests. Each fake mimics
//! the storage semantics the Orm implementations rely on (single-statement
//! counter updates, lazily created carts, frozen order item prices).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Cart, CartLine, DiscountType, OrderDetail, OrderLine, Variant, Voucher},
    repository::{CartRepo, NewOrder, NewOrderItem, OrderRepo, ProductRepo, VoucherRepo},
    services::{CartService, OrderService, VoucherService},
};

type VariantMap = Arc<Mutex<HashMap<Uuid, Variant>>>;
type VoucherRows = Arc<Mutex<Vec<Voucher>>>;

pub struct FakeProductRepo {
    variants: VariantMap,
}

#[async_trait]
impl ProductRepo for FakeProductRepo {
    async fn find_variant(&self, id: Uuid) -> AppResult<Option<Variant>> {
        Ok(self.variants.lock().unwrap().get(&id).cloned())
    }

    async fn adjust_stock(&self, variant_id: Uuid, delta: i32) -> AppResult<()> {
        let mut variants = self.variants.lock().unwrap();
        let variant = variants
            .get_mut(&variant_id)
            .ok_or(AppError::NotFound("product variant"))?;
        variant.stock += delta;
        Ok(())
    }
}

pub struct FakeCartRepo {
    variants: VariantMap,
    carts: Mutex<Vec<Cart>>,
}

impl FakeCartRepo {
    /// Re-resolve each line's variant so reads observe current price/stock,
    /// the way the joined query does.
    fn refresh(&self, mut cart: Cart) -> Cart {
        let variants = self.variants.lock().unwrap();
        for line in &mut cart.items {
            if let Some(variant) = variants.get(&line.variant.id) {
                line.variant = variant.clone();
            }
        }
        cart
    }
}

#[async_trait]
impl CartRepo for FakeCartRepo {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Cart>> {
        let cart = {
            let carts = self.carts.lock().unwrap();
            carts.iter().find(|c| c.user_id == user_id).cloned()
        };
        Ok(cart.map(|c| self.refresh(c)))
    }

    async fn create(&self, user_id: Uuid) -> AppResult<Cart> {
        let cart = Cart {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
            items: Vec::new(),
        };
        self.carts.lock().unwrap().push(cart.clone());
        Ok(cart)
    }

    async fn add_item(&self, cart_id: Uuid, variant_id: Uuid, quantity: i32) -> AppResult<Uuid> {
        let variant = self
            .variants
            .lock()
            .unwrap()
            .get(&variant_id)
            .cloned()
            .ok_or(AppError::NotFound("product variant"))?;

        let mut carts = self.carts.lock().unwrap();
        let cart = carts
            .iter_mut()
            .find(|c| c.id == cart_id)
            .ok_or(AppError::NotFound("cart"))?;

        let id = Uuid::new_v4();
        cart.items.push(CartLine {
            id,
            quantity,
            variant,
        });
        Ok(id)
    }

    async fn update_item_quantity(&self, item_id: Uuid, quantity: i32) -> AppResult<()> {
        let mut carts = self.carts.lock().unwrap();
        for cart in carts.iter_mut() {
            if let Some(line) = cart.items.iter_mut().find(|l| l.id == item_id) {
                line.quantity = quantity;
                return Ok(());
            }
        }
        Err(AppError::NotFound("cart item"))
    }

    async fn remove_item(&self, item_id: Uuid) -> AppResult<()> {
        let mut carts = self.carts.lock().unwrap();
        for cart in carts.iter_mut() {
            let before = cart.items.len();
            cart.items.retain(|l| l.id != item_id);
            if cart.items.len() != before {
                return Ok(());
            }
        }
        Err(AppError::NotFound("cart item"))
    }

    async fn clear(&self, cart_id: Uuid) -> AppResult<()> {
        let mut carts = self.carts.lock().unwrap();
        if let Some(cart) = carts.iter_mut().find(|c| c.id == cart_id) {
            cart.items.clear();
        }
        Ok(())
    }
}

pub struct FakeVoucherRepo {
    vouchers: VoucherRows,
    user_usage: Mutex<HashMap<(Uuid, Uuid), i32>>,
}

#[async_trait]
impl VoucherRepo for FakeVoucherRepo {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Voucher>> {
        Ok(self
            .vouchers
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.code == code)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Voucher>> {
        Ok(self
            .vouchers
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn list_all(&self) -> AppResult<Vec<Voucher>> {
        Ok(self.vouchers.lock().unwrap().clone())
    }

    async fn list_active(&self) -> AppResult<Vec<Voucher>> {
        let now = Utc::now();
        Ok(self
            .vouchers
            .lock()
            .unwrap()
            .iter()
            .filter(|v| {
                v.is_active
                    && v.start_at.is_none_or(|t| t <= now)
                    && v.end_at.is_none_or(|t| t >= now)
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, voucher: Voucher) -> AppResult<Voucher> {
        self.vouchers.lock().unwrap().push(voucher.clone());
        Ok(voucher)
    }

    async fn update(&self, voucher: Voucher) -> AppResult<()> {
        let mut vouchers = self.vouchers.lock().unwrap();
        let row = vouchers
            .iter_mut()
            .find(|v| v.id == voucher.id)
            .ok_or(AppError::NotFound("voucher"))?;
        *row = voucher;
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let mut vouchers = self.vouchers.lock().unwrap();
        let row = vouchers
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(AppError::NotFound("voucher"))?;
        row.is_active = false;
        Ok(())
    }

    async fn increment_used_count(&self, voucher_id: Uuid) -> AppResult<()> {
        let mut vouchers = self.vouchers.lock().unwrap();
        if let Some(row) = vouchers.iter_mut().find(|v| v.id == voucher_id) {
            row.used_count += 1;
        }
        Ok(())
    }

    async fn increment_user_usage(&self, user_id: Uuid, voucher_id: Uuid) -> AppResult<()> {
        *self
            .user_usage
            .lock()
            .unwrap()
            .entry((user_id, voucher_id))
            .or_insert(0) += 1;
        Ok(())
    }
}

struct StoredOrder {
    id: Uuid,
    order: NewOrder,
    items: Vec<NewOrderItem>,
    created_at: DateTime<Utc>,
}

pub struct FakeOrderRepo {
    orders: Mutex<Vec<StoredOrder>>,
    variants: VariantMap,
    vouchers: VoucherRows,
}

impl FakeOrderRepo {
    fn assemble(&self, stored: &StoredOrder) -> OrderDetail {
        let variants = self.variants.lock().unwrap();
        let items = stored
            .items
            .iter()
            .filter_map(|item| {
                let variant = variants.get(&item.product_variant_id)?.clone();
                Some(OrderLine {
                    id: Uuid::new_v4(),
                    product_name: variant.product_name.clone(),
                    variant,
                    price: item.price,
                    quantity: item.quantity,
                    sub_total: item.price * i64::from(item.quantity),
                })
            })
            .collect();

        let voucher_code = stored.order.voucher_id.and_then(|id| {
            self.vouchers
                .lock()
                .unwrap()
                .iter()
                .find(|v| v.id == id)
                .map(|v| v.code.clone())
        });

        OrderDetail {
            id: stored.id,
            user_id: stored.order.user_id,
            voucher_code,
            discount_amount: stored.order.discount_amount,
            total_amount: stored.order.total_amount,
            status: stored.order.status.clone(),
            shipping_address: stored.order.shipping_address.clone(),
            created_at: stored.created_at,
            items,
            payment: None,
        }
    }
}

#[async_trait]
impl OrderRepo for FakeOrderRepo {
    async fn insert(&self, order: NewOrder) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        self.orders.lock().unwrap().push(StoredOrder {
            id,
            order,
            items: Vec::new(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn insert_items(&self, order_id: Uuid, items: Vec<NewOrderItem>) -> AppResult<()> {
        let mut orders = self.orders.lock().unwrap();
        let stored = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(AppError::NotFound("order"))?;
        stored.items = items;
        Ok(())
    }

    async fn find_detail(&self, id: Uuid) -> AppResult<Option<OrderDetail>> {
        let orders = self.orders.lock().unwrap();
        Ok(orders.iter().find(|o| o.id == id).map(|o| self.assemble(o)))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<OrderDetail>> {
        let orders = self.orders.lock().unwrap();
        Ok(orders
            .iter()
            .rev()
            .filter(|o| o.order.user_id == user_id)
            .map(|o| self.assemble(o))
            .collect())
    }

    async fn update_status(&self, order_id: Uuid, status: &str) -> AppResult<()> {
        let mut orders = self.orders.lock().unwrap();
        let stored = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(AppError::NotFound("order"))?;
        stored.order.status = status.to_string();
        Ok(())
    }
}

/// One wired set of fakes plus the services under test.
pub struct Fixture {
    variants: VariantMap,
    voucher_rows: VoucherRows,
    pub carts: Arc<FakeCartRepo>,
    pub products: Arc<FakeProductRepo>,
    pub vouchers: Arc<FakeVoucherRepo>,
    pub orders: Arc<FakeOrderRepo>,
}

impl Fixture {
    pub fn new() -> Self {
        let variants: VariantMap = Arc::new(Mutex::new(HashMap::new()));
        let voucher_rows: VoucherRows = Arc::new(Mutex::new(Vec::new()));

        let carts = Arc::new(FakeCartRepo {
            variants: variants.clone(),
            carts: Mutex::new(Vec::new()),
        });
        let products = Arc::new(FakeProductRepo {
            variants: variants.clone(),
        });
        let vouchers = Arc::new(FakeVoucherRepo {
            vouchers: voucher_rows.clone(),
            user_usage: Mutex::new(HashMap::new()),
        });
        let orders = Arc::new(FakeOrderRepo {
            orders: Mutex::new(Vec::new()),
            variants: variants.clone(),
            vouchers: voucher_rows.clone(),
        });

        Self {
            variants,
            voucher_rows,
            carts,
            products,
            vouchers,
            orders,
        }
    }

    pub fn order_service(&self) -> OrderService {
        OrderService::new(
            self.orders.clone(),
            self.carts.clone(),
            self.vouchers.clone(),
            self.products.clone(),
        )
    }

    pub fn cart_service(&self) -> CartService {
        CartService::new(self.carts.clone(), self.products.clone())
    }

    pub fn voucher_service(&self) -> VoucherService {
        VoucherService::new(self.vouchers.clone())
    }

    pub fn insert_variant(&self, price: i64, stock: i32) -> Variant {
        let id = Uuid::new_v4();
        let variant = Variant {
            id,
            product_id: Uuid::new_v4(),
            product_name: "Test Keyboard".to_string(),
            sku: format!("SKU-{}", &id.to_string()[..8]),
            price,
            stock,
        };
        self.variants.lock().unwrap().insert(id, variant.clone());
        variant
    }

    pub fn set_price(&self, variant_id: Uuid, price: i64) {
        if let Some(variant) = self.variants.lock().unwrap().get_mut(&variant_id) {
            variant.price = price;
        }
    }

    pub fn stock(&self, variant_id: Uuid) -> i32 {
        self.variants.lock().unwrap()[&variant_id].stock
    }

    pub fn insert_voucher(
        &self,
        code: &str,
        discount_type: DiscountType,
        discount_value: i64,
        tweak: impl FnOnce(&mut Voucher),
    ) -> Voucher {
        let mut voucher = Voucher {
            id: Uuid::new_v4(),
            code: code.to_string(),
            description: None,
            discount_type,
            discount_value,
            min_order_value: 0,
            max_discount_value: None,
            usage_limit: None,
            usage_per_user: 1,
            used_count: 0,
            start_at: None,
            end_at: None,
            is_active: true,
            created_at: Utc::now(),
        };
        tweak(&mut voucher);
        self.voucher_rows.lock().unwrap().push(voucher.clone());
        voucher
    }

    pub fn voucher_used_count(&self, code: &str) -> i32 {
        self.voucher_rows
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.code == code)
            .map(|v| v.used_count)
            .unwrap_or(0)
    }

    pub fn user_voucher_count(&self, user_id: Uuid, code: &str) -> i32 {
        let voucher_id = match self
            .voucher_rows
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.code == code)
        {
            Some(v) => v.id,
            None => return 0,
        };
        self.vouchers
            .user_usage
            .lock()
            .unwrap()
            .get(&(user_id, voucher_id))
            .copied()
            .unwrap_or(0)
    }

    /// Put exactly `lines` in the user's cart, creating the cart if needed.
    pub fn seed_cart(&self, user_id: Uuid, lines: &[(Uuid, i32)]) {
        let variants = self.variants.lock().unwrap();
        let items: Vec<CartLine> = lines
            .iter()
            .map(|(variant_id, quantity)| CartLine {
                id: Uuid::new_v4(),
                quantity: *quantity,
                variant: variants[variant_id].clone(),
            })
            .collect();
        drop(variants);

        let mut carts = self.carts.carts.lock().unwrap();
        match carts.iter_mut().find(|c| c.user_id == user_id) {
            Some(cart) => cart.items = items,
            None => carts.push(Cart {
                id: Uuid::new_v4(),
                user_id,
                created_at: Utc::now(),
                items,
            }),
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.orders.lock().unwrap().len()
    }
}
