use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartResponse, UpdateCartItemRequest},
        orders::{CreateOrderRequest, OrderList, UpdateOrderStatusRequest},
        vouchers::{
            CreateVoucherRequest, UpdateVoucherRequest, ValidateVoucherRequest,
            ValidateVoucherResponse, VoucherList,
        },
    },
    models::{Cart, CartLine, DiscountType, OrderDetail, OrderLine, Payment, Variant, Voucher},
    response::{ApiResponse, Meta},
    routes::{cart, health, orders, vouchers},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "gateway_auth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-user-id"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        vouchers::list_vouchers,
        vouchers::list_active_vouchers,
        vouchers::get_voucher,
        vouchers::create_voucher,
        vouchers::update_voucher,
        vouchers::deactivate_voucher,
        vouchers::validate_voucher
    ),
    components(
        schemas(
            Variant,
            Cart,
            CartLine,
            Voucher,
            DiscountType,
            OrderDetail,
            OrderLine,
            Payment,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartResponse,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            CreateVoucherRequest,
            UpdateVoucherRequest,
            ValidateVoucherRequest,
            ValidateVoucherResponse,
            VoucherList,
            Meta,
            ApiResponse<CartResponse>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<Voucher>,
            ApiResponse<VoucherList>,
            ApiResponse<ValidateVoucherResponse>
        )
    ),
    security(
        ("gateway_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Vouchers", description = "Voucher endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
