use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CreateOrderRequest, OrderList, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::OrderDetail,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout).get(list_orders))
        .route("/status", put(update_order_status))
        .route("/{order_id}", get(get_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Create an order from the current cart", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Empty cart, invalid quantity, insufficient stock or rejected voucher"),
        (status = 404, description = "Cart not found"),
    ),
    security(("gateway_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let voucher_code = payload.voucher_code.clone();
    let order = state.orders.place_order(user.user_id, payload).await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "total_amount": order.total_amount,
            "voucher_code": voucher_code,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success("Order created", order, None)))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Current user's orders, newest first", body = ApiResponse<OrderList>)
    ),
    security(("gateway_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let items = state.orders.list_user_orders(user.user_id).await?;
    Ok(Json(ApiResponse::success("OK", OrderList { items }, None)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    params(
        ("order_id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order detail with items and payment", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found"),
    ),
    security(("gateway_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let order = state.orders.get_order(order_id).await?;
    Ok(Json(ApiResponse::success("OK", order, None)))
}

#[utoipa::path(
    put,
    path = "/api/orders/status",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Set an order's status", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Unknown status value"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Order not found"),
    ),
    security(("gateway_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let order_id = payload.order_id;
    let status = payload.status.clone();
    state.orders.update_status(payload).await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id, "status": status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Order status updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
