use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartResponse, UpdateCartItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", post(add_item).put(update_item))
        .route("/items/{item_id}", delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current user's cart, created lazily on first access", body = ApiResponse<CartResponse>)
    ),
    security(("gateway_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = state.carts.get_cart(user.user_id).await?;
    Ok(Json(ApiResponse::success("OK", cart.into(), None)))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add a variant to the cart", body = ApiResponse<CartResponse>),
        (status = 400, description = "Bad request"),
    ),
    security(("gateway_auth" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let variant_id = payload.product_variant_id;
    let quantity = payload.quantity;
    let cart = state.carts.add_item(user.user_id, payload).await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "cart_add_item",
        Some("cart_items"),
        Some(serde_json::json!({ "product_variant_id": variant_id, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success("OK", cart.into(), None)))
}

#[utoipa::path(
    put,
    path = "/api/cart/items",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Set a cart line's quantity", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Cart item not found"),
    ),
    security(("gateway_auth" = [])),
    tag = "Cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let item_id = payload.cart_item_id;
    let quantity = payload.quantity;
    state.carts.update_item(payload).await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "cart_update_item",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_item_id": item_id, "quantity": quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Cart item updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart item not found"),
    ),
    security(("gateway_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state.carts.remove_item(item_id).await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "cart_remove_item",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Remove every line from the cart", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart not found"),
    ),
    security(("gateway_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    state.carts.clear(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
