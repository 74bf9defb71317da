use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::vouchers::{
        CreateVoucherRequest, UpdateVoucherRequest, ValidateVoucherRequest,
        ValidateVoucherResponse, VoucherList,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Voucher,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vouchers).post(create_voucher).put(update_voucher))
        .route("/active", get(list_active_vouchers))
        .route("/validate", post(validate_voucher))
        .route("/{id}", delete(deactivate_voucher))
        .route("/code/{code}", get(get_voucher))
}

#[utoipa::path(
    get,
    path = "/api/vouchers",
    responses(
        (status = 200, description = "Every voucher, active or not", body = ApiResponse<VoucherList>),
        (status = 403, description = "Admin only"),
    ),
    security(("gateway_auth" = [])),
    tag = "Vouchers"
)]
pub async fn list_vouchers(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<VoucherList>>> {
    ensure_admin(&user)?;
    let items = state.vouchers.list_all().await?;
    Ok(Json(ApiResponse::success("OK", VoucherList { items }, None)))
}

#[utoipa::path(
    get,
    path = "/api/vouchers/active",
    responses(
        (status = 200, description = "Vouchers currently inside their validity window", body = ApiResponse<VoucherList>)
    ),
    security(("gateway_auth" = [])),
    tag = "Vouchers"
)]
pub async fn list_active_vouchers(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<VoucherList>>> {
    let items = state.vouchers.list_active().await?;
    Ok(Json(ApiResponse::success("OK", VoucherList { items }, None)))
}

#[utoipa::path(
    get,
    path = "/api/vouchers/code/{code}",
    params(
        ("code" = String, Path, description = "Voucher code")
    ),
    responses(
        (status = 200, description = "Voucher by code", body = ApiResponse<Voucher>),
        (status = 404, description = "Voucher not found"),
    ),
    security(("gateway_auth" = [])),
    tag = "Vouchers"
)]
pub async fn get_voucher(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<Voucher>>> {
    let voucher = state.vouchers.get_by_code(&code).await?;
    Ok(Json(ApiResponse::success("OK", voucher, None)))
}

#[utoipa::path(
    post,
    path = "/api/vouchers",
    request_body = CreateVoucherRequest,
    responses(
        (status = 200, description = "Create a voucher", body = ApiResponse<Voucher>),
        (status = 400, description = "Duplicate code"),
        (status = 403, description = "Admin only"),
    ),
    security(("gateway_auth" = [])),
    tag = "Vouchers"
)]
pub async fn create_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateVoucherRequest>,
) -> AppResult<Json<ApiResponse<Voucher>>> {
    ensure_admin(&user)?;

    let voucher = state.vouchers.create(payload).await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "voucher_create",
        Some("vouchers"),
        Some(serde_json::json!({ "voucher_id": voucher.id, "code": voucher.code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success("Voucher created", voucher, None)))
}

#[utoipa::path(
    put,
    path = "/api/vouchers",
    request_body = UpdateVoucherRequest,
    responses(
        (status = 200, description = "Partially update a voucher", body = ApiResponse<Voucher>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Voucher not found"),
    ),
    security(("gateway_auth" = [])),
    tag = "Vouchers"
)]
pub async fn update_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateVoucherRequest>,
) -> AppResult<Json<ApiResponse<Voucher>>> {
    ensure_admin(&user)?;

    let voucher = state.vouchers.update(payload).await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "voucher_update",
        Some("vouchers"),
        Some(serde_json::json!({ "voucher_id": voucher.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success("Voucher updated", voucher, None)))
}

#[utoipa::path(
    delete,
    path = "/api/vouchers/{id}",
    params(
        ("id" = Uuid, Path, description = "Voucher ID")
    ),
    responses(
        (status = 200, description = "Deactivate a voucher; the row is kept", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Voucher not found"),
    ),
    security(("gateway_auth" = [])),
    tag = "Vouchers"
)]
pub async fn deactivate_voucher(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    state.vouchers.deactivate(id).await?;

    if let Err(err) = log_audit(
        &state.orm,
        Some(user.user_id),
        "voucher_deactivate",
        Some("vouchers"),
        Some(serde_json::json!({ "voucher_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(Json(ApiResponse::success(
        "Voucher deactivated",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/vouchers/validate",
    request_body = ValidateVoucherRequest,
    responses(
        (status = 200, description = "Dry-run voucher check against an order value", body = ApiResponse<ValidateVoucherResponse>),
    ),
    security(("gateway_auth" = [])),
    tag = "Vouchers"
)]
pub async fn validate_voucher(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ValidateVoucherRequest>,
) -> AppResult<Json<ApiResponse<ValidateVoucherResponse>>> {
    let result = state.vouchers.validate(payload).await?;
    Ok(Json(ApiResponse::success("OK", result, None)))
}
