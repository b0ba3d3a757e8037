use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::coupons::{CouponValidation, ValidateCouponRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_coupon))
}

#[utoipa::path(
    post,
    path = "/api/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Discount the coupon grants for a subtotal", body = ApiResponse<CouponValidation>),
        (status = 400, description = "Coupon unknown or not applicable")
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn validate_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ValidateCouponRequest>,
) -> AppResult<Json<ApiResponse<CouponValidation>>> {
    let resp = coupon_service::validate_coupon(&state, &user, payload).await?;
    Ok(Json(resp))
}
