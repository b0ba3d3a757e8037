use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::offers::{OfferList, OfferValidation},
    error::AppResult,
    middleware::auth::AuthUser,
    models::PersonalizedOffer,
    response::ApiResponse,
    services::offer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_offers))
        .route("/{token}", get(validate_offer))
        .route("/{token}/redeem", post(redeem_offer))
}

#[utoipa::path(
    get,
    path = "/api/offers",
    responses(
        (status = 200, description = "Offers issued to the caller", body = ApiResponse<OfferList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Offers"
)]
pub async fn list_my_offers(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OfferList>>> {
    let resp = offer_service::list_my_offers(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/offers/{token}",
    params(("token" = String, Path, description = "Offer token")),
    responses(
        (status = 200, description = "Offer status and offer price", body = ApiResponse<OfferValidation>),
        (status = 404, description = "Unknown token")
    ),
    security(("bearer_auth" = [])),
    tag = "Offers"
)]
pub async fn validate_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(token): Path<String>,
) -> AppResult<Json<ApiResponse<OfferValidation>>> {
    let resp = offer_service::validate_offer(&state, &user, &token).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/offers/{token}/redeem",
    params(("token" = String, Path, description = "Offer token")),
    responses(
        (status = 200, description = "Offer marked used", body = ApiResponse<PersonalizedOffer>),
        (status = 400, description = "Offer used, expired or inactive"),
        (status = 404, description = "Unknown token")
    ),
    security(("bearer_auth" = [])),
    tag = "Offers"
)]
pub async fn redeem_offer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(token): Path<String>,
) -> AppResult<Json<ApiResponse<PersonalizedOffer>>> {
    let resp = offer_service::redeem_offer(&state, &user, &token).await?;
    Ok(Json(resp))
}
