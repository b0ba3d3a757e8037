use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        offer::{
            MAX_DISCOUNT_PERCENT, MAX_TTL_HOURS, MIN_DISCOUNT_PERCENT, OfferStatus,
            generate_token, looks_like_token, offer_status,
        },
        pricing::offer_unit_price,
    },
    dto::offers::{CreateOfferRequest, OfferList, OfferValidation},
    entity::{
        personalized_offers::{
            ActiveModel as OfferActive, Column as OfferCol, Entity as PersonalizedOffers,
            Model as OfferModel,
        },
        products::{Column as ProdCol, Entity as Products},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{PersonalizedOffer, Product},
    response::{ApiResponse, Meta},
    routes::params::OfferListQuery,
    services::store_service::ensure_store_owner,
    state::AppState,
};

pub async fn generate_offer(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    payload: CreateOfferRequest,
) -> AppResult<ApiResponse<PersonalizedOffer>> {
    ensure_store_owner(state, user, store_id).await?;

    if !(MIN_DISCOUNT_PERCENT..=MAX_DISCOUNT_PERCENT).contains(&payload.discount_percent) {
        return Err(AppError::BadRequest(format!(
            "discount_percent must be between {MIN_DISCOUNT_PERCENT} and {MAX_DISCOUNT_PERCENT}"
        )));
    }
    let ttl_hours = payload
        .expires_in_hours
        .unwrap_or(state.config.offer_default_ttl_hours);
    if !(1..=MAX_TTL_HOURS).contains(&ttl_hours) {
        return Err(AppError::BadRequest(format!(
            "expires_in_hours must be between 1 and {MAX_TTL_HOURS}"
        )));
    }

    let product = Products::find_by_id(payload.product_id)
        .filter(ProdCol::StoreId.eq(store_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let customer = match (payload.customer_id, payload.customer_email.as_deref()) {
        (Some(id), _) => Users::find_by_id(id).one(&state.orm).await?,
        (None, Some(email)) => {
            Users::find()
                .filter(UserCol::Email.eq(email.trim().to_ascii_lowercase()))
                .one(&state.orm)
                .await?
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "customer_id or customer_email is required".into(),
            ));
        }
    };
    let customer = customer.ok_or(AppError::NotFound)?;

    let expires_at = Utc::now() + Duration::hours(ttl_hours);
    let offer = OfferActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store_id),
        customer_id: Set(customer.id),
        product_id: Set(product.id),
        token: Set(generate_token()),
        discount_percent: Set(payload.discount_percent),
        expires_at: Set(expires_at.into()),
        is_active: Set(true),
        is_used: Set(false),
        used_at: Set(None),
        order_id: Set(None),
        created_by: Set(user.user_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "offer_generate",
        "personalized_offers",
        serde_json::json!({
            "store_id": store_id,
            "offer_id": offer.id,
            "customer_id": customer.id,
            "product_id": product.id,
            "discount_percent": offer.discount_percent,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Offer created",
        PersonalizedOffer::from(offer),
        None,
    ))
}

pub async fn list_store_offers(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    query: OfferListQuery,
) -> AppResult<ApiResponse<OfferList>> {
    ensure_store_owner(state, user, store_id).await?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(OfferCol::StoreId.eq(store_id));
    if let Some(status) = query.status {
        condition = condition.add(status_condition(status));
    }
    let finder = PersonalizedOffers::find()
        .filter(condition)
        .order_by_desc(OfferCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PersonalizedOffer::from)
        .collect();

    Ok(ApiResponse::success(
        "Offers",
        OfferList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// SQL form of `offer_status`, same precedence.
fn status_condition(status: OfferStatus) -> Condition {
    let now = Utc::now();
    match status {
        OfferStatus::Used => Condition::all().add(OfferCol::IsUsed.eq(true)),
        OfferStatus::Inactive => Condition::all()
            .add(OfferCol::IsUsed.eq(false))
            .add(OfferCol::IsActive.eq(false)),
        OfferStatus::Expired => Condition::all()
            .add(OfferCol::IsUsed.eq(false))
            .add(OfferCol::IsActive.eq(true))
            .add(OfferCol::ExpiresAt.lte(now)),
        OfferStatus::Active => Condition::all()
            .add(OfferCol::IsUsed.eq(false))
            .add(OfferCol::IsActive.eq(true))
            .add(OfferCol::ExpiresAt.gt(now)),
    }
}

pub async fn deactivate_offer(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<PersonalizedOffer>> {
    ensure_store_owner(state, user, store_id).await?;
    let offer = PersonalizedOffers::find_by_id(id)
        .filter(OfferCol::StoreId.eq(store_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OfferActive = offer.into();
    active.is_active = Set(false);
    let offer = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "offer_deactivate",
        "personalized_offers",
        serde_json::json!({ "store_id": store_id, "offer_id": offer.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Offer deactivated",
        PersonalizedOffer::from(offer),
        None,
    ))
}

pub async fn list_my_offers(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OfferList>> {
    let items: Vec<PersonalizedOffer> = PersonalizedOffers::find()
        .filter(OfferCol::CustomerId.eq(user.user_id))
        .order_by_desc(OfferCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PersonalizedOffer::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Offers",
        OfferList { items },
        Some(Meta::unpaginated(total)),
    ))
}

pub async fn validate_offer(
    state: &AppState,
    user: &AuthUser,
    token: &str,
) -> AppResult<ApiResponse<OfferValidation>> {
    let offer = find_own_offer(&state.orm, user, token).await?;
    let product = Products::find_by_id(offer.product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let status = offer_status(&offer, Utc::now());
    let validation = OfferValidation {
        offer_price: offer_unit_price(product.price, offer.discount_percent),
        valid: status == OfferStatus::Active,
        reason: status.reason().to_string(),
        status,
        offer: PersonalizedOffer::from(offer),
        product: Product::from(product),
    };
    Ok(ApiResponse::success("Offer", validation, None))
}

pub async fn redeem_offer(
    state: &AppState,
    user: &AuthUser,
    token: &str,
) -> AppResult<ApiResponse<PersonalizedOffer>> {
    let offer = find_own_offer(&state.orm, user, token).await?;
    let redeemed = redeem(&state.orm, &offer, None).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "offer_redeem",
        "personalized_offers",
        serde_json::json!({ "offer_id": redeemed.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Offer redeemed",
        PersonalizedOffer::from(redeemed),
        None,
    ))
}

/// Offer owned by the caller. Other customers' tokens look like unknown tokens.
pub async fn find_own_offer<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    token: &str,
) -> AppResult<OfferModel> {
    let token = token.trim().to_ascii_lowercase();
    if !looks_like_token(&token) {
        return Err(AppError::NotFound);
    }
    PersonalizedOffers::find()
        .filter(OfferCol::Token.eq(token))
        .filter(OfferCol::CustomerId.eq(user.user_id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Mark an offer used with one conditional update so concurrent redemptions
/// have exactly one winner.
pub async fn redeem<C: ConnectionTrait>(
    conn: &C,
    offer: &OfferModel,
    order_id: Option<Uuid>,
) -> AppResult<OfferModel> {
    let now = Utc::now();
    let result = PersonalizedOffers::update_many()
        .col_expr(OfferCol::IsUsed, Expr::value(true))
        .col_expr(OfferCol::UsedAt, Expr::value(now))
        .col_expr(OfferCol::OrderId, Expr::value(order_id))
        .filter(OfferCol::Id.eq(offer.id))
        .filter(OfferCol::IsActive.eq(true))
        .filter(OfferCol::IsUsed.eq(false))
        .filter(OfferCol::ExpiresAt.gt(now))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let current = PersonalizedOffers::find_by_id(offer.id)
            .one(conn)
            .await?
            .ok_or(AppError::NotFound)?;
        let status = match offer_status(&current, now) {
            OfferStatus::Active => OfferStatus::Used,
            other => other,
        };
        return Err(AppError::BadRequest(status.reason().to_string()));
    }

    PersonalizedOffers::find_by_id(offer.id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}
