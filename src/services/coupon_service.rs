use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    audit,
    domain::pricing::{DiscountType, evaluate_coupon, normalize_code},
    dto::coupons::{
        CouponList, CouponValidation, CreateCouponRequest, UpdateCouponRequest,
        ValidateCouponRequest,
    },
    entity::coupons::{ActiveModel as CouponActive, Column as CouponCol, Entity as Coupons, Model as CouponModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Coupon,
    response::{ApiResponse, Meta},
    services::{is_unique_violation, store_service::ensure_store_owner},
    state::AppState,
};

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_store_owner(state, user, store_id).await?;
    let code = normalize_code(&payload.code);
    if code.is_empty() {
        return Err(AppError::BadRequest("code is required".into()));
    }
    payload.discount_type.validate_value(payload.discount_value)?;
    let min_order_amount = payload.min_order_amount.unwrap_or(0);
    validate_limits(min_order_amount, payload.max_uses)?;
    if let (Some(starts), Some(expires)) = (payload.starts_at, payload.expires_at) {
        if expires <= starts {
            return Err(AppError::BadRequest(
                "expires_at must be after starts_at".into(),
            ));
        }
    }

    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store_id),
        code: Set(code),
        discount_type: Set(payload.discount_type.as_str().to_string()),
        discount_value: Set(payload.discount_value),
        min_order_amount: Set(min_order_amount),
        max_uses: Set(payload.max_uses),
        used_count: Set(0),
        starts_at: Set(payload.starts_at.map(Into::into)),
        expires_at: Set(payload.expires_at.map(Into::into)),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("Coupon code already exists".into())
        } else {
            err.into()
        }
    })?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "coupon_create",
        "coupons",
        serde_json::json!({ "store_id": store_id, "coupon_id": coupon.id, "code": coupon.code }),
    )
    .await;

    Ok(ApiResponse::success("Coupon created", Coupon::from(coupon), None))
}

pub async fn list_coupons(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
) -> AppResult<ApiResponse<CouponList>> {
    ensure_store_owner(state, user, store_id).await?;
    let items: Vec<Coupon> = Coupons::find()
        .filter(CouponCol::StoreId.eq(store_id))
        .order_by_desc(CouponCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Coupon::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(Meta::unpaginated(total)),
    ))
}

pub async fn update_coupon(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
    payload: UpdateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_store_owner(state, user, store_id).await?;
    let coupon = Coupons::find_by_id(id)
        .filter(CouponCol::StoreId.eq(store_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let kind = match payload.discount_type {
        Some(kind) => kind,
        None => coupon.discount_type.parse::<DiscountType>()?,
    };
    let value = payload.discount_value.unwrap_or(coupon.discount_value);
    kind.validate_value(value)?;
    let min_order_amount = payload.min_order_amount.unwrap_or(coupon.min_order_amount);
    let max_uses = payload.max_uses.or(coupon.max_uses);
    validate_limits(min_order_amount, max_uses)?;

    let mut active: CouponActive = coupon.into();
    active.discount_type = Set(kind.as_str().to_string());
    active.discount_value = Set(value);
    active.min_order_amount = Set(min_order_amount);
    active.max_uses = Set(max_uses);
    if let Some(starts_at) = payload.starts_at {
        active.starts_at = Set(Some(starts_at.into()));
    }
    if let Some(expires_at) = payload.expires_at {
        active.expires_at = Set(Some(expires_at.into()));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let coupon = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "coupon_update",
        "coupons",
        serde_json::json!({ "store_id": store_id, "coupon_id": coupon.id }),
    )
    .await;

    Ok(ApiResponse::success("Coupon updated", Coupon::from(coupon), None))
}

pub async fn delete_coupon(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_store_owner(state, user, store_id).await?;
    let result = Coupons::delete_many()
        .filter(CouponCol::Id.eq(id))
        .filter(CouponCol::StoreId.eq(store_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "coupon_delete",
        "coupons",
        serde_json::json!({ "store_id": store_id, "coupon_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon deleted",
        serde_json::json!({ "id": id }),
        None,
    ))
}

pub async fn validate_coupon(
    state: &AppState,
    _user: &AuthUser,
    payload: ValidateCouponRequest,
) -> AppResult<ApiResponse<CouponValidation>> {
    if payload.subtotal < 0 {
        return Err(AppError::BadRequest("subtotal must be >= 0".into()));
    }
    let coupon = find_by_code(&state.orm, payload.store_id, &payload.code).await?;
    let discount_amount = evaluate_coupon(&coupon, payload.subtotal, Utc::now())?;

    Ok(ApiResponse::success(
        "Coupon is valid",
        CouponValidation {
            total_after_discount: payload.subtotal - discount_amount,
            discount_amount,
            coupon: Coupon::from(coupon),
        },
        None,
    ))
}

/// Case-insensitive lookup within a store. Unknown codes are a 400, not a 404.
pub async fn find_by_code<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    code: &str,
) -> AppResult<CouponModel> {
    Coupons::find()
        .filter(CouponCol::StoreId.eq(store_id))
        .filter(CouponCol::Code.eq(normalize_code(code)))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::BadRequest("coupon not found".into()))
}

/// Count one use. Fails when a concurrent checkout consumed the last use.
pub async fn consume<C: ConnectionTrait>(conn: &C, coupon_id: Uuid) -> AppResult<()> {
    let result = Coupons::update_many()
        .col_expr(CouponCol::UsedCount, Expr::col(CouponCol::UsedCount).add(1))
        .col_expr(CouponCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(CouponCol::Id.eq(coupon_id))
        .filter(
            Condition::any()
                .add(CouponCol::MaxUses.is_null())
                .add(Expr::col(CouponCol::UsedCount).lt(Expr::col(CouponCol::MaxUses))),
        )
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::BadRequest("coupon usage limit reached".into()));
    }
    Ok(())
}

fn validate_limits(min_order_amount: i64, max_uses: Option<i32>) -> AppResult<()> {
    if min_order_amount < 0 {
        return Err(AppError::BadRequest("min_order_amount must be >= 0".into()));
    }
    if max_uses.is_some_and(|m| m <= 0) {
        return Err(AppError::BadRequest("max_uses must be greater than 0".into()));
    }
    Ok(())
}
