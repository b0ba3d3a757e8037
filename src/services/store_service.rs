use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    domain::slug::{slugify, with_suffix},
    dto::stores::{CreateStoreRequest, StoreList, UpdateStoreRequest},
    entity::{
        store_settings::ActiveModel as SettingsActive,
        stores::{ActiveModel as StoreActive, Column as StoreCol, Entity as Stores, Model as StoreModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_merchant},
    models::{Appearance, Store},
    response::{ApiResponse, Meta},
    services::is_unique_violation,
    state::AppState,
};

const MAX_SLUG_ATTEMPTS: u32 = 50;

pub async fn create_store(
    state: &AppState,
    user: &AuthUser,
    payload: CreateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    ensure_merchant(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Store name is required".into()));
    }
    let base = slugify(&name);
    if base.is_empty() {
        return Err(AppError::BadRequest(
            "Store name must contain letters or digits".into(),
        ));
    }
    let slug = next_free_slug(state, &base).await?;
    let currency = payload
        .currency
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "INR".to_string());

    let txn = state.orm.begin().await?;
    let store = StoreActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user.user_id),
        name: Set(name),
        slug: Set(slug),
        description: Set(payload.description),
        support_email: Set(payload.support_email),
        currency: Set(currency),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("Store slug is already taken".into())
        } else {
            err.into()
        }
    })?;

    SettingsActive {
        store_id: Set(store.id),
        navbar_menus: Set(serde_json::json!([])),
        carousel_slides: Set(serde_json::json!([])),
        appearance: Set(serde_json::to_value(Appearance::default())
            .map_err(|e| AppError::Internal(e.into()))?),
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "store_create",
        "stores",
        serde_json::json!({ "store_id": store.id, "slug": store.slug }),
    )
    .await;

    Ok(ApiResponse::success("Store created", Store::from(store), None))
}

async fn next_free_slug(state: &AppState, base: &str) -> AppResult<String> {
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = with_suffix(base, attempt);
        let taken = Stores::find()
            .filter(StoreCol::Slug.eq(candidate.as_str()))
            .count(&state.orm)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
    Err(AppError::Conflict("Could not find a free store slug".into()))
}

pub async fn list_my_stores(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<StoreList>> {
    ensure_merchant(user)?;
    let mut finder = Stores::find();
    if !user.is_admin() {
        finder = finder.filter(StoreCol::OwnerId.eq(user.user_id));
    }
    let items: Vec<Store> = finder
        .order_by_asc(StoreCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Store::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        StoreList { items },
        Some(Meta::unpaginated(total)),
    ))
}

pub async fn get_store_by_slug(state: &AppState, slug: &str) -> AppResult<ApiResponse<Store>> {
    let store = find_active_by_slug(state, slug).await?;
    Ok(ApiResponse::success("Store", Store::from(store), None))
}

pub async fn update_store(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    payload: UpdateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    let store = ensure_store_owner(state, user, store_id).await?;
    let mut active: StoreActive = store.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Store name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(support_email) = payload.support_email {
        active.support_email = Set(Some(support_email).filter(|e| !e.trim().is_empty()));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let store = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "store_update",
        "stores",
        serde_json::json!({ "store_id": store.id }),
    )
    .await;

    Ok(ApiResponse::success("Store updated", Store::from(store), None))
}

/// Load a store the caller may manage. Admins manage every store.
pub async fn ensure_store_owner(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
) -> AppResult<StoreModel> {
    ensure_merchant(user)?;
    let store = Stores::find_by_id(store_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if store.owner_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(store)
}

/// Storefront lookup. Inactive stores are hidden.
pub async fn find_active_by_slug(state: &AppState, slug: &str) -> AppResult<StoreModel> {
    Stores::find()
        .filter(StoreCol::Slug.eq(slug.trim().to_ascii_lowercase()))
        .filter(StoreCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}
