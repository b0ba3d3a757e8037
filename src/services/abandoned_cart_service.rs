use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, OnConflict};
use uuid::Uuid;

use crate::{
    audit,
    config::MAX_IDLE_MINUTES,
    domain::AbandonedCartStatus,
    dto::abandoned_carts::AbandonedCartList,
    entity::{
        abandoned_carts::{ActiveModel as SnapshotActive, Column as SnapCol, Entity as AbandonedCarts},
        cart_items::{Column as CartCol, Entity as CartItems, Model as CartModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{AbandonedCart, CartSnapshotLine},
    response::{ApiResponse, Meta},
    routes::params::AbandonedCartQuery,
    services::store_service::ensure_store_owner,
    state::AppState,
};

/// Last-activity cutoff for carts idle at least `idle_minutes`.
pub fn idle_cutoff(now: DateTime<Utc>, idle_minutes: i64) -> AppResult<DateTime<Utc>> {
    if !(0..=MAX_IDLE_MINUTES).contains(&idle_minutes) {
        return Err(AppError::BadRequest(format!(
            "idle_minutes must be between 0 and {MAX_IDLE_MINUTES}"
        )));
    }
    Ok(now - Duration::minutes(idle_minutes))
}

/// Snapshot lines with item count and total.
pub fn build_snapshot(lines: &[(CartModel, ProductModel)]) -> (Vec<CartSnapshotLine>, i32, i64) {
    let items: Vec<CartSnapshotLine> = lines
        .iter()
        .map(|(item, product)| CartSnapshotLine {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: item.quantity,
        })
        .collect();
    let item_count = items.iter().map(|l| l.quantity).sum();
    let total = items.iter().map(|l| l.price * i64::from(l.quantity)).sum();
    (items, item_count, total)
}

/// Rebuild the (store, customer) snapshot from the live cart.
pub async fn refresh_snapshot(state: &AppState, user_id: Uuid, store_id: Uuid) -> AppResult<()> {
    let lines: Vec<(CartModel, ProductModel)> = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::StoreId.eq(store_id))
        .find_also_related(Products)
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| (item, p)))
        .collect();

    if lines.is_empty() {
        AbandonedCarts::delete_many()
            .filter(SnapCol::UserId.eq(user_id))
            .filter(SnapCol::StoreId.eq(store_id))
            .filter(SnapCol::Status.ne(AbandonedCartStatus::Recovered.as_str()))
            .exec(&state.orm)
            .await?;
        return Ok(());
    }

    let (items, item_count, total) = build_snapshot(&lines);
    let items = serde_json::to_value(items).map_err(|e| AppError::Internal(e.into()))?;
    let now = Utc::now();

    let snapshot = SnapshotActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store_id),
        user_id: Set(user_id),
        items: Set(items),
        item_count: Set(item_count),
        total_amount: Set(total),
        status: Set(AbandonedCartStatus::Active.as_str().to_string()),
        last_activity_at: Set(now.into()),
        reminder_sent_at: Set(None),
        recovered_order_id: Set(None),
        created_at: NotSet,
    };

    AbandonedCarts::insert(snapshot)
        .on_conflict(
            OnConflict::columns([SnapCol::StoreId, SnapCol::UserId])
                .update_columns([
                    SnapCol::Items,
                    SnapCol::ItemCount,
                    SnapCol::TotalAmount,
                    SnapCol::Status,
                    SnapCol::LastActivityAt,
                    SnapCol::ReminderSentAt,
                    SnapCol::RecoveredOrderId,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;
    Ok(())
}

/// Cart mutations call this; a stale snapshot must never fail the request.
pub async fn refresh_snapshot_logged(state: &AppState, user_id: Uuid, store_id: Uuid) {
    if let Err(err) = refresh_snapshot(state, user_id, store_id).await {
        tracing::warn!(error = %err, %user_id, %store_id, "abandoned cart snapshot refresh failed");
    }
}

/// Called from checkout inside its transaction.
pub async fn mark_recovered<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    store_id: Uuid,
    order_id: Uuid,
) -> AppResult<()> {
    AbandonedCarts::update_many()
        .col_expr(
            SnapCol::Status,
            Expr::value(AbandonedCartStatus::Recovered.as_str()),
        )
        .col_expr(SnapCol::RecoveredOrderId, Expr::value(order_id))
        .filter(SnapCol::UserId.eq(user_id))
        .filter(SnapCol::StoreId.eq(store_id))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn list_abandoned(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    query: AbandonedCartQuery,
) -> AppResult<ApiResponse<AbandonedCartList>> {
    ensure_store_owner(state, user, store_id).await?;
    let (page, limit, offset) = query.pagination().normalize();
    let idle_minutes = query
        .idle_minutes
        .unwrap_or(state.config.abandoned_cart_idle_minutes);
    let cutoff = idle_cutoff(Utc::now(), idle_minutes)?;

    let mut finder = AbandonedCarts::find()
        .filter(SnapCol::StoreId.eq(store_id))
        .filter(SnapCol::LastActivityAt.lte(cutoff));
    finder = match query.status {
        Some(status) => finder.filter(SnapCol::Status.eq(status.as_str())),
        None => finder.filter(SnapCol::Status.ne(AbandonedCartStatus::Recovered.as_str())),
    };
    let finder = finder.order_by_asc(SnapCol::LastActivityAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AbandonedCart::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Abandoned carts",
        AbandonedCartList { items },
        Some(meta),
    ))
}

pub async fn mark_reminded(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<AbandonedCart>> {
    ensure_store_owner(state, user, store_id).await?;
    let snapshot = AbandonedCarts::find_by_id(id)
        .filter(SnapCol::StoreId.eq(store_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if snapshot.status == AbandonedCartStatus::Recovered.as_str() {
        return Err(AppError::BadRequest("Cart was already recovered".into()));
    }

    let mut active: SnapshotActive = snapshot.into();
    active.status = Set(AbandonedCartStatus::Reminded.as_str().to_string());
    active.reminder_sent_at = Set(Some(Utc::now().into()));
    let snapshot = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "abandoned_cart_remind",
        "abandoned_carts",
        serde_json::json!({ "store_id": store_id, "abandoned_cart_id": snapshot.id, "user_id": snapshot.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Reminder recorded",
        AbandonedCart::from(snapshot),
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_totals_lines() {
        let now = Utc::now().fixed_offset();
        let store_id = Uuid::new_v4();
        let product = |name: &str, price: i64| ProductModel {
            id: Uuid::new_v4(),
            store_id,
            name: name.into(),
            description: None,
            category: None,
            price,
            compare_at_price: None,
            stock: 10,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let item = |p: &ProductModel, quantity: i32| CartModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            store_id,
            product_id: p.id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        let mug = product("Mug", 250);
        let tee = product("Tee", 700);
        let lines = vec![(item(&mug, 2), mug.clone()), (item(&tee, 1), tee.clone())];

        let (items, count, total) = build_snapshot(&lines);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Mug");
        assert_eq!(count, 3);
        assert_eq!(total, 1200);
    }

    #[test]
    fn idle_cutoff_rejects_out_of_range_windows() {
        let now = Utc::now();
        assert_eq!(idle_cutoff(now, 0).unwrap(), now);
        assert_eq!(idle_cutoff(now, 90).unwrap(), now - Duration::minutes(90));
        assert!(idle_cutoff(now, MAX_IDLE_MINUTES).is_ok());
        assert!(matches!(
            idle_cutoff(now, i64::MAX),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(idle_cutoff(now, -5), Err(AppError::BadRequest(_))));
    }
}
