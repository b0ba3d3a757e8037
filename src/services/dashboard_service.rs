use chrono::Utc;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::dashboard::{OrderStatusCount, StoreSummary},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{abandoned_cart_service::idle_cutoff, store_service::ensure_store_owner},
    state::AppState,
};

#[derive(FromRow)]
struct CountsRow {
    product_count: i64,
    low_stock_count: i64,
    paid_revenue: i64,
    open_ticket_count: i64,
    abandoned_cart_count: i64,
    active_offer_count: i64,
}

#[derive(FromRow)]
struct StatusRow {
    status: String,
    count: i64,
}

pub async fn summary(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
) -> AppResult<ApiResponse<StoreSummary>> {
    ensure_store_owner(state, user, store_id).await?;
    let now = Utc::now();
    let cutoff = idle_cutoff(now, state.config.abandoned_cart_idle_minutes)?;

    let counts = sqlx::query_as::<_, CountsRow>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM products WHERE store_id = $1) AS product_count,
            (SELECT COUNT(*) FROM products
                WHERE store_id = $1 AND is_active AND stock <= $2) AS low_stock_count,
            (SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders
                WHERE store_id = $1 AND payment_status = 'paid') AS paid_revenue,
            (SELECT COUNT(*) FROM tickets
                WHERE store_id = $1 AND status IN ('open', 'in_progress')) AS open_ticket_count,
            (SELECT COUNT(*) FROM abandoned_carts
                WHERE store_id = $1 AND status <> 'recovered'
                  AND last_activity_at <= $3) AS abandoned_cart_count,
            (SELECT COUNT(*) FROM personalized_offers
                WHERE store_id = $1 AND is_active AND NOT is_used
                  AND expires_at > $4) AS active_offer_count
        "#,
    )
    .bind(store_id)
    .bind(state.config.low_stock_threshold)
    .bind(cutoff)
    .bind(now)
    .fetch_one(&state.pool)
    .await?;

    let orders_by_status = sqlx::query_as::<_, StatusRow>(
        r#"
        SELECT status, COUNT(*) AS count
        FROM orders
        WHERE store_id = $1
        GROUP BY status
        ORDER BY status
        "#,
    )
    .bind(store_id)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|row| OrderStatusCount {
        status: row.status,
        count: row.count,
    })
    .collect();

    Ok(ApiResponse::success(
        "Summary",
        StoreSummary {
            product_count: counts.product_count,
            low_stock_count: counts.low_stock_count,
            orders_by_status,
            paid_revenue: counts.paid_revenue,
            open_ticket_count: counts.open_ticket_count,
            abandoned_cart_count: counts.abandoned_cart_count,
            active_offer_count: counts.active_offer_count,
        },
        None,
    ))
}
