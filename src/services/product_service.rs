use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    domain::pricing::{MAX_PRICE, sale_discount_percent},
    dto::products::{CreateProductRequest, InventoryAdjustRequest, ProductList, UpdateProductRequest},
    entity::{
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        stores::Entity as Stores,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ClearanceQuery, LowStockQuery, ProductQuery, ProductSortBy, SortOrder},
    services::{
        is_unique_violation,
        store_service::{ensure_store_owner, find_active_by_slug},
    },
    state::AppState,
};

pub const DEFAULT_CLEARANCE_PERCENT: i64 = 30;
pub const MAX_STOCK: i32 = 1_000_000;

pub async fn list_products(
    state: &AppState,
    slug: &str,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let store = find_active_by_slug(state, slug).await?;
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all()
        .add(Column::StoreId.eq(store.id))
        .add(Column::IsActive.eq(true));

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Category).ilike(category.to_string()));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if query.in_stock == Some(true) {
        condition = condition.add(Column::Stock.gt(0));
    }

    if query.on_sale == Some(true) {
        condition = condition.add(Expr::col(Column::CompareAtPrice).gt(Expr::col(Column::Price)));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn list_clearance(
    state: &AppState,
    slug: &str,
    query: ClearanceQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let store = find_active_by_slug(state, slug).await?;
    let (page, limit, offset) = query.pagination().normalize();
    let threshold = query
        .min_discount
        .unwrap_or(DEFAULT_CLEARANCE_PERCENT)
        .clamp(0, 100);

    let on_sale = Products::find()
        .filter(Column::StoreId.eq(store.id))
        .filter(Column::IsActive.eq(true))
        .filter(Column::Stock.gt(0))
        .filter(Expr::col(Column::CompareAtPrice).gt(Expr::col(Column::Price)))
        .all(&state.orm)
        .await?;

    let ranked = rank_clearance(on_sale, threshold);
    let total = ranked.len() as i64;
    let items = ranked
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Clearance", ProductList { items }, Some(meta)))
}

/// Products discounted by at least `threshold` percent, deepest discount first.
fn rank_clearance(products: Vec<ProductModel>, threshold: i64) -> Vec<ProductModel> {
    let mut ranked: Vec<(i64, ProductModel)> = products
        .into_iter()
        .filter_map(|p| {
            sale_discount_percent(p.price, p.compare_at_price)
                .filter(|percent| *percent >= threshold)
                .map(|percent| (percent, p))
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.price.cmp(&b.1.price)));
    ranked.into_iter().map(|(_, p)| p).collect()
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .map(Product::from);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_store_owner(state, user, store_id).await?;
    let name = payload.name.trim().to_string();
    validate_fields(&name, payload.price, payload.stock, payload.compare_at_price)?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        store_id: Set(store_id),
        name: Set(name),
        description: Set(payload.description),
        category: Set(payload.category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())),
        price: Set(payload.price),
        compare_at_price: Set(payload.compare_at_price),
        stock: Set(payload.stock),
        image_url: Set(payload.image_url),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(duplicate_name)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "store_id": store_id, "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_store_owner(state, user, store_id).await?;
    let existing = find_in_store(state, store_id, id).await?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&existing.name)
        .to_string();
    let price = payload.price.unwrap_or(existing.price);
    let stock = payload.stock.unwrap_or(existing.stock);
    let compare_at_price = payload
        .compare_at_price
        .unwrap_or(existing.compare_at_price);
    validate_fields(&name, price, stock, compare_at_price)?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(name);
    active.price = Set(price);
    active.stock = Set(stock);
    active.compare_at_price = Set(compare_at_price);
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(Some(category.trim().to_string()).filter(|c| !c.is_empty()));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await.map_err(duplicate_name)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "store_id": store_id, "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_store_owner(state, user, store_id).await?;
    let result = Products::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::StoreId.eq(store_id))
        .exec(&state.orm)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Conflict(
                "Product has orders; deactivate it instead".into(),
            ),
            _ => err.into(),
        })?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "store_id": store_id, "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_store_owner(state, user, store_id).await?;
    let threshold = query.threshold.unwrap_or(state.config.low_stock_threshold);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(Column::StoreId.eq(store_id))
        .filter(Column::IsActive.eq(true))
        .filter(Column::Stock.lte(threshold))
        .order_by_asc(Column::Stock)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_store_owner(state, user, store_id).await?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .filter(Column::StoreId.eq(store_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let new_stock = product
        .stock
        .checked_add(payload.delta)
        .filter(|s| (0..=MAX_STOCK).contains(s))
        .ok_or_else(|| {
            AppError::BadRequest(format!("stock must stay between 0 and {MAX_STOCK}"))
        })?;

    let mut active: ActiveModel = product.into();
    active.stock = Set(new_stock);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta, "stock": new_stock }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        Product::from(updated),
        Some(Meta::empty()),
    ))
}

/// Active product in an active store, for carts and wishlists.
pub async fn find_purchasable(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    let found = Products::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .find_also_related(Stores)
        .one(&state.orm)
        .await?;
    match found {
        Some((product, Some(store))) if store.is_active => Ok(product),
        _ => Err(AppError::BadRequest("product not found".into())),
    }
}

async fn find_in_store(state: &AppState, store_id: Uuid, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .filter(Column::StoreId.eq(store_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn validate_fields(name: &str, price: i64, stock: i32, compare_at_price: Option<i64>) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    if !(0..=MAX_PRICE).contains(&price) {
        return Err(AppError::BadRequest(format!(
            "price must be between 0 and {MAX_PRICE}"
        )));
    }
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(AppError::BadRequest(format!(
            "stock must be between 0 and {MAX_STOCK}"
        )));
    }
    if let Some(compare) = compare_at_price {
        if compare < price || compare > MAX_PRICE {
            return Err(AppError::BadRequest(format!(
                "compare_at_price must be between price and {MAX_PRICE}"
            )));
        }
    }
    Ok(())
}

fn duplicate_name(err: sea_orm::DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("A product with this name already exists in the store".into())
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: i64, compare: Option<i64>) -> ProductModel {
        let now = Utc::now().fixed_offset();
        ProductModel {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            category: None,
            price,
            compare_at_price: compare,
            stock: 4,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn clearance_ranks_by_discount_and_applies_threshold() {
        let ranked = rank_clearance(
            vec![
                product("ten", 900, Some(1000)),
                product("half", 500, Some(1000)),
                product("forty", 600, Some(1000)),
                product("full", 1000, None),
            ],
            30,
        );
        let names: Vec<&str> = ranked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["half", "forty"]);
    }

    #[test]
    fn field_validation() {
        assert!(validate_fields("Mug", 100, 0, None).is_ok());
        assert!(validate_fields("", 100, 0, None).is_err());
        assert!(validate_fields("Mug", -1, 0, None).is_err());
        assert!(validate_fields("Mug", 100, -1, None).is_err());
        assert!(validate_fields("Mug", 100, 1, Some(99)).is_err());
        assert!(validate_fields("Mug", 100, 1, Some(100)).is_ok());
        assert!(validate_fields("Mug", MAX_PRICE + 1, 1, None).is_err());
        assert!(validate_fields("Mug", 0, 1, Some(i64::MAX / 50)).is_err());
        assert!(validate_fields("Mug", 0, MAX_STOCK + 1, None).is_err());
    }
}
