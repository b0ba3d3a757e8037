use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        OrderStatus, PaymentStatus,
        offer::{OfferStatus, offer_status},
        pricing::{evaluate_coupon, offer_unit_price},
    },
    dto::orders::{
        CheckoutRequest, OrderList, OrderTracking, OrderWithItems, PayOrderRequest, TrackingEvent,
        UpdateOrderStatusRequest, UpdateShipmentRequest,
    },
    entity::{
        cart_items::{self, Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        stores::Entity as Stores,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{abandoned_cart_service, coupon_service, offer_service, store_service::ensure_store_owner},
    state::AppState,
};

#[derive(Debug, FromQueryResult)]
struct CartProductRow {
    product_id: Uuid,
    quantity: i32,
    name: String,
    price: i64,
    stock: i32,
    is_active: bool,
}

/// Priced checkout line before it is written.
#[derive(Debug, Clone, PartialEq)]
struct PricedLine {
    product_id: Uuid,
    name: String,
    quantity: i32,
    price: i64,
    discount_amount: i64,
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let shipping_address = payload.shipping_address.trim().to_string();
    if shipping_address.is_empty() {
        return Err(AppError::BadRequest("shipping_address is required".into()));
    }

    let store = Stores::find_by_id(payload.store_id)
        .one(&state.orm)
        .await?
        .filter(|s| s.is_active)
        .ok_or(AppError::NotFound)?;

    let txn = state.orm.begin().await?;

    let rows = CartItems::find()
        .select_only()
        .column_as(CartCol::ProductId, "product_id")
        .column_as(CartCol::Quantity, "quantity")
        .column_as(ProdCol::Name, "name")
        .column_as(ProdCol::Price, "price")
        .column_as(ProdCol::Stock, "stock")
        .column_as(ProdCol::IsActive, "is_active")
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::StoreId.eq(store.id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .into_model::<CartProductRow>()
        .all(&txn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    for row in &rows {
        if !row.is_active {
            return Err(AppError::BadRequest(format!(
                "{} is no longer available",
                row.name
            )));
        }
        if row.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        if row.stock < row.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                row.name
            )));
        }
    }

    let mut lines: Vec<PricedLine> = rows
        .iter()
        .map(|row| PricedLine {
            product_id: row.product_id,
            name: row.name.clone(),
            quantity: row.quantity,
            price: row.price,
            discount_amount: 0,
        })
        .collect();

    let now = Utc::now();
    let offer = match payload.offer_token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => {
            let offer = offer_service::find_own_offer(&txn, user, token).await?;
            if offer.store_id != store.id {
                return Err(AppError::BadRequest(
                    "offer is not valid for this store".into(),
                ));
            }
            let status = offer_status(&offer, now);
            if status != OfferStatus::Active {
                return Err(AppError::BadRequest(status.reason().to_string()));
            }
            if !apply_offer(&mut lines, offer.product_id, offer.discount_percent) {
                return Err(AppError::BadRequest(
                    "offer product is not in the cart".into(),
                ));
            }
            Some(offer)
        }
        None => None,
    };

    let subtotal: i64 = lines.iter().map(|l| l.price * i64::from(l.quantity)).sum();
    let offer_discount: i64 = lines.iter().map(|l| l.discount_amount).sum();

    let coupon = match payload.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => {
            let coupon = coupon_service::find_by_code(&txn, store.id, code).await?;
            let discount = evaluate_coupon(&coupon, subtotal - offer_discount, now)?;
            coupon_service::consume(&txn, coupon.id).await?;
            Some((coupon, discount))
        }
        None => None,
    };
    let coupon_discount = coupon.as_ref().map(|(_, d)| *d).unwrap_or(0);
    let discount_amount = offer_discount + coupon_discount;

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        store_id: Set(store.id),
        user_id: Set(user.user_id),
        subtotal_amount: Set(subtotal),
        discount_amount: Set(discount_amount),
        total_amount: Set(subtotal - discount_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        payment_status: Set(PaymentStatus::Unpaid.as_str().to_string()),
        invoice_number: Set(build_invoice_number(order_id)),
        coupon_code: Set(coupon.as_ref().map(|(c, _)| c.code.clone())),
        offer_id: Set(offer.as_ref().map(|o| o.id)),
        shipping_address: Set(shipping_address),
        payment_method: Set(payload.payment_method.as_str().to_string()),
        courier: Set(None),
        tracking_number: Set(None),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    if let Some(offer) = &offer {
        offer_service::redeem(&txn, offer, Some(order.id)).await?;
    }

    let mut order_items: Vec<OrderItem> = Vec::new();
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            product_name: Set(line.name.clone()),
            quantity: Set(line.quantity),
            price: Set(line.price),
            discount_amount: Set(line.discount_amount),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(item));

        // reduce stock
        let updated = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(line.product_id))
            .filter(ProdCol::Stock.gte(line.quantity))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                line.name
            )));
        }
    }

    // clear this store's cart lines
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::StoreId.eq(store.id))
        .exec(&txn)
        .await?;

    abandoned_cart_service::mark_recovered(&txn, user.user_id, store.id, order.id).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "store_id": store.id,
            "coupon": order.coupon_code,
            "offer_id": order.offer_id,
            "total_amount": order.total_amount,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: Order::from(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

/// Discount the offer's product line. Returns false when the product is not in the cart.
fn apply_offer(lines: &mut [PricedLine], product_id: Uuid, discount_percent: i32) -> bool {
    match lines.iter_mut().find(|l| l.product_id == product_id) {
        Some(line) => {
            let unit = offer_unit_price(line.price, discount_percent);
            line.discount_amount = (line.price - unit) * i64::from(line.quantity);
            true
        }
        None => false,
    }
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    paginate_orders(state, condition, query).await
}

pub async fn list_store_orders(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_store_owner(state, user, store_id).await?;
    let condition = Condition::all().add(OrderCol::StoreId.eq(store_id));
    paginate_orders(state, condition, query).await
}

async fn paginate_orders(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = own_order(user, id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_store_order(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_store_owner(state, user, store_id).await?;
    let order = store_order(store_id, id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = own_order(user, id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if !payload
        .invoice_number
        .trim()
        .eq_ignore_ascii_case(&order.invoice_number)
    {
        return Err(AppError::BadRequest("Invoice number does not match".into()));
    }
    if order.payment_status == PaymentStatus::Paid.as_str() {
        return Err(AppError::BadRequest("Order already paid".into()));
    }
    let status = order.status.parse::<OrderStatus>()?;
    if status == OrderStatus::Cancelled {
        return Err(AppError::BadRequest("Order is cancelled".into()));
    }

    let mut active: OrderActive = order.into();
    active.payment_status = Set(PaymentStatus::Paid.as_str().to_string());
    if status.can_transition_to(OrderStatus::Paid) {
        active.status = Set(OrderStatus::Paid.as_str().to_string());
    }
    active.paid_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let items = load_items(&txn, order.id).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_paid",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment recorded",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = own_order(user, id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.status.parse::<OrderStatus>()? != OrderStatus::Pending {
        return Err(AppError::BadRequest(
            "Only pending orders can be cancelled".into(),
        ));
    }

    restock(&txn, order.id).await?;
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    let items = load_items(&txn, order.id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        OrderWithItems {
            order: Order::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_store_owner(state, user, store_id).await?;
    let next = payload.status;

    let txn = state.orm.begin().await?;
    let order = store_order(store_id, id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = order.status.parse::<OrderStatus>()?;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {current} to {next}"
        )));
    }

    let paid = order.payment_status == PaymentStatus::Paid.as_str();
    let mut active: OrderActive = order.clone().into();
    active.status = Set(next.as_str().to_string());
    match next {
        OrderStatus::Paid if !paid => {
            active.payment_status = Set(PaymentStatus::Paid.as_str().to_string());
            active.paid_at = Set(Some(Utc::now().into()));
        }
        OrderStatus::Cancelled => {
            if current.restocks_on_cancel() {
                restock(&txn, order.id).await?;
            }
            if paid {
                active.payment_status = Set(PaymentStatus::Refunded.as_str().to_string());
            }
        }
        _ => {}
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": current.as_str(), "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn set_shipment(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
    payload: UpdateShipmentRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_store_owner(state, user, store_id).await?;
    let courier = payload.courier.trim().to_string();
    let tracking_number = payload.tracking_number.trim().to_string();
    if courier.is_empty() || tracking_number.is_empty() {
        return Err(AppError::BadRequest(
            "courier and tracking_number are required".into(),
        ));
    }

    let order = store_order(store_id, id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let status = order.status.parse::<OrderStatus>()?;
    if matches!(status, OrderStatus::Pending | OrderStatus::Cancelled) {
        return Err(AppError::BadRequest(format!(
            "Cannot ship an order that is {status}"
        )));
    }

    let mut active: OrderActive = order.into();
    active.courier = Set(Some(courier));
    active.tracking_number = Set(Some(tracking_number));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_shipment_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "tracking_number": order.tracking_number }),
    )
    .await;

    Ok(ApiResponse::success(
        "Shipment updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn track_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderTracking>> {
    let order = own_order(user, id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let tracking_number = order
        .tracking_number
        .clone()
        .ok_or_else(|| AppError::BadRequest("Order has not been shipped yet".into()))?;
    let courier = state
        .courier
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Shipment tracking is not configured".into()))?;

    let shipment = courier.track(&tracking_number).await?;
    let events = shipment
        .scans
        .into_iter()
        .map(|scan| TrackingEvent {
            status: scan.scan,
            location: scan.scanned_location,
            instructions: scan.instructions,
            occurred_at: scan.scan_date_time,
        })
        .collect();

    Ok(ApiResponse::success(
        "Tracking",
        OrderTracking {
            order_id: order.id,
            courier: order.courier,
            tracking_number: shipment.waybill,
            current_status: shipment.status.status,
            current_location: shipment.status.status_location,
            updated_at: shipment.status.status_date_time,
            events,
            fetched_at: Utc::now(),
        },
        None,
    ))
}

fn own_order(user: &AuthUser, id: Uuid) -> Select<Orders> {
    Orders::find().filter(
        Condition::all()
            .add(OrderCol::UserId.eq(user.user_id))
            .add(OrderCol::Id.eq(id)),
    )
}

fn store_order(store_id: Uuid, id: Uuid) -> Select<Orders> {
    Orders::find().filter(
        Condition::all()
            .add(OrderCol::StoreId.eq(store_id))
            .add(OrderCol::Id.eq(id)),
    )
}

async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    Ok(items)
}

async fn restock<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(conn)
        .await?;
    for item in items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(conn)
            .await?;
    }
    Ok(())
}

pub fn build_invoice_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.simple().to_string();
    let short = &suffix[..8];
    format!("INV-{}-{}", date, short)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: i32) -> PricedLine {
        PricedLine {
            product_id: Uuid::new_v4(),
            name: "item".into(),
            quantity,
            price,
            discount_amount: 0,
        }
    }

    #[test]
    fn invoice_number_has_date_and_short_id() {
        let id = Uuid::new_v4();
        let invoice = build_invoice_number(id);
        let parts: Vec<&str> = invoice.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "INV");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2], &id.simple().to_string()[..8]);
    }

    #[test]
    fn offer_discounts_only_its_line() {
        let mut lines = vec![line(1000, 2), line(500, 1)];
        let target = lines[0].product_id;
        assert!(apply_offer(&mut lines, target, 25));
        assert_eq!(lines[0].discount_amount, 500);
        assert_eq!(lines[1].discount_amount, 0);
    }

    #[test]
    fn offer_for_missing_product_is_rejected() {
        let mut lines = vec![line(1000, 1)];
        assert!(!apply_offer(&mut lines, Uuid::new_v4(), 10));
    }
}
