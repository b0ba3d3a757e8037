//! End-to-end service flows against a real Postgres database.
//! Skipped unless TEST_DATABASE_URL or DATABASE_URL is set.

use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    domain::{OrderStatus, PaymentMethod, Role, TicketStatus, pricing::DiscountType},
    dto::{
        auth::RegisterRequest,
        cart::AddToCartRequest,
        coupons::CreateCouponRequest,
        offers::CreateOfferRequest,
        orders::{CheckoutRequest, PayOrderRequest, UpdateOrderStatusRequest},
        products::{CreateProductRequest, UpdateProductRequest},
        stores::CreateStoreRequest,
        tickets::{CreateTicketRequest, ReplyTicketRequest, UpdateTicketStatusRequest},
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{AbandonedCartQuery, LowStockQuery},
    services::{
        abandoned_cart_service, auth_service, cart_service, coupon_service, dashboard_service,
        offer_service, order_service, product_service, store_service, ticket_service,
    },
    state::AppState,
};
use uuid::Uuid;

struct Fixture {
    state: AppState,
    merchant: AuthUser,
    customer: AuthUser,
    store_id: Uuid,
}

async fn fixture() -> anyhow::Result<Option<Fixture>> {
    let Some(url) = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
    else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(None);
    };

    let pool = create_pool(&url, 5).await?;
    let state = AppState::new(pool, AppConfig::for_tests(&url, "flow-test-secret"))?;
    run_migrations(&state.orm).await?;

    let merchant = create_user(&state, Role::Merchant).await?;
    let customer = create_user(&state, Role::Customer).await?;
    let store = store_service::create_store(
        &state,
        &merchant,
        CreateStoreRequest {
            name: format!("Flow Shop {}", Uuid::new_v4().simple()),
            description: None,
            support_email: Some("help@flow.test".into()),
            currency: None,
        },
    )
    .await?
    .data
    .unwrap();

    Ok(Some(Fixture {
        state,
        merchant,
        customer,
        store_id: store.id,
    }))
}

async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@flow.test", Uuid::new_v4().simple())),
        password_hash: Set("unused".into()),
        name: Set(None),
        role: Set(role.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

async fn create_product(fx: &Fixture, name: &str, price: i64, stock: i32) -> anyhow::Result<Uuid> {
    let product = product_service::create_product(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        CreateProductRequest {
            name: name.into(),
            description: None,
            category: Some("Apparel".into()),
            price,
            compare_at_price: None,
            stock,
            image_url: None,
        },
    )
    .await?
    .data
    .unwrap();
    Ok(product.id)
}

async fn add_to_cart(fx: &Fixture, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    cart_service::set_cart_item(
        &fx.state,
        &fx.customer,
        AddToCartRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(())
}

fn checkout_request(fx: &Fixture) -> CheckoutRequest {
    CheckoutRequest {
        store_id: fx.store_id,
        shipping_address: "221B Baker Street".into(),
        payment_method: PaymentMethod::Card,
        coupon_code: None,
        offer_token: None,
    }
}

#[tokio::test]
async fn checkout_with_coupon_and_offer_then_pay() -> anyhow::Result<()> {
    let Some(fx) = fixture().await? else {
        return Ok(());
    };
    let hoodie = create_product(&fx, "Hoodie", 1000, 10).await?;
    let socks = create_product(&fx, "Socks", 500, 3).await?;

    coupon_service::create_coupon(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        CreateCouponRequest {
            code: "SAVE10".into(),
            discount_type: DiscountType::Percent,
            discount_value: 10,
            min_order_amount: Some(500),
            max_uses: Some(1),
            starts_at: None,
            expires_at: None,
        },
    )
    .await?;
    let offer = offer_service::generate_offer(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        CreateOfferRequest {
            customer_id: Some(fx.customer.user_id),
            customer_email: None,
            product_id: hoodie,
            discount_percent: 20,
            expires_in_hours: Some(24),
        },
    )
    .await?
    .data
    .unwrap();

    add_to_cart(&fx, hoodie, 2).await?;
    add_to_cart(&fx, socks, 1).await?;

    let placed = order_service::checkout(
        &fx.state,
        &fx.customer,
        CheckoutRequest {
            coupon_code: Some("save10".into()),
            offer_token: Some(offer.token.clone()),
            ..checkout_request(&fx)
        },
    )
    .await?
    .data
    .unwrap();

    // 2500 subtotal, 400 off the hoodies, then 10% of 2100.
    assert_eq!(placed.order.subtotal_amount, 2500);
    assert_eq!(placed.order.discount_amount, 610);
    assert_eq!(placed.order.total_amount, 1890);
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.order.offer_id, Some(offer.id));
    assert_eq!(placed.items.len(), 2);

    let cart = cart_service::list_cart(&fx.state, &fx.customer).await?.data.unwrap();
    assert!(cart.items.is_empty());

    let low = product_service::list_low_stock(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        LowStockQuery {
            page: None,
            per_page: None,
            threshold: Some(2),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(low.items.iter().any(|p| p.id == socks && p.stock == 2));

    let wrong = order_service::pay_order(
        &fx.state,
        &fx.customer,
        placed.order.id,
        PayOrderRequest {
            invoice_number: "INV-WRONG".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    let paid = order_service::pay_order(
        &fx.state,
        &fx.customer,
        placed.order.id,
        PayOrderRequest {
            invoice_number: placed.order.invoice_number.to_lowercase(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(paid.order.status, "paid");
    assert_eq!(paid.order.payment_status, "paid");
    assert!(paid.order.paid_at.is_some());

    let again = offer_service::redeem_offer(&fx.state, &fx.customer, &offer.token).await;
    assert!(again.is_err(), "offer must not be redeemable twice");
    Ok(())
}

#[tokio::test]
async fn checkout_rejects_empty_cart_and_short_stock() -> anyhow::Result<()> {
    let Some(fx) = fixture().await? else {
        return Ok(());
    };
    let empty = order_service::checkout(&fx.state, &fx.customer, checkout_request(&fx)).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    let mug = create_product(&fx, "Mug", 300, 1).await?;
    let over = cart_service::set_cart_item(
        &fx.state,
        &fx.customer,
        AddToCartRequest {
            product_id: mug,
            quantity: 5,
        },
    )
    .await;
    assert!(over.is_err());
    Ok(())
}

#[tokio::test]
async fn ticket_replies_move_status() -> anyhow::Result<()> {
    let Some(fx) = fixture().await? else {
        return Ok(());
    };
    let created = ticket_service::create_ticket(
        &fx.state,
        &fx.customer,
        CreateTicketRequest {
            store_id: fx.store_id,
            subject: "Where is my parcel?".into(),
            message: "It has been a week.".into(),
            category: None,
            priority: None,
            order_id: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(created.ticket.status, TicketStatus::Open.as_str());
    assert_eq!(created.messages.len(), 1);
    let id = created.ticket.id;

    ticket_service::reply(
        &fx.state,
        &fx.merchant,
        id,
        ReplyTicketRequest {
            body: "Checking with the courier.".into(),
        },
    )
    .await?;
    let ticket = ticket_service::get_ticket(&fx.state, &fx.customer, id)
        .await?
        .data
        .unwrap();
    assert_eq!(ticket.ticket.status, "in_progress");
    assert_eq!(ticket.messages.len(), 2);
    assert_eq!(ticket.messages[1].author_role, "merchant");

    ticket_service::update_ticket_status(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        id,
        UpdateTicketStatusRequest {
            status: TicketStatus::Resolved,
        },
    )
    .await?;
    ticket_service::reply(
        &fx.state,
        &fx.customer,
        id,
        ReplyTicketRequest {
            body: "Still nothing.".into(),
        },
    )
    .await?;
    let ticket = ticket_service::get_ticket(&fx.state, &fx.merchant, id)
        .await?
        .data
        .unwrap();
    assert_eq!(ticket.ticket.status, "open");

    let stranger = create_user(&fx.state, Role::Customer).await?;
    let hidden = ticket_service::get_ticket(&fx.state, &stranger, id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn abandoned_cart_is_recovered_by_checkout() -> anyhow::Result<()> {
    let Some(fx) = fixture().await? else {
        return Ok(());
    };
    let cap = create_product(&fx, "Cap", 400, 5).await?;
    add_to_cart(&fx, cap, 2).await?;

    let idle = |status| AbandonedCartQuery {
        page: None,
        per_page: None,
        idle_minutes: Some(0),
        status,
    };
    let listed = abandoned_cart_service::list_abandoned(&fx.state, &fx.merchant, fx.store_id, idle(None))
        .await?
        .data
        .unwrap();
    let snapshot = listed
        .items
        .iter()
        .find(|c| c.user_id == fx.customer.user_id)
        .expect("snapshot for the customer");
    assert_eq!(snapshot.item_count, 2);
    assert_eq!(snapshot.total_amount, 800);

    let order = order_service::checkout(&fx.state, &fx.customer, checkout_request(&fx))
        .await?
        .data
        .unwrap()
        .order;

    let listed = abandoned_cart_service::list_abandoned(&fx.state, &fx.merchant, fx.store_id, idle(None))
        .await?
        .data
        .unwrap();
    assert!(listed.items.iter().all(|c| c.user_id != fx.customer.user_id));

    let recovered = abandoned_cart_service::list_abandoned(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        idle(Some(storefront_api::domain::AbandonedCartStatus::Recovered)),
    )
    .await?
    .data
    .unwrap();
    assert!(
        recovered
            .items
            .iter()
            .any(|c| c.recovered_order_id == Some(order.id))
    );
    Ok(())
}

async fn offer_for_customer(fx: &Fixture, product_id: Uuid) -> anyhow::Result<String> {
    let offer = offer_service::generate_offer(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        CreateOfferRequest {
            customer_id: Some(fx.customer.user_id),
            customer_email: None,
            product_id,
            discount_percent: 15,
            expires_in_hours: Some(24),
        },
    )
    .await?
    .data
    .unwrap();
    Ok(offer.token)
}

#[tokio::test]
async fn concurrent_redemptions_have_one_winner() -> anyhow::Result<()> {
    let Some(fx) = fixture().await? else {
        return Ok(());
    };
    let lamp = create_product(&fx, "Lamp", 2000, 4).await?;
    let token = offer_for_customer(&fx, lamp).await?;
    let offer = offer_service::find_own_offer(&fx.state.orm, &fx.customer, &token).await?;

    let (first, second) = tokio::join!(
        offer_service::redeem(&fx.state.orm, &offer, None),
        offer_service::redeem(&fx.state.orm, &offer, None),
    );
    let winners = [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);
    let loser = if first.is_err() { first } else { second };
    assert!(matches!(loser, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn offers_of_other_customers_look_unknown() -> anyhow::Result<()> {
    let Some(fx) = fixture().await? else {
        return Ok(());
    };
    let lamp = create_product(&fx, "Desk Lamp", 2000, 4).await?;
    let token = offer_for_customer(&fx, lamp).await?;

    let stranger = create_user(&fx.state, Role::Customer).await?;
    let validated = offer_service::validate_offer(&fx.state, &stranger, &token).await;
    assert!(matches!(validated, Err(AppError::NotFound)));
    let redeemed = offer_service::redeem_offer(&fx.state, &stranger, &token).await;
    assert!(matches!(redeemed, Err(AppError::NotFound)));

    let own = offer_service::validate_offer(&fx.state, &fx.customer, &token)
        .await?
        .data
        .unwrap();
    assert!(own.valid);
    Ok(())
}

#[tokio::test]
async fn cancelling_a_paid_order_refunds_and_restocks() -> anyhow::Result<()> {
    let Some(fx) = fixture().await? else {
        return Ok(());
    };
    let kettle = create_product(&fx, "Kettle", 700, 5).await?;
    add_to_cart(&fx, kettle, 3).await?;

    let order = order_service::checkout(&fx.state, &fx.customer, checkout_request(&fx))
        .await?
        .data
        .unwrap()
        .order;
    let stock = product_service::get_product(&fx.state, kettle).await?.data.unwrap().stock;
    assert_eq!(stock, 2);

    order_service::pay_order(
        &fx.state,
        &fx.customer,
        order.id,
        PayOrderRequest {
            invoice_number: order.invoice_number.clone(),
        },
    )
    .await?;

    let cancelled = order_service::update_order_status(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(cancelled.payment_status, "refunded");

    let stock = product_service::get_product(&fx.state, kettle).await?.data.unwrap().stock;
    assert_eq!(stock, 5);

    let reopened = order_service::update_order_status(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Paid,
        },
    )
    .await;
    assert!(matches!(reopened, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn inactive_products_leave_the_low_stock_list() -> anyhow::Result<()> {
    let Some(fx) = fixture().await? else {
        return Ok(());
    };
    let candle = create_product(&fx, "Candle", 150, 1).await?;
    let vase = create_product(&fx, "Vase", 900, 2).await?;
    product_service::update_product(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        vase,
        UpdateProductRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;

    let low = product_service::list_low_stock(
        &fx.state,
        &fx.merchant,
        fx.store_id,
        LowStockQuery {
            page: None,
            per_page: None,
            threshold: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(low.items.iter().any(|p| p.id == candle));
    assert!(low.items.iter().all(|p| p.id != vase));

    let summary = dashboard_service::summary(&fx.state, &fx.merchant, fx.store_id)
        .await?
        .data
        .unwrap();
    assert_eq!(summary.low_stock_count, low.items.len() as i64);
    Ok(())
}

#[tokio::test]
async fn concurrent_registrations_share_one_email() -> anyhow::Result<()> {
    let Some(fx) = fixture().await? else {
        return Ok(());
    };
    let email = format!("{}@flow.test", Uuid::new_v4().simple());
    let request = || RegisterRequest {
        email: email.clone(),
        password: "correct horse battery".into(),
        name: None,
        role: None,
    };

    let (first, second) = tokio::join!(
        auth_service::register_user(&fx.state, request()),
        auth_service::register_user(&fx.state, request()),
    );
    let winners = [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);
    let loser = if first.is_err() { first } else { second };
    assert!(matches!(loser, Err(AppError::Conflict(_))));
    Ok(())
}
