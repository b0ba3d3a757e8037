use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;

use crate::{
    assistant::{
        Analysis, ChatContext, Intent, OfferContext, OrderContext, StoreContext, analyze,
        prompt::{conversation, fallback_reply, system_instruction},
    },
    dto::assistant::{ChatRequest, ChatResponse, ReplySource},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        personalized_offers::{Column as OfferCol, Entity as PersonalizedOffers},
        products::{Column as ProdCol, Entity as Products},
        stores::Model as StoreModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    services::store_service::find_active_by_slug,
    state::AppState,
};

pub const MAX_MESSAGE_CHARS: usize = 1000;
const MAX_PRODUCTS: u64 = 5;

pub async fn chat(
    state: &AppState,
    slug: &str,
    user: Option<&AuthUser>,
    payload: ChatRequest,
) -> AppResult<ApiResponse<ChatResponse>> {
    let message = payload.message.trim();
    if message.is_empty() || message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "message must be 1 to {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let store = find_active_by_slug(state, slug).await?;
    let analysis = analyze(message);
    let ctx = gather_context(state, &store, user, &analysis).await?;
    let store_ctx = StoreContext {
        name: &store.name,
        support_email: store.support_email.as_deref(),
        currency: &store.currency,
    };

    let (reply, source) = match &state.llm {
        Some(llm) => {
            let system = system_instruction(&store_ctx, &analysis, &ctx);
            let contents = conversation(&payload.history, message);
            match llm.generate(&system, &contents).await {
                Ok(text) => (text, ReplySource::Llm),
                Err(err) => {
                    tracing::warn!(error = %err, store = %store.slug, "assistant llm call failed, using fallback");
                    (fallback_reply(&store_ctx, &analysis, &ctx), ReplySource::Fallback)
                }
            }
        }
        None => (fallback_reply(&store_ctx, &analysis, &ctx), ReplySource::Fallback),
    };

    tracing::debug!(intent = ?analysis.intent, ?source, "assistant reply");

    Ok(ApiResponse::success(
        "OK",
        ChatResponse {
            reply,
            intent: analysis.intent,
            products: ctx.products,
            source,
        },
        None,
    ))
}

async fn gather_context(
    state: &AppState,
    store: &StoreModel,
    user: Option<&AuthUser>,
    analysis: &Analysis,
) -> AppResult<ChatContext> {
    let mut ctx = ChatContext {
        authenticated: user.is_some(),
        ..ChatContext::default()
    };

    match analysis.intent {
        Intent::ProductSearch => {
            ctx.products = search_products(state, store, analysis).await?;
        }
        Intent::OrderStatus => {
            if let Some(user) = user {
                ctx.order = find_order(state, store, user, analysis.invoice_number.as_deref()).await?;
            }
        }
        Intent::Discounts => {
            if let Some(user) = user {
                ctx.offers = active_offers(state, store, user).await?;
            }
        }
        Intent::Greeting | Intent::Returns | Intent::General => {}
    }

    Ok(ctx)
}

async fn search_products(
    state: &AppState,
    store: &StoreModel,
    analysis: &Analysis,
) -> AppResult<Vec<Product>> {
    let mut condition = Condition::all()
        .add(ProdCol::StoreId.eq(store.id))
        .add(ProdCol::IsActive.eq(true));

    if !analysis.keywords.is_empty() {
        let mut any = Condition::any();
        for keyword in &analysis.keywords {
            let pattern = format!("%{keyword}%");
            any = any
                .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Category).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Description).ilike(pattern));
        }
        condition = condition.add(any);
    }
    if let Some(max_price) = analysis.max_price {
        condition = condition.add(ProdCol::Price.lte(max_price));
    }

    let products = Products::find()
        .filter(condition)
        .order_by_desc(ProdCol::Stock.gt(0))
        .order_by_asc(ProdCol::Price)
        .limit(MAX_PRODUCTS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(products)
}

async fn find_order(
    state: &AppState,
    store: &StoreModel,
    user: &AuthUser,
    invoice_number: Option<&str>,
) -> AppResult<Option<OrderContext>> {
    let mut finder = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .filter(OrderCol::StoreId.eq(store.id));
    if let Some(invoice) = invoice_number {
        finder = finder.filter(OrderCol::InvoiceNumber.eq(invoice));
    }

    let order = finder.order_by_desc(OrderCol::CreatedAt).one(&state.orm).await?;
    Ok(order.map(|o| OrderContext {
        invoice_number: o.invoice_number,
        status: o.status,
        payment_status: o.payment_status,
        total_amount: o.total_amount,
        courier: o.courier,
        tracking_number: o.tracking_number,
    }))
}

async fn active_offers(
    state: &AppState,
    store: &StoreModel,
    user: &AuthUser,
) -> AppResult<Vec<OfferContext>> {
    let rows = PersonalizedOffers::find()
        .filter(OfferCol::CustomerId.eq(user.user_id))
        .filter(OfferCol::StoreId.eq(store.id))
        .filter(OfferCol::IsActive.eq(true))
        .filter(OfferCol::IsUsed.eq(false))
        .filter(OfferCol::ExpiresAt.gt(Utc::now()))
        .order_by_asc(OfferCol::ExpiresAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(offer, product)| {
            product.map(|p| OfferContext {
                product_name: p.name,
                discount_percent: offer.discount_percent,
                expires_at: offer.expires_at.with_timezone(&Utc),
            })
        })
        .collect())
}
