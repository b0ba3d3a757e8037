use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::pricing::sale_discount_percent,
    entity::{
        abandoned_carts, audit_logs, cart_items, category_sliders, coupons, order_items, orders,
        personalized_offers, products, store_settings, stores, ticket_messages, tickets, users,
    },
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Store {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub support_email: Option<String>,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<stores::Model> for Store {
    fn from(model: stores::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            support_email: model.support_email,
            currency: model.currency,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NavMenu {
    pub label: String,
    pub href: String,
    #[serde(default)]
    pub children: Vec<NavLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CarouselSlide {
    pub image_url: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub link_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(default)]
pub struct Appearance {
    pub show_search: bool,
    pub show_wishlist: bool,
    pub show_category_sliders: bool,
    pub show_carousel: bool,
    pub show_chat_assistant: bool,
    pub dark_mode: bool,
    pub primary_color: String,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            show_search: true,
            show_wishlist: true,
            show_category_sliders: true,
            show_carousel: true,
            show_chat_assistant: false,
            dark_mode: false,
            primary_color: "#111827".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoreSettings {
    pub store_id: Uuid,
    pub navbar_menus: Vec<NavMenu>,
    pub carousel_slides: Vec<CarouselSlide>,
    pub appearance: Appearance,
    pub updated_at: DateTime<Utc>,
}

impl From<store_settings::Model> for StoreSettings {
    fn from(model: store_settings::Model) -> Self {
        // Stored documents are tolerated even when they predate a field change.
        Self {
            store_id: model.store_id,
            navbar_menus: serde_json::from_value(model.navbar_menus).unwrap_or_default(),
            carousel_slides: serde_json::from_value(model.carousel_slides).unwrap_or_default(),
            appearance: serde_json::from_value(model.appearance).unwrap_or_default(),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategorySlider {
    pub id: Uuid,
    pub store_id: Uuid,
    pub title: String,
    pub category: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<category_sliders::Model> for CategorySlider {
    fn from(model: category_sliders::Model) -> Self {
        Self {
            id: model.id,
            store_id: model.store_id,
            title: model.title,
            category: model.category,
            image_url: model.image_url,
            link_url: model.link_url,
            position: model.position,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: i64,
    pub compare_at_price: Option<i64>,
    /// Percentage below `compare_at_price`, present only for sale items.
    pub discount_percent: Option<i64>,
    pub stock: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            discount_percent: sale_discount_percent(model.price, model.compare_at_price),
            id: model.id,
            store_id: model.store_id,
            name: model.name,
            description: model.description,
            category: model.category,
            price: model.price,
            compare_at_price: model.compare_at_price,
            stock: model.stock,
            image_url: model.image_url,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            store_id: model.store_id,
            user_id: model.user_id,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Coupon {
    pub id: Uuid,
    pub store_id: Uuid,
    pub code: String,
    pub discount_type: String,
    pub discount_value: i64,
    pub min_order_amount: i64,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<coupons::Model> for Coupon {
    fn from(model: coupons::Model) -> Self {
        Self {
            id: model.id,
            store_id: model.store_id,
            code: model.code,
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            min_order_amount: model.min_order_amount,
            max_uses: model.max_uses,
            used_count: model.used_count,
            starts_at: model.starts_at.map(|dt| dt.with_timezone(&Utc)),
            expires_at: model.expires_at.map(|dt| dt.with_timezone(&Utc)),
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PersonalizedOffer {
    pub id: Uuid,
    pub store_id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub token: String,
    pub discount_percent: i32,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<personalized_offers::Model> for PersonalizedOffer {
    fn from(model: personalized_offers::Model) -> Self {
        Self {
            id: model.id,
            store_id: model.store_id,
            customer_id: model.customer_id,
            product_id: model.product_id,
            token: model.token,
            discount_percent: model.discount_percent,
            expires_at: model.expires_at.with_timezone(&Utc),
            is_active: model.is_active,
            is_used: model.is_used,
            used_at: model.used_at.map(|dt| dt.with_timezone(&Utc)),
            order_id: model.order_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// One line of an abandoned-cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CartSnapshotLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AbandonedCart {
    pub id: Uuid,
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartSnapshotLine>,
    pub item_count: i32,
    pub total_amount: i64,
    pub status: String,
    pub last_activity_at: DateTime<Utc>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub recovered_order_id: Option<Uuid>,
}

impl From<abandoned_carts::Model> for AbandonedCart {
    fn from(model: abandoned_carts::Model) -> Self {
        Self {
            id: model.id,
            store_id: model.store_id,
            user_id: model.user_id,
            items: serde_json::from_value(model.items).unwrap_or_default(),
            item_count: model.item_count,
            total_amount: model.total_amount,
            status: model.status,
            last_activity_at: model.last_activity_at.with_timezone(&Utc),
            reminder_sent_at: model.reminder_sent_at.map(|dt| dt.with_timezone(&Utc)),
            recovered_order_id: model.recovered_order_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub subtotal_amount: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub status: String,
    pub payment_status: String,
    pub invoice_number: String,
    pub coupon_code: Option<String>,
    pub offer_id: Option<Uuid>,
    pub shipping_address: String,
    pub payment_method: String,
    pub courier: Option<String>,
    pub tracking_number: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            store_id: model.store_id,
            user_id: model.user_id,
            subtotal_amount: model.subtotal_amount,
            discount_amount: model.discount_amount,
            total_amount: model.total_amount,
            status: model.status,
            payment_status: model.payment_status,
            invoice_number: model.invoice_number,
            coupon_code: model.coupon_code,
            offer_id: model.offer_id,
            shipping_address: model.shipping_address,
            payment_method: model.payment_method,
            courier: model.courier,
            tracking_number: model.tracking_number,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub discount_amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            quantity: model.quantity,
            price: model.price,
            discount_amount: model.discount_amount,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Ticket {
    pub id: Uuid,
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub subject: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<tickets::Model> for Ticket {
    fn from(model: tickets::Model) -> Self {
        Self {
            id: model.id,
            store_id: model.store_id,
            user_id: model.user_id,
            order_id: model.order_id,
            subject: model.subject,
            category: model.category,
            priority: model.priority,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub author_role: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<ticket_messages::Model> for TicketMessage {
    fn from(model: ticket_messages::Model) -> Self {
        Self {
            id: model.id,
            ticket_id: model.ticket_id,
            author_id: model.author_id,
            author_role: model.author_role,
            body: model.body,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<audit_logs::Model> for AuditLog {
    fn from(model: audit_logs::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            resource: model.resource,
            metadata: model.metadata,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
