use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        OrderStatus, PaymentMethod, PaymentStatus, Role, TicketCategory, TicketPriority,
        TicketStatus, offer::OfferStatus, pricing::DiscountType,
    },
    dto::{
        abandoned_carts::AbandonedCartList,
        admin::AuditLogList,
        assistant::{ChatRequest, ChatResponse, ChatTurn},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartItemDto, CartList},
        coupons::{CouponList, CouponValidation, CreateCouponRequest, UpdateCouponRequest, ValidateCouponRequest},
        dashboard::{OrderStatusCount, StoreSummary},
        offers::{CreateOfferRequest, OfferList, OfferValidation},
        orders::{
            CheckoutRequest, OrderList, OrderTracking, OrderWithItems, PayOrderRequest,
            TrackingEvent, UpdateOrderStatusRequest, UpdateShipmentRequest,
        },
        products::{CreateProductRequest, InventoryAdjustRequest, ProductList, UpdateProductRequest},
        settings::{AppearancePatch, CreateSliderRequest, PatchSettingsRequest, SliderList, UpdateSliderRequest},
        stores::{CreateStoreRequest, StoreList, UpdateStoreRequest},
        tickets::{CreateTicketRequest, ReplyTicketRequest, TicketList, TicketWithMessages, UpdateTicketStatusRequest},
        wishlist::{AddWishlistRequest, WishlistProductList},
    },
    models::{
        AbandonedCart, Appearance, AuditLog, CarouselSlide, CartItem, CartSnapshotLine,
        CategorySlider, Coupon, NavLink, NavMenu, Order, OrderItem, PersonalizedOffer, Product,
        Store, StoreSettings, Ticket, TicketMessage, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, coupons, health,
        merchant::{catalog, fulfillment, stores as merchant_stores},
        offers, orders, products, stores, tickets, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::current_user,
        stores::get_store,
        stores::get_settings,
        stores::list_sliders,
        stores::list_products,
        stores::list_clearance,
        stores::chat,
        products::get_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        coupons::validate_coupon,
        offers::list_my_offers,
        offers::validate_offer,
        offers::redeem_offer,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::pay_order,
        orders::cancel_order,
        orders::track_order,
        tickets::list_my_tickets,
        tickets::create_ticket,
        tickets::get_ticket,
        tickets::reply,
        merchant_stores::list_stores,
        merchant_stores::create_store,
        merchant_stores::update_store,
        merchant_stores::summary,
        merchant_stores::patch_settings,
        merchant_stores::create_slider,
        merchant_stores::update_slider,
        merchant_stores::delete_slider,
        catalog::create_product,
        catalog::update_product,
        catalog::delete_product,
        catalog::list_low_stock,
        catalog::adjust_inventory,
        catalog::list_coupons,
        catalog::create_coupon,
        catalog::update_coupon,
        catalog::delete_coupon,
        catalog::list_offers,
        catalog::generate_offer,
        catalog::deactivate_offer,
        fulfillment::list_orders,
        fulfillment::get_order,
        fulfillment::update_order_status,
        fulfillment::set_shipment,
        fulfillment::list_abandoned_carts,
        fulfillment::remind_abandoned_cart,
        fulfillment::list_tickets,
        fulfillment::update_ticket_status,
        admin::list_audit_logs
    ),
    components(
        schemas(
            User,
            Role,
            Store,
            StoreSettings,
            NavMenu,
            NavLink,
            CarouselSlide,
            Appearance,
            AppearancePatch,
            CategorySlider,
            Product,
            CartItem,
            CartItemDto,
            Coupon,
            DiscountType,
            PersonalizedOffer,
            OfferStatus,
            AbandonedCart,
            CartSnapshotLine,
            Order,
            OrderItem,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            Ticket,
            TicketMessage,
            TicketStatus,
            TicketCategory,
            TicketPriority,
            AuditLog,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateStoreRequest,
            UpdateStoreRequest,
            StoreList,
            PatchSettingsRequest,
            CreateSliderRequest,
            UpdateSliderRequest,
            SliderList,
            CreateProductRequest,
            UpdateProductRequest,
            InventoryAdjustRequest,
            ProductList,
            AddToCartRequest,
            CartList,
            AddWishlistRequest,
            WishlistProductList,
            CreateCouponRequest,
            UpdateCouponRequest,
            ValidateCouponRequest,
            CouponValidation,
            CouponList,
            CreateOfferRequest,
            OfferValidation,
            OfferList,
            AbandonedCartList,
            CheckoutRequest,
            PayOrderRequest,
            UpdateOrderStatusRequest,
            UpdateShipmentRequest,
            OrderWithItems,
            OrderList,
            OrderTracking,
            TrackingEvent,
            CreateTicketRequest,
            ReplyTicketRequest,
            UpdateTicketStatusRequest,
            TicketWithMessages,
            TicketList,
            ChatTurn,
            ChatRequest,
            ChatResponse,
            StoreSummary,
            OrderStatusCount,
            AuditLogList,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Storefront", description = "Public store pages"),
        (name = "Products", description = "Product endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Coupons", description = "Coupon validation"),
        (name = "Offers", description = "Personalized offer tokens"),
        (name = "Orders", description = "Checkout, payment and tracking"),
        (name = "Tickets", description = "Customer support tickets"),
        (name = "Assistant", description = "Shopping assistant chat"),
        (name = "Merchant", description = "Store management"),
        (name = "Admin", description = "Platform administration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
