use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::intent::{Analysis, Intent};
use crate::{
    dto::assistant::{ChatRole, ChatTurn},
    integrations::gemini::{Content, ContentRole},
    models::Product,
};

pub const MAX_HISTORY_TURNS: usize = 10;

pub struct StoreContext<'a> {
    pub name: &'a str,
    pub support_email: Option<&'a str>,
    pub currency: &'a str,
}

#[derive(Debug, Clone)]
pub struct OrderContext {
    pub invoice_number: String,
    pub status: String,
    pub payment_status: String,
    pub total_amount: i64,
    pub courier: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OfferContext {
    pub product_name: String,
    pub discount_percent: i32,
    pub expires_at: DateTime<Utc>,
}

/// Data looked up for one message.
#[derive(Debug, Default)]
pub struct ChatContext {
    pub authenticated: bool,
    pub products: Vec<Product>,
    pub order: Option<OrderContext>,
    pub offers: Vec<OfferContext>,
}

pub fn system_instruction(store: &StoreContext<'_>, analysis: &Analysis, ctx: &ChatContext) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are the shopping assistant for the online store \"{}\".",
        store.name
    );
    out.push_str("Rules:\n");
    out.push_str("- Only answer questions about this store, its products and orders.\n");
    out.push_str("- Never invent products, prices, discounts or order details. Use only the context below.\n");
    out.push_str("- Keep answers short and friendly.\n");
    let _ = writeln!(out, "- Prices are in {}.", store.currency);
    match store.support_email {
        Some(email) => {
            let _ = writeln!(out, "- For anything you cannot resolve, point the customer to {email}.");
        }
        None => out.push_str("- For anything you cannot resolve, suggest opening a support ticket.\n"),
    }

    let _ = writeln!(out, "\nDetected intent: {:?}", analysis.intent);
    out.push_str("Context:\n");
    out.push_str(&context_block(store, ctx));
    out
}

fn context_block(store: &StoreContext<'_>, ctx: &ChatContext) -> String {
    let mut out = String::new();
    if ctx.products.is_empty() {
        out.push_str("Products: none matched.\n");
    } else {
        out.push_str("Products:\n");
        for p in &ctx.products {
            let _ = write!(out, "- {} | {} {}", p.name, p.price, store.currency);
            if let Some(percent) = p.discount_percent {
                let _ = write!(out, " ({percent}% off)");
            }
            let _ = writeln!(out, " | stock {}", p.stock);
        }
    }
    match &ctx.order {
        Some(order) => {
            let _ = writeln!(
                out,
                "Order {}: status {}, payment {}, total {} {}",
                order.invoice_number,
                order.status,
                order.payment_status,
                order.total_amount,
                store.currency
            );
            if let Some(tracking) = &order.tracking_number {
                let _ = writeln!(
                    out,
                    "Shipped via {} with tracking number {tracking}",
                    order.courier.as_deref().unwrap_or("courier")
                );
            }
        }
        None if !ctx.authenticated => out.push_str("Customer is not signed in.\n"),
        None => {}
    }
    for offer in &ctx.offers {
        let _ = writeln!(
            out,
            "Personal offer: {}% off {} until {}",
            offer.discount_percent,
            offer.product_name,
            offer.expires_at.format("%Y-%m-%d")
        );
    }
    out
}

/// Prior turns (most recent `MAX_HISTORY_TURNS`) followed by the new message.
pub fn conversation(history: &[ChatTurn], message: &str) -> Vec<Content> {
    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut contents: Vec<Content> = history[start..]
        .iter()
        .filter(|turn| !turn.content.trim().is_empty())
        .map(|turn| {
            let role = match turn.role {
                ChatRole::User => ContentRole::User,
                ChatRole::Assistant => ContentRole::Model,
            };
            Content::text(role, turn.content.trim())
        })
        .collect();
    contents.push(Content::text(ContentRole::User, message.trim()));
    contents
}

/// Reply used when no LLM is configured or the call fails.
pub fn fallback_reply(store: &StoreContext<'_>, analysis: &Analysis, ctx: &ChatContext) -> String {
    let contact = match store.support_email {
        Some(email) => format!("email us at {email}"),
        None => "open a support ticket".to_string(),
    };

    match analysis.intent {
        Intent::Greeting => format!(
            "Hi! Welcome to {}. I can help you find products, check an order or look up offers.",
            store.name
        ),
        Intent::OrderStatus => match &ctx.order {
            Some(order) => {
                let mut reply = format!(
                    "Order {} is currently {} (payment {}).",
                    order.invoice_number, order.status, order.payment_status
                );
                if let Some(tracking) = &order.tracking_number {
                    let _ = write!(
                        reply,
                        " It was shipped via {} with tracking number {tracking}.",
                        order.courier.as_deref().unwrap_or("our courier")
                    );
                }
                reply
            }
            None if !ctx.authenticated => {
                "Please sign in so I can look up your order.".to_string()
            }
            None => "I couldn't find that order on your account. Please check the invoice number."
                .to_string(),
        },
        Intent::Returns => format!(
            "For returns, refunds or exchanges please {contact} with your invoice number and we'll sort it out."
        ),
        Intent::Discounts => {
            if ctx.offers.is_empty() {
                "There are no personal offers on your account right now. Keep an eye on our sale section!"
                    .to_string()
            } else {
                let mut reply = String::from("You have these personal offers:");
                for offer in &ctx.offers {
                    let _ = write!(
                        reply,
                        " {}% off {} (until {});",
                        offer.discount_percent,
                        offer.product_name,
                        offer.expires_at.format("%Y-%m-%d")
                    );
                }
                reply.pop();
                reply.push('.');
                reply
            }
        }
        Intent::ProductSearch => {
            if ctx.products.is_empty() {
                "I couldn't find matching products. Try a different keyword or browse our catalog."
                    .to_string()
            } else {
                let names: Vec<String> = ctx
                    .products
                    .iter()
                    .map(|p| format!("{} ({} {})", p.name, p.price, store.currency))
                    .collect();
                format!("Here's what I found: {}.", names.join(", "))
            }
        }
        Intent::General => format!(
            "I can help with products, orders, returns and offers at {}. For anything else please {contact}.",
            store.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::analyze;
    use chrono::Utc;
    use uuid::Uuid;

    fn store() -> StoreContext<'static> {
        StoreContext {
            name: "Ferris Goods",
            support_email: Some("help@ferris.test"),
            currency: "INR",
        }
    }

    fn product(name: &str, price: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            category: None,
            price,
            compare_at_price: None,
            discount_percent: None,
            stock: 3,
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn product_fallback_lists_matches() {
        let ctx = ChatContext {
            products: vec![product("Crab Mug", 499), product("Crab Tee", 899)],
            ..Default::default()
        };
        let reply = fallback_reply(&store(), &analyze("show me mugs"), &ctx);
        assert_eq!(reply, "Here's what I found: Crab Mug (499 INR), Crab Tee (899 INR).");
    }

    #[test]
    fn order_fallback_asks_anonymous_users_to_sign_in() {
        let reply = fallback_reply(
            &store(),
            &analyze("where is my order"),
            &ChatContext::default(),
        );
        assert!(reply.contains("sign in"));
    }

    #[test]
    fn system_instruction_carries_store_and_context() {
        let ctx = ChatContext {
            authenticated: true,
            products: vec![product("Crab Mug", 499)],
            ..Default::default()
        };
        let text = system_instruction(&store(), &analyze("mugs under 600"), &ctx);
        assert!(text.contains("\"Ferris Goods\""));
        assert!(text.contains("help@ferris.test"));
        assert!(text.contains("- Crab Mug | 499 INR | stock 3"));
    }

    #[test]
    fn conversation_keeps_last_turns_and_appends_message() {
        let history: Vec<ChatTurn> = (0..14)
            .map(|i| ChatTurn {
                role: if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant },
                content: format!("turn {i}"),
            })
            .collect();
        let contents = conversation(&history, "latest");
        assert_eq!(contents.len(), MAX_HISTORY_TURNS + 1);
        assert_eq!(contents[0].parts[0].text, "turn 4");
        assert_eq!(contents[0].role, Some(ContentRole::User));
        assert_eq!(contents[1].role, Some(ContentRole::Model));
        assert_eq!(contents.last().map(|c| c.parts[0].text.as_str()), Some("latest"));
    }
}
