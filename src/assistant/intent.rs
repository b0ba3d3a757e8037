use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    OrderStatus,
    Returns,
    Discounts,
    ProductSearch,
    General,
}

/// What the heuristics pulled out of one customer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub intent: Intent,
    pub max_price: Option<i64>,
    pub invoice_number: Option<String>,
    pub keywords: Vec<String>,
}

static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(hi|hello|hey|hiya|namaste|good\s+(morning|afternoon|evening))\b")
        .expect("greeting regex")
});

static ORDER_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(track(ing)?|where\s+is\s+my\s+(order|package|parcel|shipment)|order\s+status|delivery\s+status|dispatched|shipped|out\s+for\s+delivery)\b",
    )
    .expect("order status regex")
});

static RETURNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(return|refund|exchange|replacement|replace|damaged|defective)\w*")
        .expect("returns regex")
});

static DISCOUNTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(discount|coupon|promo|voucher|offer|deal)s?\b").expect("discounts regex")
});

static PRODUCT_SEARCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(show\s+me|looking\s+for|do\s+you\s+(have|sell|stock)|recommend|suggest|buy|find|search|price\s+of|under|below|less\s+than|cheapest|available)\b",
    )
    .expect("product search regex")
});

static PRICE_CEILING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:under|below|less\s+than|within|up\s*to|max(?:imum)?)\s*(?:rs\.?|inr|₹|\$)?\s*([0-9][0-9,]*)",
    )
    .expect("price regex")
});

static INVOICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bINV-\d{8}-[0-9a-f]{8}\b").expect("invoice regex"));

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z][a-zA-Z0-9-]{2,}").expect("word regex"));

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "you", "your", "have", "has", "are", "was", "any", "can", "could",
    "would", "should", "please", "want", "need", "looking", "show", "find", "search", "buy",
    "some", "something", "with", "that", "this", "what", "which", "there", "here", "from",
    "under", "below", "less", "than", "within", "upto", "price", "prices", "cost", "cheap",
    "cheapest", "recommend", "suggest", "sell", "stock", "available", "tell", "about", "like",
    "get", "give", "hello", "hey", "thanks", "thank", "how", "much", "does", "rs", "inr",
    "maximum", "max", "all", "good", "best", "new", "one", "ones",
];

const MAX_KEYWORDS: usize = 5;

pub fn analyze(message: &str) -> Analysis {
    let invoice_number = INVOICE
        .find(message)
        .map(|m| format!("INV{}", m.as_str()[3..].to_ascii_lowercase()));
    let max_price = extract_price_ceiling(message);

    let intent = if invoice_number.is_some() || ORDER_STATUS.is_match(message) {
        Intent::OrderStatus
    } else if RETURNS.is_match(message) {
        Intent::Returns
    } else if DISCOUNTS.is_match(message) {
        Intent::Discounts
    } else if PRODUCT_SEARCH.is_match(message) || max_price.is_some() {
        Intent::ProductSearch
    } else if GREETING.is_match(message) {
        Intent::Greeting
    } else {
        Intent::General
    };

    Analysis {
        intent,
        max_price,
        invoice_number,
        keywords: extract_keywords(message),
    }
}

fn extract_price_ceiling(message: &str) -> Option<i64> {
    let caps = PRICE_CEILING.captures(message)?;
    let digits: String = caps.get(1)?.as_str().chars().filter(|c| *c != ',').collect();
    digits.parse::<i64>().ok().filter(|v| *v > 0)
}

fn extract_keywords(message: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in WORD.find_iter(message) {
        let word = word.as_str().to_ascii_lowercase();
        if STOP_WORDS.contains(&word.as_str()) || word.starts_with("inv-") {
            continue;
        }
        let singular = word
            .strip_suffix('s')
            .filter(|stem| stem.len() >= 3)
            .map(str::to_string)
            .unwrap_or(word);
        if !keywords.contains(&singular) {
            keywords.push(singular);
        }
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_order_tracking_with_invoice() {
        let a = analyze("Hi, where is my order INV-20240102-1a2b3c4d?");
        assert_eq!(a.intent, Intent::OrderStatus);
        assert_eq!(a.invoice_number.as_deref(), Some("INV-20240102-1a2b3c4d"));
    }

    #[test]
    fn detects_product_search_with_price_ceiling() {
        let a = analyze("Do you have cotton hoodies under ₹1,500?");
        assert_eq!(a.intent, Intent::ProductSearch);
        assert_eq!(a.max_price, Some(1500));
        assert_eq!(a.keywords, vec!["cotton".to_string(), "hoodie".to_string()]);
    }

    #[test]
    fn returns_beat_discounts() {
        assert_eq!(analyze("I want a refund on my sale item").intent, Intent::Returns);
        assert_eq!(analyze("any coupon codes today?").intent, Intent::Discounts);
    }

    #[test]
    fn plain_greeting_and_general() {
        assert_eq!(analyze("hello there").intent, Intent::Greeting);
        assert_eq!(analyze("what are your opening hours").intent, Intent::General);
    }

    #[test]
    fn greeting_followed_by_question_is_not_a_greeting() {
        assert_eq!(analyze("hey, show me mugs").intent, Intent::ProductSearch);
    }

    #[test]
    fn keywords_skip_stop_words_and_cap() {
        let a = analyze("show me red blue green yellow purple orange shirts");
        assert_eq!(a.keywords.len(), MAX_KEYWORDS);
        assert!(!a.keywords.contains(&"show".to_string()));
    }

    #[test]
    fn zero_price_is_ignored() {
        assert_eq!(analyze("anything under 0").max_price, None);
    }
}
