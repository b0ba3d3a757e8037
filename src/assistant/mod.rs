//! Shopping assistant: intent heuristics and prompt assembly around an LLM call.

pub mod intent;
pub mod prompt;

pub use intent::{Analysis, Intent, analyze};
pub use prompt::{ChatContext, OfferContext, OrderContext, StoreContext};
