//! Outbound HTTP clients for third-party services.

pub mod courier;
pub mod gemini;
