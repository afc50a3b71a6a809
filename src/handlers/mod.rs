pub mod admin;
pub mod auth;
pub mod chatbot;
pub mod orders;
pub mod products;

use bigdecimal::BigDecimal;

/// Amounts go over the wire as JSON numbers.
pub(crate) fn money(amount: &BigDecimal) -> f64 {
    amount.to_string().parse().unwrap_or_default()
}
