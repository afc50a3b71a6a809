use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::product::check_len;

pub const DEFAULT_PAYMENT_METHOD: &str = "cod";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidInput(format!("Invalid order status '{}'", s)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl ShippingAddress {
    fn check(&self) -> Result<(), DomainError> {
        if self.street.trim().is_empty() || self.city.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "Valid shipping address is required".into(),
            ));
        }
        check_len("Street", &self.street, 255)?;
        check_len("City", &self.city, 255)?;
        check_len("State", &self.state, 255)?;
        check_len("Zip code", &self.zip_code, 20)
    }
}

/// One cart line as submitted by the client, before validation.
#[derive(Debug, Clone, Default)]
pub struct OrderLineDraft {
    pub product: Option<String>,
    pub quantity: Option<i64>,
    /// Price the client saw. Checked for sanity, never stored.
    pub price: Option<f64>,
}

/// An order as submitted at checkout, before validation.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    pub items: Vec<OrderLineDraft>,
    pub shipping_address: Option<ShippingAddress>,
    pub total_amount: Option<f64>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A validated order, ready for stock reservation.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub lines: Vec<OrderLineInput>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
}

impl OrderDraft {
    /// Checks the draft shape line by line. Item positions in messages are
    /// 1-based to match what a shopper sees in the cart.
    pub fn validate(self, user_id: Uuid) -> Result<NewOrder, DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::InvalidInput("Invalid order items".into()));
        }

        let shipping_address = self.shipping_address.ok_or_else(|| {
            DomainError::InvalidInput("Valid shipping address is required".into())
        })?;
        shipping_address.check()?;

        if matches!(self.total_amount, Some(total) if total <= 0.0) {
            return Err(DomainError::InvalidInput("Valid total amount is required".into()));
        }

        let mut lines = Vec::with_capacity(self.items.len());
        for (index, item) in self.items.into_iter().enumerate() {
            let position = index + 1;

            let quantity = item
                .quantity
                .filter(|q| *q > 0)
                .and_then(|q| i32::try_from(q).ok())
                .ok_or_else(|| {
                    DomainError::InvalidInput(format!("Invalid quantity at item {}", position))
                })?;

            if matches!(item.price, Some(price) if price <= 0.0) {
                return Err(DomainError::InvalidInput(format!(
                    "Invalid price at item {}",
                    position
                )));
            }

            let product = item.product.filter(|p| !p.trim().is_empty()).ok_or_else(|| {
                DomainError::InvalidInput(format!("Missing product ID at item {}", position))
            })?;
            let product_id = Uuid::parse_str(product.trim()).map_err(|_| {
                DomainError::InvalidInput(format!(
                    "Invalid product ID format at item {}",
                    position
                ))
            })?;

            lines.push(OrderLineInput {
                product_id,
                quantity,
            });
        }

        let payment_method = self
            .payment_method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
        check_len("Payment method", &payment_method, 50)?;

        Ok(NewOrder {
            user_id,
            lines,
            shipping_address,
            payment_method,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    /// `None` once the product has been removed from the catalogue.
    pub id: Option<Uuid>,
    pub name: String,
    pub price: BigDecimal,
    pub image_url: String,
}

impl ProductSummary {
    pub fn unavailable(price: BigDecimal) -> Self {
        Self {
            id: None,
            name: "Product No Longer Available".into(),
            price,
            image_url: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price captured when the order was placed.
    pub price: BigDecimal,
    pub product: ProductSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSummary {
    pub name: String,
    pub email: String,
}

impl CustomerSummary {
    pub fn unknown() -> Self {
        Self {
            name: "Unknown User".into(),
            email: "deleted@user.com".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Filled in for administrator listings only.
    pub customer: Option<CustomerSummary>,
    pub lines: Vec<OrderLineView>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesStats {
    pub total_orders: i64,
    pub revenue: BigDecimal,
}

/// Σ(price × quantity) over the given lines.
pub fn order_total<'a, I>(lines: I) -> BigDecimal
where
    I: IntoIterator<Item = (&'a BigDecimal, i32)>,
{
    lines
        .into_iter()
        .fold(BigDecimal::zero(), |acc, (price, quantity)| {
            acc + price * BigDecimal::from(quantity)
        })
}
