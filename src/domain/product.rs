use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Products whose stock falls below this count are reported as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

// Column widths of the products table.
const MAX_NAME_LEN: usize = 255;
const MAX_CATEGORY_LEN: usize = 100;
const MAX_IMAGE_URL_LEN: usize = 512;
/// Prices are stored as NUMERIC(10, 2).
const PRICE_SCALE: i64 = 2;
const PRICE_LIMIT: i64 = 100_000_000;

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub category: String,
    pub image_url: String,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new catalogue entry.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub category: String,
    pub image_url: String,
    pub stock: i32,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_name(&self.name)?;
        check_category(&self.category)?;
        check_image_url(&self.image_url)?;
        check_price(&self.price)?;
        check_stock(self.stock)
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
}

impl ProductChanges {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        if let Some(category) = &self.category {
            check_category(category)?;
        }
        if let Some(image_url) = &self.image_url {
            check_image_url(image_url)?;
        }
        if let Some(price) = &self.price {
            check_price(price)?;
        }
        if let Some(stock) = self.stock {
            check_stock(stock)?;
        }
        Ok(())
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = image_url;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryStats {
    pub total_products: i64,
    pub low_stock: i64,
}

/// Parse a decimal price such as `"24.99"`.
pub fn parse_price(raw: &str) -> Result<BigDecimal, DomainError> {
    let price = BigDecimal::from_str(raw.trim())
        .map_err(|_| DomainError::InvalidInput(format!("Invalid price '{}'", raw)))?;
    check_price(&price)?;
    Ok(price)
}

pub fn parse_stock(raw: &str) -> Result<i32, DomainError> {
    let stock = raw
        .trim()
        .parse::<i32>()
        .map_err(|_| DomainError::InvalidInput(format!("Invalid stock '{}'", raw)))?;
    check_stock(stock)?;
    Ok(stock)
}

fn check_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidInput("Product name is required".into()));
    }
    check_len("Product name", name, MAX_NAME_LEN)
}

fn check_category(category: &str) -> Result<(), DomainError> {
    if category.trim().is_empty() {
        return Err(DomainError::InvalidInput("Product category is required".into()));
    }
    check_len("Product category", category, MAX_CATEGORY_LEN)
}

fn check_image_url(image_url: &str) -> Result<(), DomainError> {
    check_len("Image URL", image_url, MAX_IMAGE_URL_LEN)
}

/// Rejects text longer than `max` characters.
pub(crate) fn check_len(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn check_price(price: &BigDecimal) -> Result<(), DomainError> {
    if price <= &BigDecimal::zero() {
        return Err(DomainError::InvalidInput("Price must be greater than zero".into()));
    }
    let (_, scale) = price.normalized().as_bigint_and_exponent();
    if scale > PRICE_SCALE {
        return Err(DomainError::InvalidInput(
            "Price cannot have more than two decimal places".into(),
        ));
    }
    if price >= &BigDecimal::from(PRICE_LIMIT) {
        return Err(DomainError::InvalidInput("Price is too large".into()));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), DomainError> {
    if stock < 0 {
        return Err(DomainError::InvalidInput("Stock cannot be negative".into()));
    }
    Ok(())
}
