//! Shopper-side cart state.
//!
//! The cart lives with the client between requests and is only turned into
//! an order at checkout. It is persisted as JSON with explicit `load`/`save`
//! calls so the storage boundary stays visible.

use std::fs;
use std::io;
use std::path::Path;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::order::OrderLineDraft;
use super::product::Product;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart storage error: {0}")]
    Io(#[from] io::Error),
    #[error("cart file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: BigDecimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a saved cart. A missing file is an empty cart.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CartError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CartError> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Adds `quantity` units, merging with an existing line for the same product.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|item| item.product_id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartItem {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price.clone(),
                quantity,
            }),
        }
    }

    pub fn remove(&mut self, product_id: Uuid) {
        self.items.retain(|item| item.product_id != product_id);
    }

    /// Sets the quantity for a line. Values below one are ignored; use `remove`.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: u32) {
        if quantity < 1 {
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.product_id == product_id) {
            item.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> BigDecimal {
        self.items.iter().fold(BigDecimal::zero(), |acc, item| {
            acc + &item.unit_price * BigDecimal::from(item.quantity)
        })
    }

    /// Lines in the shape the checkout endpoint accepts.
    pub fn order_lines(&self) -> Vec<OrderLineDraft> {
        self.items
            .iter()
            .map(|item| OrderLineDraft {
                product: Some(item.product_id.to_string()),
                quantity: Some(i64::from(item.quantity)),
                price: item.unit_price.to_f64(),
            })
            .collect()
    }
}
