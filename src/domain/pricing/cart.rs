use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::engine::{PriceBreakdown, PricedLine, PricingEngine};
use super::errors::{CartError, PricingError};
use crate::domain::catalog::{effective_price, Product};
use crate::domain::order::OrderLineItem;

// ============================================================================
// Cart
// ============================================================================
//
// A line's unit price is the effective price on the day the product was
// first added. Adding the same product again raises the quantity but keeps
// that price. Stock is a snapshot taken when the product was added and is
// only used to cap quantities here.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub stock: u32,
    pub image_url: Option<String>,
}

impl PricedLine for CartLine {
    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-line checkout of one unit, bypassing the stored cart.
    pub fn buy_now(product: &Product, on: NaiveDate) -> Result<Self, CartError> {
        let mut cart = Self::new();
        cart.add_product(product, 1, on)?;
        Ok(cart)
    }

    pub fn add_product(&mut self, product: &Product, quantity: u32, on: NaiveDate) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::QuantityBelowOne);
        }
        if product.stock == 0 {
            return Err(CartError::OutOfStock(product.id.clone()));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let requested = line.quantity.saturating_add(quantity);
            if requested > product.stock {
                return Err(CartError::ExceedsStock {
                    product_id: product.id.clone(),
                    requested,
                    stock: product.stock,
                });
            }
            line.quantity = requested;
            line.stock = product.stock;
            return Ok(());
        }

        if quantity > product.stock {
            return Err(CartError::ExceedsStock {
                product_id: product.id.clone(),
                requested: quantity,
                stock: product.stock,
            });
        }

        let unit_price = effective_price(product, on);
        tracing::debug!(product_id = %product.id, %unit_price, quantity, "Added to cart");
        self.lines.push(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price,
            quantity,
            stock: product.stock,
            image_url: product.image_url.clone(),
        });
        Ok(())
    }

    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.to_string()))?;

        if quantity < 1 {
            return Err(CartError::QuantityBelowOne);
        }
        if quantity > line.stock {
            return Err(CartError::ExceedsStock {
                product_id: product_id.to_string(),
                requested: quantity,
                stock: line.stock,
            });
        }
        line.quantity = quantity;
        Ok(())
    }

    /// Returns false if the product was not in the cart.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quote(&self, engine: &PricingEngine) -> Result<PriceBreakdown, PricingError> {
        engine.quote(&self.lines)
    }

    /// Order line items carrying the frozen prices.
    pub fn line_items(&self) -> Vec<OrderLineItem> {
        self.lines
            .iter()
            .map(|line| {
                OrderLineItem::new(
                    line.product_id.clone(),
                    line.name.clone(),
                    line.unit_price,
                    line.quantity,
                    line.image_url.clone(),
                )
            })
            .collect()
    }
}
