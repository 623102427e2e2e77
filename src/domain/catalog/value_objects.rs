use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::CatalogError;
use crate::document_store::Document;

// ============================================================================
// Catalog Value Objects
// ============================================================================

pub const MIN_DISCOUNT_PERCENT: u8 = 1;
pub const MAX_DISCOUNT_PERCENT: u8 = 90;

/// Time-windowed percentage discount attached to a product.
///
/// Both dates are inclusive calendar days.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub discount_percent: u8,
    #[serde(default)]
    pub offer_title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_featured: bool,
}

impl Offer {
    fn check(&self) -> Result<(), String> {
        if !(MIN_DISCOUNT_PERCENT..=MAX_DISCOUNT_PERCENT).contains(&self.discount_percent) {
            return Err(format!(
                "discount {}% outside {}..={}",
                self.discount_percent, MIN_DISCOUNT_PERCENT, MAX_DISCOUNT_PERCENT
            ));
        }
        if self.start_date > self.end_date {
            return Err(format!(
                "offer starts {} after it ends {}",
                self.start_date, self.end_date
            ));
        }
        Ok(())
    }
}

/// Offer as submitted by an admin, before validation.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OfferDraft {
    pub discount_percent: u32,
    #[serde(default)]
    pub offer_title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_featured: bool,
}

impl OfferDraft {
    pub fn into_offer(self) -> Result<Offer, CatalogError> {
        let discount_percent = u8::try_from(self.discount_percent)
            .map_err(|_| CatalogError::InvalidOffer(format!("discount {}% out of range", self.discount_percent)))?;

        let offer = Offer {
            discount_percent,
            offer_title: self
                .offer_title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty()),
            start_date: self.start_date,
            end_date: self.end_date,
            is_featured: self.is_featured,
        };
        offer.check().map_err(CatalogError::InvalidOffer)?;
        Ok(offer)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub offer: Option<Offer>,
}

impl Document for Product {
    fn collection() -> &'static str {
        "products"
    }

    fn key(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id is blank".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("name is blank".to_string());
        }
        if self.price.is_sign_negative() {
            return Err(format!("negative price {}", self.price));
        }
        match &self.offer {
            Some(offer) => offer.check(),
            None => Ok(()),
        }
    }
}
