use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use super::value_objects::{Offer, Product};
use crate::domain::SharedClock;

// ============================================================================
// Offer Rules
// ============================================================================
//
// Offer activity is a pure function of the offer and a calendar day. Every
// caller obtains the day from the same injected clock (OfferEvaluator), so
// "now" is consistent across pricing, featured deals and the price cache.
//
// ============================================================================

pub const DEFAULT_FEATURED_LIMIT: usize = 6;

/// `start_date <= on <= end_date`, both ends inclusive.
pub fn is_active(offer: Option<&Offer>, on: NaiveDate) -> bool {
    match offer {
        Some(offer) => offer.start_date <= on && on <= offer.end_date,
        None => false,
    }
}

/// `price * (100 - discount) / 100`, unrounded. Discounts past 100% price at zero.
pub fn discounted_price(price: Decimal, discount_percent: u8) -> Decimal {
    let kept = 100u32.saturating_sub(u32::from(discount_percent));
    price * Decimal::from(kept) / Decimal::ONE_HUNDRED
}

pub fn effective_price(product: &Product, on: NaiveDate) -> Decimal {
    match &product.offer {
        Some(offer) if is_active(Some(offer), on) => discounted_price(product.price, offer.discount_percent),
        _ => product.price,
    }
}

pub fn active_offers<'a, I>(products: I, on: NaiveDate) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    products
        .into_iter()
        .filter(|product| is_active(product.offer.as_ref(), on))
        .collect()
}

/// Active featured offers, first `limit` in input order.
pub fn featured_deals<'a, I>(products: I, on: NaiveDate, limit: usize) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    products
        .into_iter()
        .filter(|product| {
            product
                .offer
                .as_ref()
                .is_some_and(|offer| offer.is_featured && is_active(Some(offer), on))
        })
        .take(limit)
        .collect()
}

/// First day on which `is_active` may answer differently than it does `on`.
/// `None` means it never changes again.
pub fn next_boundary(offer: Option<&Offer>, on: NaiveDate) -> Option<NaiveDate> {
    let offer = offer?;
    if on < offer.start_date {
        Some(offer.start_date)
    } else if on <= offer.end_date {
        offer.end_date.checked_add_days(Days::new(1))
    } else {
        None
    }
}

/// Offer rules bound to a clock.
#[derive(Clone)]
pub struct OfferEvaluator {
    clock: SharedClock,
}

impl OfferEvaluator {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// Current UTC calendar day.
    pub fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }

    pub fn is_active(&self, offer: Option<&Offer>) -> bool {
        is_active(offer, self.today())
    }

    pub fn effective_price(&self, product: &Product) -> Decimal {
        effective_price(product, self.today())
    }

    pub fn featured_deals<'a>(&self, products: &'a [Product], limit: usize) -> Vec<&'a Product> {
        featured_deals(products, self.today(), limit)
    }
}
