use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::offers::{effective_price, next_boundary};
use super::value_objects::Product;
use crate::document_store::Versioned;
use crate::metrics::Metrics;

// ============================================================================
// Effective Price Cache
// ============================================================================
//
// An entry is reused only while all of these hold:
// - the product document is still at the version it was computed from
// - the day is not earlier than the day it was computed on
// - the day is before the offer's next boundary (start, or the day after end)
//
// ============================================================================

#[derive(Debug, Clone)]
struct CachedPrice {
    version: i64,
    price: Decimal,
    computed_on: NaiveDate,
    valid_until: Option<NaiveDate>,
}

impl CachedPrice {
    fn is_valid(&self, version: i64, on: NaiveDate) -> bool {
        self.version == version
            && on >= self.computed_on
            && self.valid_until.map_or(true, |until| on < until)
    }
}

#[derive(Default)]
pub struct EffectivePriceCache {
    entries: HashMap<String, CachedPrice>,
    metrics: Option<Arc<Metrics>>,
}

impl EffectivePriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn price(&mut self, product: &Versioned<Product>, on: NaiveDate) -> Decimal {
        let hit = self
            .entries
            .get(&product.id)
            .filter(|cached| cached.is_valid(product.version, on))
            .map(|cached| cached.price);

        if let Some(metrics) = &self.metrics {
            metrics.record_cache_lookup(hit.is_some());
        }
        if let Some(price) = hit {
            return price;
        }

        let price = effective_price(&product.data, on);
        self.entries.insert(
            product.id.clone(),
            CachedPrice {
                version: product.version,
                price,
                computed_on: on,
                valid_until: next_boundary(product.data.offer.as_ref(), on),
            },
        );
        price
    }

    pub fn invalidate(&mut self, product_id: &str) {
        self.entries.remove(product_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
