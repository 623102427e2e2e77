use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::errors::CatalogError;
use super::offers::{active_offers, OfferEvaluator, DEFAULT_FEATURED_LIMIT};
use super::price_cache::EffectivePriceCache;
use super::value_objects::{OfferDraft, Product};
use crate::document_store::{Document, DocumentStore, Versioned};
use crate::domain::{ActorContext, SharedClock};
use crate::metrics::Metrics;

// ============================================================================
// Catalog Service
// ============================================================================
//
// Orchestrates: load product → change offer → compare-and-swap
//
// Reads (active offers, featured deals, effective price) all take "today"
// from the same OfferEvaluator.
//
// ============================================================================

pub struct CatalogService {
    store: Arc<dyn DocumentStore<Product>>,
    evaluator: OfferEvaluator,
    featured_limit: usize,
    price_cache: Mutex<EffectivePriceCache>,
    metrics: Option<Arc<Metrics>>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore<Product>>, clock: SharedClock) -> Self {
        Self {
            store,
            evaluator: OfferEvaluator::new(clock),
            featured_limit: DEFAULT_FEATURED_LIMIT,
            price_cache: Mutex::new(EffectivePriceCache::new()),
            metrics: None,
        }
    }

    pub fn with_featured_limit(mut self, limit: usize) -> Self {
        self.featured_limit = limit;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.price_cache = Mutex::new(EffectivePriceCache::new().with_metrics(metrics.clone()));
        self.metrics = Some(metrics);
        self
    }

    pub fn evaluator(&self) -> &OfferEvaluator {
        &self.evaluator
    }

    /// Register a product. Catalog editing beyond offers lives elsewhere;
    /// this is the seam the admin tooling uses to create records.
    pub async fn add_product(&self, actor: &ActorContext, product: Product) -> Result<Product, CatalogError> {
        require_admin(actor, "add_product")?;
        product.validate().map_err(CatalogError::InvalidProduct)?;

        let stored = self.store.insert(&product).await?;
        tracing::info!(product_id = %stored.id, "Product added");
        Ok(stored.data)
    }

    pub async fn product(&self, product_id: &str) -> Result<Versioned<Product>, CatalogError> {
        self.store
            .load(product_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))
    }

    pub async fn set_offer(
        &self,
        actor: &ActorContext,
        product_id: &str,
        draft: OfferDraft,
    ) -> Result<Product, CatalogError> {
        require_admin(actor, "set_offer")?;
        let offer = draft.into_offer()?;

        let current = self.product(product_id).await?;
        let mut product = current.data;
        product.offer = Some(offer);

        let version = self
            .store
            .compare_and_swap(product_id, current.version, &product)
            .await?;
        self.price_cache.lock().await.invalidate(product_id);

        if let Some(metrics) = &self.metrics {
            metrics.record_offer_update("set");
        }
        tracing::info!(
            product_id,
            version,
            discount_percent = product.offer.as_ref().map(|o| o.discount_percent),
            "Offer set"
        );
        Ok(product)
    }

    pub async fn remove_offer(&self, actor: &ActorContext, product_id: &str) -> Result<Product, CatalogError> {
        require_admin(actor, "remove_offer")?;

        let current = self.product(product_id).await?;
        if current.data.offer.is_none() {
            return Ok(current.data);
        }

        let mut product = current.data;
        product.offer = None;

        let version = self
            .store
            .compare_and_swap(product_id, current.version, &product)
            .await?;
        self.price_cache.lock().await.invalidate(product_id);

        if let Some(metrics) = &self.metrics {
            metrics.record_offer_update("remove");
        }
        tracing::info!(product_id, version, "Offer removed");
        Ok(product)
    }

    /// Products whose offer window contains today, in store order.
    pub async fn active_offers(&self) -> Result<Vec<Product>, CatalogError> {
        let products = self.products().await?;
        Ok(active_offers(&products, self.evaluator.today())
            .into_iter()
            .cloned()
            .collect())
    }

    /// Active featured offers, at most the configured limit.
    pub async fn featured_deals(&self) -> Result<Vec<Product>, CatalogError> {
        let products = self.products().await?;
        Ok(self
            .evaluator
            .featured_deals(&products, self.featured_limit)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Price a customer sees today. This is the value frozen into a cart line.
    pub async fn effective_price(&self, product_id: &str) -> Result<Decimal, CatalogError> {
        let product = self.product(product_id).await?;
        let today = self.evaluator.today();
        Ok(self.price_cache.lock().await.price(&product, today))
    }

    async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self
            .store
            .scan()
            .await?
            .into_iter()
            .map(|versioned| versioned.data)
            .collect())
    }
}

fn require_admin(actor: &ActorContext, action: &'static str) -> Result<(), CatalogError> {
    if actor.is_admin() {
        Ok(())
    } else {
        tracing::warn!(user_id = %actor.user_id, action, "Catalog change refused");
        Err(CatalogError::Forbidden(action))
    }
}
