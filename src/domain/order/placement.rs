use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::aggregate::Order;
use super::errors::OrderError;
use super::value_objects::{OrderLineItem, ShippingAddress};
use crate::document_store::DocumentStore;
use crate::domain::pricing::PricingEngine;
use crate::domain::{ActorContext, SharedClock};
use crate::metrics::Metrics;

// ============================================================================
// Order Placement
// ============================================================================
//
// Turns a checkout (cart or buy-now lines, address, email) into a new order
// in pending_approval. Line prices are taken as frozen by the cart; only
// their arithmetic is checked here. Stock is not touched.
//
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub items: Vec<OrderLineItem>,
    pub shipping_address: ShippingAddress,
    pub customer_email: String,
    /// Total the customer was shown, if the client sends it.
    #[serde(default)]
    pub expected_total: Option<Decimal>,
}

pub struct OrderAggregator {
    store: Arc<dyn DocumentStore<Order>>,
    clock: SharedClock,
    pricing: PricingEngine,
    metrics: Option<Arc<Metrics>>,
}

impl OrderAggregator {
    pub fn new(store: Arc<dyn DocumentStore<Order>>, clock: SharedClock) -> Self {
        Self {
            store,
            clock,
            pricing: PricingEngine::default(),
            metrics: None,
        }
    }

    pub fn with_pricing(mut self, pricing: PricingEngine) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn place_order(&self, actor: &ActorContext, request: PlaceOrder) -> Result<Order, OrderError> {
        let result = self.create(actor, request).await;

        match &result {
            Ok(order) => {
                tracing::info!(
                    order_id = %order.id(),
                    user_id = %order.user_id(),
                    total = %order.total_amount(),
                    items = order.items().len(),
                    "Order placed"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_order_placed();
                }
            }
            Err(error) => {
                tracing::warn!(
                    user_id = %actor.user_id,
                    kind = error.kind().as_str(),
                    error = %error,
                    "Order placement refused"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure("place_order", error.kind().as_str());
                }
            }
        }

        result
    }

    async fn create(&self, actor: &ActorContext, request: PlaceOrder) -> Result<Order, OrderError> {
        if actor.is_admin() {
            return Err(OrderError::Forbidden {
                action: "place_order",
                detail: "orders are placed by customers",
            });
        }
        if actor.banned {
            return Err(OrderError::Forbidden {
                action: "place_order",
                detail: "account is banned",
            });
        }

        self.validate(&request)?;

        let total = self
            .pricing
            .quote(&request.items)
            .map_err(|e| OrderError::Validation(e.to_string()))?
            .total;
        if let Some(expected) = request.expected_total {
            if round_cents(expected) != round_cents(total) {
                return Err(OrderError::Validation(format!(
                    "expected total {expected} does not match computed total {total}"
                )));
            }
        }

        let order = Order::placed(
            Uuid::now_v7().to_string(),
            actor.user_id.clone(),
            request.items,
            total,
            trim_address(request.shipping_address),
            request.customer_email.trim().to_string(),
            self.clock.utc(),
        );

        let stored = self.store.insert(&order).await?;
        Ok(stored.data)
    }

    fn validate(&self, request: &PlaceOrder) -> Result<(), OrderError> {
        if request.items.is_empty() {
            return Err(OrderError::Validation("order has no items".to_string()));
        }
        for item in &request.items {
            item.check().map_err(OrderError::Validation)?;
        }

        let missing = request.shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(OrderError::Validation(format!(
                "shipping address missing {}",
                missing.join(", ")
            )));
        }
        if request.customer_email.trim().is_empty() {
            return Err(OrderError::Validation("customer email is required".to_string()));
        }
        Ok(())
    }
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

fn trim_address(address: ShippingAddress) -> ShippingAddress {
    let trim = |s: String| s.trim().to_string();
    ShippingAddress {
        full_name: trim(address.full_name),
        phone: address.phone.map(trim),
        address_line1: trim(address.address_line1),
        address_line2: address.address_line2.map(trim),
        city: trim(address.city),
        state: address.state.map(trim),
        postal_code: trim(address.postal_code),
        country: trim(address.country),
    }
}
