use std::sync::Arc;

use chrono::Days;
use mockable::DefaultClock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_orders::config::StorefrontConfig;
use storefront_orders::document_store::{DocumentStore, InMemoryDocumentStore, ScyllaDocumentStore};
use storefront_orders::domain::catalog::{CatalogService, OfferDraft, Product};
use storefront_orders::domain::order::{
    Order, OrderAggregator, OrderCommandHandler, OrderQueries, OrderQueue, OrderStatus, PlaceOrder,
    ShippingAddress,
};
use storefront_orders::domain::pricing::{Cart, PricingEngine};
use storefront_orders::domain::{ActorContext, SharedClock};
use storefront_orders::metrics::{self, Metrics};
use storefront_orders::utils::RetryConfig;

type Stores = (Arc<dyn DocumentStore<Product>>, Arc<dyn DocumentStore<Order>>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,storefront_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting storefront order core");

    let config = StorefrontConfig::from_env()?;
    tracing::info!(
        tax_rate = %config.tax_rate,
        featured_limit = config.featured_limit,
        progression = ?config.transition_policy.progression,
        cancel_rejection = ?config.transition_policy.cancel_rejection,
        "Configuration loaded"
    );

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    if let Some(port) = config.metrics_port {
        let registry = Arc::new(metrics.registry().clone());
        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!("Metrics runtime error: {}", e);
                    return;
                }
            };
            runtime.block_on(async {
                if let Err(e) = metrics::start_metrics_server(registry, port).await {
                    tracing::error!("Metrics server error: {}", e);
                }
            });
        });
    }

    // === 2. Stores and services ===
    let (products, orders) = open_stores(&config, metrics.clone()).await?;
    let clock: SharedClock = Arc::new(DefaultClock);
    let pricing = PricingEngine::new(config.tax_rate);

    let catalog = CatalogService::new(products, clock.clone())
        .with_featured_limit(config.featured_limit)
        .with_metrics(metrics.clone());
    let aggregator = OrderAggregator::new(orders.clone(), clock.clone())
        .with_pricing(pricing)
        .with_metrics(metrics.clone());
    let handler = OrderCommandHandler::new(orders.clone(), clock.clone())
        .with_policy(config.transition_policy)
        .with_metrics(metrics.clone());
    let queries = OrderQueries::new(orders);

    // === 3. Demonstrate the order lifecycle ===
    let admin = ActorContext::admin("admin-1");
    let customer = ActorContext::customer("customer-1");
    let today = catalog.evaluator().today();

    let product_id = format!("kettle-{}", uuid::Uuid::new_v4());
    catalog
        .add_product(
            &admin,
            Product {
                id: product_id.clone(),
                name: "Copper Kettle".to_string(),
                price: rust_decimal::Decimal::from(200),
                stock: 5,
                category: Some("kitchen".to_string()),
                image_url: None,
                offer: None,
            },
        )
        .await?;
    catalog
        .set_offer(
            &admin,
            &product_id,
            OfferDraft {
                discount_percent: 25,
                offer_title: Some("Festive Week".to_string()),
                start_date: today,
                end_date: today.checked_add_days(Days::new(7)).unwrap_or(today),
                is_featured: true,
            },
        )
        .await?;
    tracing::info!(
        featured = catalog.featured_deals().await?.len(),
        price = %catalog.effective_price(&product_id).await?,
        "Offer live"
    );

    let product = catalog.product(&product_id).await?.data;
    let mut cart = Cart::new();
    cart.add_product(&product, 2, today)?;
    let quote = cart.quote(&pricing)?.rounded();
    tracing::info!(subtotal = %quote.subtotal, tax = %quote.tax, total = %quote.total, "Cart priced");

    let address = ShippingAddress {
        full_name: "Asha Rao".to_string(),
        phone: None,
        address_line1: "12 MG Road".to_string(),
        address_line2: None,
        city: "Pune".to_string(),
        state: Some("Maharashtra".to_string()),
        postal_code: "411001".to_string(),
        country: "India".to_string(),
    };

    // Cancelled through the cancellation workflow
    let order = aggregator
        .place_order(
            &customer,
            PlaceOrder {
                items: cart.line_items(),
                shipping_address: address.clone(),
                customer_email: "asha@example.com".to_string(),
                expected_total: Some(quote.total),
            },
        )
        .await?;
    handler.approve(&admin, order.id()).await?;
    handler
        .request_cancellation(&customer, order.id(), "Ordered twice by mistake")
        .await?;
    handler.approve_cancel_request(&admin, order.id()).await?;
    if let Err(e) = handler.advance(&admin, order.id(), OrderStatus::Shipped).await {
        tracing::info!(kind = e.kind().as_str(), "Cancelled order stays cancelled");
    }

    // Bought now and delivered
    let buy_now = Cart::buy_now(&product, today)?;
    let order = aggregator
        .place_order(
            &customer,
            PlaceOrder {
                items: buy_now.line_items(),
                shipping_address: address,
                customer_email: "asha@example.com".to_string(),
                expected_total: None,
            },
        )
        .await?;
    handler.approve(&admin, order.id()).await?;
    handler
        .record_payment(&customer, order.id(), "pay_demo_001", "upi")
        .await?;
    handler
        .set_estimated_delivery(&admin, order.id(), today.checked_add_days(Days::new(3)).unwrap_or(today))
        .await?;
    handler.advance(&admin, order.id(), OrderStatus::Shipped).await?;
    handler.advance(&admin, order.id(), OrderStatus::Delivered).await?;

    let dashboard = queries.dashboard().await?;
    tracing::info!(
        orders = dashboard.total_orders,
        revenue = %dashboard.revenue,
        completed = queries.queue(OrderQueue::Completed).await?.len(),
        "Dashboard"
    );

    if config.metrics_port.is_some() {
        tracing::info!("🎉 Demo complete, serving metrics until Ctrl-C");
        tokio::signal::ctrl_c().await?;
    } else {
        tracing::info!("🎉 Demo complete!");
    }

    Ok(())
}

async fn open_stores(config: &StorefrontConfig, metrics: Arc<Metrics>) -> anyhow::Result<Stores> {
    match &config.scylla {
        Some(scylla) => {
            let store = Arc::new(
                ScyllaDocumentStore::connect(&scylla.node, &scylla.keyspace)
                    .await?
                    .with_retry(RetryConfig::aggressive())
                    .with_metrics(metrics),
            );
            let products: Arc<dyn DocumentStore<Product>> = store.clone();
            let orders: Arc<dyn DocumentStore<Order>> = store;
            Ok((products, orders))
        }
        None => {
            tracing::info!("SCYLLA_NODE not set, using in-memory store");
            let store = Arc::new(InMemoryDocumentStore::new());
            let products: Arc<dyn DocumentStore<Product>> = store.clone();
            let orders: Arc<dyn DocumentStore<Order>> = store;
            Ok((products, orders))
        }
    }
}
