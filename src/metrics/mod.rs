// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers:
// - Order placement and lifecycle transitions
// - Rejected operations, labelled by error kind
// - Document store latency and read retries
// - Effective-price cache hit rate
//
// All metrics are registered with one Registry and scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Order Metrics
    pub orders_placed: IntCounter,
    pub order_transitions: IntCounterVec,
    pub order_failures: IntCounterVec,

    // Catalog Metrics
    pub offer_updates: IntCounterVec,
    pub price_cache_lookups: IntCounterVec,

    // Store Metrics
    pub store_operation_duration: HistogramVec,
    pub store_retry_attempts: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Order Metrics
        let orders_placed = IntCounter::new("orders_placed_total", "Total orders placed")?;
        registry.register(Box::new(orders_placed.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order commands that changed an order"),
            &["action"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let order_failures = IntCounterVec::new(
            Opts::new("order_failures_total", "Order operations that were refused or failed"),
            &["action", "kind"],
        )?;
        registry.register(Box::new(order_failures.clone()))?;

        // Catalog Metrics
        let offer_updates = IntCounterVec::new(
            Opts::new("offer_updates_total", "Offers set or removed on products"),
            &["action"],
        )?;
        registry.register(Box::new(offer_updates.clone()))?;

        let price_cache_lookups = IntCounterVec::new(
            Opts::new("price_cache_lookups_total", "Effective price cache lookups"),
            &["outcome"],
        )?;
        registry.register(Box::new(price_cache_lookups.clone()))?;

        // Store Metrics
        let store_operation_duration = HistogramVec::new(
            HistogramOpts::new("store_operation_duration_seconds", "Document store operation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(store_operation_duration.clone()))?;

        let store_retry_attempts = IntCounterVec::new(
            Opts::new("store_retry_attempts_total", "Document store reads retried after a transient failure"),
            &["operation"],
        )?;
        registry.register(Box::new(store_retry_attempts.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            order_transitions,
            order_failures,
            offer_updates,
            price_cache_lookups,
            store_operation_duration,
            store_retry_attempts,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_placed(&self) {
        self.orders_placed.inc();
    }

    pub fn record_transition(&self, action: &str) {
        self.order_transitions.with_label_values(&[action]).inc();
    }

    pub fn record_failure(&self, action: &str, kind: &str) {
        self.order_failures.with_label_values(&[action, kind]).inc();
    }

    pub fn record_offer_update(&self, action: &str) {
        self.offer_updates.with_label_values(&[action]).inc();
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        self.price_cache_lookups.with_label_values(&[outcome]).inc();
    }

    pub fn record_store_operation(&self, operation: &str, duration_secs: f64) {
        self.store_operation_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_store_retry(&self, operation: &str) {
        self.store_retry_attempts.with_label_values(&[operation]).inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        server::encode_registry(&self.registry)
    }
}
