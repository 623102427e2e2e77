use std::sync::Arc;

use chrono::NaiveDate;

use super::aggregate::{CommandContext, Order};
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::value_objects::{OrderStatus, TransitionPolicy};
use crate::document_store::{Aggregate, DocumentStore};
use crate::domain::{ActorContext, SharedClock};
use crate::metrics::Metrics;

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: load → Command → Aggregate → Events → compare-and-swap
//
// The write only lands if nobody else changed the order since it was
// loaded. A lost race surfaces as a Persistence error; it is not retried,
// because the command was decided against state that no longer exists.
//
// ============================================================================

pub struct OrderCommandHandler {
    store: Arc<dyn DocumentStore<Order>>,
    clock: SharedClock,
    policy: TransitionPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl OrderCommandHandler {
    pub fn new(store: Arc<dyn DocumentStore<Order>>, clock: SharedClock) -> Self {
        Self {
            store,
            clock,
            policy: TransitionPolicy::default(),
            metrics: None,
        }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run one command as a single read-modify-write and return the new state.
    pub async fn handle(
        &self,
        order_id: &str,
        command: OrderCommand,
        actor: &ActorContext,
    ) -> Result<Order, OrderError> {
        let action = command.action();
        let result = self.execute(order_id, &command, actor).await;

        match &result {
            Ok(order) => {
                tracing::info!(
                    order_id,
                    action,
                    user_id = %actor.user_id,
                    status = %order.status(),
                    "Order updated"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_transition(action);
                }
            }
            Err(error) => {
                tracing::warn!(
                    order_id,
                    action,
                    user_id = %actor.user_id,
                    kind = error.kind().as_str(),
                    error = %error,
                    "Order command refused"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(action, error.kind().as_str());
                }
            }
        }

        result
    }

    async fn execute(
        &self,
        order_id: &str,
        command: &OrderCommand,
        actor: &ActorContext,
    ) -> Result<Order, OrderError> {
        let current = self
            .store
            .load(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        let ctx = CommandContext {
            actor: actor.clone(),
            now: self.clock.utc(),
            policy: self.policy,
        };

        let mut order = current.data;
        let events = order.execute(command, &ctx)?;

        let version = self
            .store
            .compare_and_swap(order_id, current.version, &order)
            .await?;

        for event in &events {
            tracing::debug!(order_id, version, event_type = event.event_type(), "Event applied");
        }

        Ok(order)
    }

    pub async fn order(&self, order_id: &str) -> Result<Order, OrderError> {
        self.store
            .load(order_id)
            .await?
            .map(|versioned| versioned.data)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    pub async fn approve(&self, actor: &ActorContext, order_id: &str) -> Result<Order, OrderError> {
        self.handle(order_id, OrderCommand::Approve, actor).await
    }

    pub async fn reject(&self, actor: &ActorContext, order_id: &str, reason: &str) -> Result<Order, OrderError> {
        self.handle(
            order_id,
            OrderCommand::Reject {
                reason: reason.to_string(),
            },
            actor,
        )
        .await
    }

    pub async fn advance(
        &self,
        actor: &ActorContext,
        order_id: &str,
        target: OrderStatus,
    ) -> Result<Order, OrderError> {
        self.handle(order_id, OrderCommand::Advance { target }, actor).await
    }

    pub async fn set_estimated_delivery(
        &self,
        actor: &ActorContext,
        order_id: &str,
        date: NaiveDate,
    ) -> Result<Order, OrderError> {
        self.handle(order_id, OrderCommand::SetEstimatedDelivery { date }, actor)
            .await
    }

    pub async fn request_cancellation(
        &self,
        actor: &ActorContext,
        order_id: &str,
        reason: &str,
    ) -> Result<Order, OrderError> {
        self.handle(
            order_id,
            OrderCommand::RequestCancellation {
                reason: reason.to_string(),
            },
            actor,
        )
        .await
    }

    pub async fn approve_cancel_request(&self, actor: &ActorContext, order_id: &str) -> Result<Order, OrderError> {
        self.handle(order_id, OrderCommand::ApproveCancelRequest, actor).await
    }

    pub async fn reject_cancel_request(&self, actor: &ActorContext, order_id: &str) -> Result<Order, OrderError> {
        self.handle(order_id, OrderCommand::RejectCancelRequest, actor).await
    }

    pub async fn record_payment(
        &self,
        actor: &ActorContext,
        order_id: &str,
        payment_id: &str,
        method: &str,
    ) -> Result<Order, OrderError> {
        self.handle(
            order_id,
            OrderCommand::RecordPayment {
                payment_id: payment_id.to_string(),
                method: method.to_string(),
            },
            actor,
        )
        .await
    }
}
