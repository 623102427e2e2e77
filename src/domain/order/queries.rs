use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use super::aggregate::Order;
use super::errors::OrderError;
use super::value_objects::{CancelDecision, OrderStatus};
use crate::document_store::DocumentStore;

// ============================================================================
// Order Read Models
// ============================================================================

/// Admin back-office tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderQueue {
    New,
    Active,
    CancelRequests,
    Completed,
    Cancelled,
}

impl OrderQueue {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            OrderQueue::New => order.status() == OrderStatus::PendingApproval,
            OrderQueue::Active => order.status().is_fulfilment(),
            OrderQueue::CancelRequests => {
                order.cancel_requested() && order.cancel_approved() == CancelDecision::Unset
            }
            OrderQueue::Completed => order.status() == OrderStatus::Delivered,
            OrderQueue::Cancelled => order.status() == OrderStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_orders: usize,
    /// Sum of totals over orders that were not cancelled.
    pub revenue: Decimal,
    pub by_status: BTreeMap<OrderStatus, usize>,
}

pub struct OrderQueries {
    store: Arc<dyn DocumentStore<Order>>,
}

impl OrderQueries {
    pub fn new(store: Arc<dyn DocumentStore<Order>>) -> Self {
        Self { store }
    }

    /// A customer's orders, newest first.
    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
        let mut orders: Vec<Order> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|order| order.user_id() == user_id)
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.load_all().await?;
        newest_first(&mut orders);
        Ok(orders)
    }

    pub async fn queue(&self, queue: OrderQueue) -> Result<Vec<Order>, OrderError> {
        let mut orders: Vec<Order> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|order| queue.matches(order))
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    pub async fn dashboard(&self) -> Result<Dashboard, OrderError> {
        let orders = self.load_all().await?;

        let mut by_status: BTreeMap<OrderStatus, usize> =
            OrderStatus::ALL.into_iter().map(|status| (status, 0)).collect();
        let mut revenue = Decimal::ZERO;

        for order in &orders {
            *by_status.entry(order.status()).or_default() += 1;
            if order.status() != OrderStatus::Cancelled {
                revenue = revenue.saturating_add(order.total_amount());
            }
        }

        Ok(Dashboard {
            total_orders: orders.len(),
            revenue,
            by_status,
        })
    }

    async fn load_all(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self
            .store
            .scan()
            .await?
            .into_iter()
            .map(|versioned| versioned.data)
            .collect())
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(a.id()))
    });
}
