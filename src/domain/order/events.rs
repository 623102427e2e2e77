use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{OrderStatus, PaymentRecord};

// ============================================================================
// Order Events - What a successful command did
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Approved {
        at: DateTime<Utc>,
    },
    Rejected {
        reason: String,
        at: DateTime<Utc>,
    },
    StatusAdvanced {
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    },
    EstimatedDeliverySet {
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    CancellationRequested {
        reason: String,
        at: DateTime<Utc>,
    },
    CancellationApproved {
        at: DateTime<Utc>,
    },
    /// `reopened` is true when the customer may request again.
    CancellationRejected {
        reopened: bool,
        at: DateTime<Utc>,
    },
    PaymentRecorded {
        payment: PaymentRecord,
    },
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Approved { .. } => "OrderApproved",
            OrderEvent::Rejected { .. } => "OrderRejected",
            OrderEvent::StatusAdvanced { .. } => "OrderStatusAdvanced",
            OrderEvent::EstimatedDeliverySet { .. } => "OrderEstimatedDeliverySet",
            OrderEvent::CancellationRequested { .. } => "OrderCancellationRequested",
            OrderEvent::CancellationApproved { .. } => "OrderCancellationApproved",
            OrderEvent::CancellationRejected { .. } => "OrderCancellationRejected",
            OrderEvent::PaymentRecorded { .. } => "OrderPaymentRecorded",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Approved { at }
            | OrderEvent::Rejected { at, .. }
            | OrderEvent::StatusAdvanced { at, .. }
            | OrderEvent::EstimatedDeliverySet { at, .. }
            | OrderEvent::CancellationRequested { at, .. }
            | OrderEvent::CancellationApproved { at }
            | OrderEvent::CancellationRejected { at, .. } => *at,
            OrderEvent::PaymentRecorded { payment } => payment.paid_at,
        }
    }
}
