use chrono::NaiveDate;

use super::value_objects::OrderStatus;

// ============================================================================
// Order Commands - Represent actor intent on an existing order
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderCommand {
    Approve,
    Reject {
        reason: String,
    },
    Advance {
        target: OrderStatus,
    },
    SetEstimatedDelivery {
        date: NaiveDate,
    },
    RequestCancellation {
        reason: String,
    },
    ApproveCancelRequest,
    RejectCancelRequest,
    RecordPayment {
        payment_id: String,
        method: String,
    },
}

impl OrderCommand {
    /// Stable name for logs and metric labels.
    pub fn action(&self) -> &'static str {
        match self {
            OrderCommand::Approve => "approve",
            OrderCommand::Reject { .. } => "reject",
            OrderCommand::Advance { .. } => "advance",
            OrderCommand::SetEstimatedDelivery { .. } => "set_estimated_delivery",
            OrderCommand::RequestCancellation { .. } => "request_cancellation",
            OrderCommand::ApproveCancelRequest => "approve_cancel_request",
            OrderCommand::RejectCancelRequest => "reject_cancel_request",
            OrderCommand::RecordPayment { .. } => "record_payment",
        }
    }
}
