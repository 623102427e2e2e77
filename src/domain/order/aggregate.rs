use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::OrderEvent;
use super::value_objects::{
    CancelDecision, CancelRejectionPolicy, OrderLineItem, OrderStatus, PaymentRecord, ProgressionPolicy,
    ShippingAddress, TransitionPolicy,
};
use crate::document_store::{Aggregate, Document};
use crate::domain::ActorContext;

// ============================================================================
// Order Aggregate - Lifecycle State Machine
// ============================================================================
//
//   pending_approval ──approve──▶ approved ─▶ in_progress ─▶ shipped ─▶ delivered
//          │                         │
//          └──reject──▶ cancelled ◀──┴── approve cancel request
//
// A cancellation request that is still unanswered locks the order: approve,
// reject, advance and setEstimatedDelivery are refused until an admin
// approves or rejects the request.
//
// Commands are checked in this order: actor, inputs, lock, status.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: String,
    user_id: String,
    items: Vec<OrderLineItem>,
    total_amount: Decimal,
    shipping_address: ShippingAddress,
    customer_email: String,

    status: OrderStatus,
    cancel_requested: bool,
    cancel_reason: Option<String>,
    #[serde(default)]
    cancel_approved: CancelDecision,
    estimated_delivery: Option<NaiveDate>,
    rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payment: Option<PaymentRecord>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancel_requested_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancel_approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancel_rejected_at: Option<DateTime<Utc>>,
}

/// Who is acting, when, and under which policy.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub actor: ActorContext,
    pub now: DateTime<Utc>,
    pub policy: TransitionPolicy,
}

impl Order {
    /// A freshly placed order. Inputs are validated by the caller.
    pub(crate) fn placed(
        id: String,
        user_id: String,
        items: Vec<OrderLineItem>,
        total_amount: Decimal,
        shipping_address: ShippingAddress,
        customer_email: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            total_amount,
            shipping_address,
            customer_email,
            status: OrderStatus::PendingApproval,
            cancel_requested: false,
            cancel_reason: None,
            cancel_approved: CancelDecision::Unset,
            estimated_delivery: None,
            rejection_reason: None,
            payment: None,
            created_at: now,
            updated_at: now,
            approved_at: None,
            rejected_at: None,
            cancel_requested_at: None,
            cancel_approved_at: None,
            cancel_rejected_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn items(&self) -> &[OrderLineItem] {
        &self.items
    }

    /// Subtotal plus tax, fixed when the order was placed.
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn cancel_approved(&self) -> CancelDecision {
        self.cancel_approved
    }

    pub fn estimated_delivery(&self) -> Option<NaiveDate> {
        self.estimated_delivery
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn payment(&self) -> Option<&PaymentRecord> {
        self.payment.as_ref()
    }

    pub fn is_paid(&self) -> bool {
        self.payment.is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    pub fn cancel_requested_at(&self) -> Option<DateTime<Utc>> {
        self.cancel_requested_at
    }

    pub fn cancel_approved_at(&self) -> Option<DateTime<Utc>> {
        self.cancel_approved_at
    }

    pub fn cancel_rejected_at(&self) -> Option<DateTime<Utc>> {
        self.cancel_rejected_at
    }

    /// A cancellation request is waiting for an admin.
    pub fn is_locked(&self) -> bool {
        self.cancel_requested && self.cancel_approved == CancelDecision::Unset
    }

    // ========================================================================
    // Guards
    // ========================================================================

    fn require_admin(ctx: &CommandContext, action: &'static str) -> Result<(), OrderError> {
        if ctx.actor.is_admin() {
            Ok(())
        } else {
            Err(OrderError::Forbidden {
                action,
                detail: "admin only",
            })
        }
    }

    fn require_unlocked(&self, action: &'static str) -> Result<(), OrderError> {
        if self.is_locked() {
            return Err(self.invalid(action, "a cancellation request is pending"));
        }
        Ok(())
    }

    fn require_pending(&self, action: &'static str) -> Result<(), OrderError> {
        if self.status != OrderStatus::PendingApproval {
            return Err(self.invalid(action, "order is not pending approval"));
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str, detail: &'static str) -> OrderError {
        OrderError::InvalidTransition {
            action,
            status: self.status,
            detail,
        }
    }
}

fn required(value: &str, field: &str) -> Result<String, OrderError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OrderError::Validation(format!("{field} must not be blank")));
    }
    Ok(value.to_string())
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = OrderError;
    type Context = CommandContext;

    fn handle_command(&self, command: &OrderCommand, ctx: &CommandContext) -> Result<Vec<OrderEvent>, OrderError> {
        let action = command.action();
        let at = ctx.now;

        match command {
            OrderCommand::Approve => {
                Self::require_admin(ctx, action)?;
                self.require_unlocked(action)?;
                self.require_pending(action)?;
                Ok(vec![OrderEvent::Approved { at }])
            }

            OrderCommand::Reject { reason } => {
                Self::require_admin(ctx, action)?;
                let reason = required(reason, "rejection reason")?;
                self.require_unlocked(action)?;
                self.require_pending(action)?;
                Ok(vec![OrderEvent::Rejected { reason, at }])
            }

            OrderCommand::Advance { target } => {
                Self::require_admin(ctx, action)?;
                if !target.is_advance_target() {
                    return Err(OrderError::Validation(format!(
                        "{target} is not a fulfilment status"
                    )));
                }
                self.require_unlocked(action)?;
                if !self.status.is_fulfilment() {
                    return Err(self.invalid(action, "order is not in fulfilment"));
                }
                if ctx.policy.progression == ProgressionPolicy::ForwardOnly
                    && target.progression_rank() <= self.status.progression_rank()
                {
                    return Err(self.invalid(action, "status can only move forward"));
                }
                Ok(vec![OrderEvent::StatusAdvanced {
                    from: self.status,
                    to: *target,
                    at,
                }])
            }

            OrderCommand::SetEstimatedDelivery { date } => {
                Self::require_admin(ctx, action)?;
                if *date < self.created_at.date_naive() {
                    return Err(OrderError::Validation(format!(
                        "estimated delivery {date} is before the order was placed"
                    )));
                }
                self.require_unlocked(action)?;
                if self.status.is_terminal() {
                    return Err(self.invalid(action, "order is closed"));
                }
                Ok(vec![OrderEvent::EstimatedDeliverySet { date: *date, at }])
            }

            OrderCommand::RequestCancellation { reason } => {
                if !ctx.actor.owns(&self.user_id) {
                    return Err(OrderError::Forbidden {
                        action,
                        detail: "only the customer who placed the order",
                    });
                }
                if ctx.actor.banned {
                    return Err(OrderError::Forbidden {
                        action,
                        detail: "account is banned",
                    });
                }
                let reason = required(reason, "cancellation reason")?;
                if self.cancel_requested {
                    return Err(self.invalid(action, "cancellation already requested"));
                }
                if !matches!(self.status, OrderStatus::PendingApproval | OrderStatus::Approved) {
                    return Err(self.invalid(action, "order can no longer be cancelled"));
                }
                Ok(vec![OrderEvent::CancellationRequested { reason, at }])
            }

            OrderCommand::ApproveCancelRequest => {
                Self::require_admin(ctx, action)?;
                if !self.is_locked() {
                    return Err(self.invalid(action, "no cancellation request is pending"));
                }
                Ok(vec![OrderEvent::CancellationApproved { at }])
            }

            OrderCommand::RejectCancelRequest => {
                Self::require_admin(ctx, action)?;
                if !self.is_locked() {
                    return Err(self.invalid(action, "no cancellation request is pending"));
                }
                Ok(vec![OrderEvent::CancellationRejected {
                    reopened: ctx.policy.cancel_rejection == CancelRejectionPolicy::AllowRerequest,
                    at,
                }])
            }

            OrderCommand::RecordPayment { payment_id, method } => {
                if !ctx.actor.is_admin() && !ctx.actor.owns(&self.user_id) {
                    return Err(OrderError::Forbidden {
                        action,
                        detail: "only an admin or the customer who placed the order",
                    });
                }
                let payment_id = required(payment_id, "payment id")?;
                let method = required(method, "payment method")?;
                if self.status == OrderStatus::Cancelled {
                    return Err(self.invalid(action, "order is cancelled"));
                }
                if self.is_paid() {
                    return Err(self.invalid(action, "order is already paid"));
                }
                Ok(vec![OrderEvent::PaymentRecorded {
                    payment: PaymentRecord {
                        payment_id,
                        method,
                        paid_at: at,
                    },
                }])
            }
        }
    }

    fn apply_event(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::Approved { at } => {
                self.status = OrderStatus::Approved;
                self.approved_at = Some(*at);
            }
            OrderEvent::Rejected { reason, at } => {
                self.status = OrderStatus::Cancelled;
                self.rejection_reason = Some(reason.clone());
                self.rejected_at = Some(*at);
            }
            OrderEvent::StatusAdvanced { to, .. } => {
                self.status = *to;
            }
            OrderEvent::EstimatedDeliverySet { date, .. } => {
                self.estimated_delivery = Some(*date);
            }
            OrderEvent::CancellationRequested { reason, at } => {
                self.cancel_requested = true;
                self.cancel_reason = Some(reason.clone());
                self.cancel_approved = CancelDecision::Unset;
                self.cancel_requested_at = Some(*at);
            }
            OrderEvent::CancellationApproved { at } => {
                self.status = OrderStatus::Cancelled;
                self.cancel_approved = CancelDecision::Approved;
                self.cancel_approved_at = Some(*at);
            }
            OrderEvent::CancellationRejected { reopened, at } => {
                self.cancel_approved = CancelDecision::Rejected;
                self.cancel_rejected_at = Some(*at);
                if *reopened {
                    self.cancel_requested = false;
                }
            }
            OrderEvent::PaymentRecorded { payment } => {
                self.payment = Some(payment.clone());
            }
        }
        self.touch(event.occurred_at());
    }
}

impl Order {
    /// `updated_at` never moves backwards, even if the clock does.
    fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}

// ============================================================================
// Store Boundary
// ============================================================================

impl Document for Order {
    fn collection() -> &'static str {
        "orders"
    }

    fn key(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() || self.user_id.trim().is_empty() {
            return Err("order id and user id are required".to_string());
        }
        if self.items.is_empty() {
            return Err("order has no items".to_string());
        }
        for item in &self.items {
            item.check()?;
        }
        if self.total_amount.is_sign_negative() {
            return Err(format!("negative total {}", self.total_amount));
        }
        if self.customer_email.trim().is_empty() {
            return Err("customer email is blank".to_string());
        }
        let missing = self.shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(format!("shipping address missing {}", missing.join(", ")));
        }
        if self.updated_at < self.created_at {
            return Err("updatedAt precedes createdAt".to_string());
        }
        if self.cancel_approved == CancelDecision::Approved && self.status != OrderStatus::Cancelled {
            return Err(format!("approved cancellation on a {} order", self.status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::{decode_document, encode_document, StoreError};
    use crate::domain::order::ErrorKind;
    use crate::test_support::{admin, customer, order_in, placed_order, t0};
    use chrono::Duration;

    fn ctx(actor: ActorContext) -> CommandContext {
        CommandContext {
            actor,
            now: t0() + Duration::hours(1),
            policy: TransitionPolicy::default(),
        }
    }

    fn with_policy(actor: ActorContext, policy: TransitionPolicy) -> CommandContext {
        CommandContext {
            policy,
            ..ctx(actor)
        }
    }

    /// Each command paired with the actor allowed to issue it and valid input.
    fn commands() -> Vec<(OrderCommand, ActorContext)> {
        let mut all = vec![
            (OrderCommand::Approve, admin()),
            (OrderCommand::Reject { reason: "out of stock".into() }, admin()),
            (
                OrderCommand::SetEstimatedDelivery {
                    date: t0().date_naive() + Duration::days(5),
                },
                admin(),
            ),
            (OrderCommand::RequestCancellation { reason: "changed mind".into() }, customer("u1")),
            (OrderCommand::ApproveCancelRequest, admin()),
            (OrderCommand::RejectCancelRequest, admin()),
            (
                OrderCommand::RecordPayment {
                    payment_id: "pay_1".into(),
                    method: "upi".into(),
                },
                customer("u1"),
            ),
        ];
        for target in [
            OrderStatus::Approved,
            OrderStatus::InProgress,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            all.push((OrderCommand::Advance { target }, admin()));
        }
        all
    }

    fn permitted(status: OrderStatus, command: &OrderCommand, policy: ProgressionPolicy) -> bool {
        use OrderStatus::*;
        match command {
            OrderCommand::Approve | OrderCommand::Reject { .. } => status == PendingApproval,
            OrderCommand::Advance { target } => {
                status.is_fulfilment()
                    && (policy == ProgressionPolicy::Permissive
                        || target.progression_rank() > status.progression_rank())
            }
            OrderCommand::SetEstimatedDelivery { .. } => !status.is_terminal(),
            OrderCommand::RequestCancellation { .. } => matches!(status, PendingApproval | Approved),
            OrderCommand::ApproveCancelRequest | OrderCommand::RejectCancelRequest => false,
            OrderCommand::RecordPayment { .. } => status != Cancelled,
        }
    }

    fn check_table(progression: ProgressionPolicy) {
        let policy = TransitionPolicy {
            progression,
            ..TransitionPolicy::default()
        };

        for status in OrderStatus::ALL {
            for (command, actor) in commands() {
                let mut order = order_in(status);
                let before = order.clone();
                let result = order.execute(&command, &with_policy(actor, policy));

                if permitted(status, &command, progression) {
                    assert!(result.is_ok(), "{status} / {command:?} should succeed: {result:?}");
                } else {
                    match result {
                        Err(err) => assert_eq!(
                            err.kind(),
                            ErrorKind::InvalidTransition,
                            "{status} / {command:?} failed with {err}"
                        ),
                        Ok(_) => panic!("{status} / {command:?} should be refused"),
                    }
                    assert_eq!(order, before, "{status} / {command:?} changed the order");
                }
            }
        }
    }

    #[test]
    fn test_transition_table_forward_only() {
        check_table(ProgressionPolicy::ForwardOnly);
    }

    #[test]
    fn test_transition_table_permissive() {
        check_table(ProgressionPolicy::Permissive);
    }

    #[test]
    fn test_approve_stamps_time() {
        let mut order = placed_order("o1", "u1");
        order.execute(&OrderCommand::Approve, &ctx(admin())).unwrap();

        assert_eq!(order.status(), OrderStatus::Approved);
        assert_eq!(order.approved_at(), Some(t0() + Duration::hours(1)));
        assert_eq!(order.updated_at(), t0() + Duration::hours(1));
    }

    #[test]
    fn test_reject_records_reason() {
        let mut order = placed_order("o1", "u1");
        order
            .execute(&OrderCommand::Reject { reason: "  address unreachable ".into() }, &ctx(admin()))
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.rejection_reason(), Some("address unreachable"));
        assert!(order.rejected_at().is_some());
    }

    #[test]
    fn test_blank_reasons_are_validation_errors() {
        let mut order = placed_order("o1", "u1");
        let err = order
            .execute(&OrderCommand::Reject { reason: "   ".into() }, &ctx(admin()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = order
            .execute(&OrderCommand::RequestCancellation { reason: "".into() }, &ctx(customer("u1")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(order, placed_order("o1", "u1"));
    }

    #[test]
    fn test_advance_rejects_non_fulfilment_targets() {
        let mut order = order_in(OrderStatus::Approved);
        for target in [OrderStatus::PendingApproval, OrderStatus::Cancelled] {
            let err = order.execute(&OrderCommand::Advance { target }, &ctx(admin())).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_forward_only_allows_skipping_ahead() {
        let mut order = order_in(OrderStatus::Approved);
        order
            .execute(&OrderCommand::Advance { target: OrderStatus::Shipped }, &ctx(admin()))
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Shipped);

        let err = order
            .execute(&OrderCommand::Advance { target: OrderStatus::InProgress }, &ctx(admin()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_permissive_allows_moving_back() {
        let permissive = TransitionPolicy {
            progression: ProgressionPolicy::Permissive,
            ..TransitionPolicy::default()
        };
        let mut order = order_in(OrderStatus::Shipped);
        order
            .execute(
                &OrderCommand::Advance { target: OrderStatus::Approved },
                &with_policy(admin(), permissive),
            )
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Approved);
    }

    #[test]
    fn test_delivered_is_terminal() {
        let mut order = order_in(OrderStatus::Approved);
        order
            .execute(&OrderCommand::Advance { target: OrderStatus::Delivered }, &ctx(admin()))
            .unwrap();

        for command in [
            OrderCommand::Approve,
            OrderCommand::Reject { reason: "late".into() },
            OrderCommand::Advance { target: OrderStatus::Shipped },
            OrderCommand::Advance { target: OrderStatus::Delivered },
        ] {
            let err = order.execute(&command, &ctx(admin())).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition, "{command:?}");
        }
        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_pending_request_locks_the_order() {
        let mut order = order_in(OrderStatus::Approved);
        order
            .execute(&OrderCommand::RequestCancellation { reason: "changed mind".into() }, &ctx(customer("u1")))
            .unwrap();
        assert!(order.is_locked());
        let locked = order.clone();

        for command in [
            OrderCommand::Advance { target: OrderStatus::InProgress },
            OrderCommand::SetEstimatedDelivery {
                date: t0().date_naive() + Duration::days(3),
            },
        ] {
            let err = order.execute(&command, &ctx(admin())).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        }

        let mut pending = placed_order("o2", "u1");
        pending
            .execute(&OrderCommand::RequestCancellation { reason: "oops".into() }, &ctx(customer("u1")))
            .unwrap();
        for command in [OrderCommand::Approve, OrderCommand::Reject { reason: "no".into() }] {
            let err = pending.execute(&command, &ctx(admin())).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        }

        assert_eq!(order, locked);
    }

    #[test]
    fn test_second_cancellation_request_is_refused() {
        let mut order = placed_order("o1", "u1");
        let request = OrderCommand::RequestCancellation { reason: "changed mind".into() };
        order.execute(&request, &ctx(customer("u1"))).unwrap();

        let err = order.execute(&request, &ctx(customer("u1"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_approve_cancel_request_is_terminal() {
        let mut order = order_in(OrderStatus::Approved);
        order
            .execute(&OrderCommand::RequestCancellation { reason: "changed mind".into() }, &ctx(customer("u1")))
            .unwrap();
        order.execute(&OrderCommand::ApproveCancelRequest, &ctx(admin())).unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.cancel_approved(), CancelDecision::Approved);
        assert!(order.cancel_approved_at().is_some());

        let err = order
            .execute(&OrderCommand::Advance { target: OrderStatus::Shipped }, &ctx(admin()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_reject_cancel_request_keeps_request_by_default() {
        let mut order = order_in(OrderStatus::Approved);
        let request = OrderCommand::RequestCancellation { reason: "changed mind".into() };
        order.execute(&request, &ctx(customer("u1"))).unwrap();
        order.execute(&OrderCommand::RejectCancelRequest, &ctx(admin())).unwrap();

        assert_eq!(order.status(), OrderStatus::Approved);
        assert_eq!(order.cancel_approved(), CancelDecision::Rejected);
        assert!(order.cancel_requested());
        assert!(!order.is_locked());

        // The customer cannot ask again.
        let err = order.execute(&request, &ctx(customer("u1"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        // Fulfilment resumes.
        order
            .execute(&OrderCommand::Advance { target: OrderStatus::InProgress }, &ctx(admin()))
            .unwrap();
        assert_eq!(order.status(), OrderStatus::InProgress);
    }

    #[test]
    fn test_reject_cancel_request_can_reopen() {
        let policy = TransitionPolicy {
            cancel_rejection: CancelRejectionPolicy::AllowRerequest,
            ..TransitionPolicy::default()
        };
        let mut order = order_in(OrderStatus::Approved);
        let request = OrderCommand::RequestCancellation { reason: "changed mind".into() };
        order.execute(&request, &with_policy(customer("u1"), policy)).unwrap();
        order
            .execute(&OrderCommand::RejectCancelRequest, &with_policy(admin(), policy))
            .unwrap();

        assert!(!order.cancel_requested());
        assert_eq!(order.cancel_approved(), CancelDecision::Rejected);
        assert!(!order.is_locked());

        order
            .execute(&OrderCommand::RequestCancellation { reason: "really".into() }, &with_policy(customer("u1"), policy))
            .unwrap();
        assert!(order.is_locked());
        assert_eq!(order.cancel_approved(), CancelDecision::Unset);
        assert_eq!(order.cancel_reason(), Some("really"));
    }

    #[test]
    fn test_actor_checks() {
        let mut order = placed_order("o1", "u1");

        let err = order.execute(&OrderCommand::Approve, &ctx(customer("u1"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let request = OrderCommand::RequestCancellation { reason: "x".into() };
        assert_eq!(
            order.execute(&request, &ctx(customer("u2"))).unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            order.execute(&request, &ctx(admin())).unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            order.execute(&request, &ctx(customer("u1").banned())).unwrap_err().kind(),
            ErrorKind::Forbidden
        );

        let pay = OrderCommand::RecordPayment {
            payment_id: "pay_1".into(),
            method: "card".into(),
        };
        assert_eq!(
            order.execute(&pay, &ctx(customer("u2"))).unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(order, placed_order("o1", "u1"));
    }

    #[test]
    fn test_payment_recorded_once() {
        let mut order = placed_order("o1", "u1");
        assert!(!order.is_paid());
        let pay = OrderCommand::RecordPayment {
            payment_id: "pay_1".into(),
            method: "card".into(),
        };
        order.execute(&pay, &ctx(customer("u1"))).unwrap();
        assert_eq!(order.payment().map(|p| p.payment_id.as_str()), Some("pay_1"));
        assert!(order.is_paid());

        let err = order.execute(&pay, &ctx(admin())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn test_estimated_delivery_before_placement_is_invalid() {
        let mut order = order_in(OrderStatus::Approved);
        let err = order
            .execute(
                &OrderCommand::SetEstimatedDelivery {
                    date: t0().date_naive() - Duration::days(1),
                },
                &ctx(admin()),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_estimated_delivery_does_not_change_status() {
        let mut order = order_in(OrderStatus::InProgress);
        let date = t0().date_naive() + Duration::days(4);
        order
            .execute(&OrderCommand::SetEstimatedDelivery { date }, &ctx(admin()))
            .unwrap();
        assert_eq!(order.status(), OrderStatus::InProgress);
        assert_eq!(order.estimated_delivery(), Some(date));
    }

    #[test]
    fn test_updated_at_never_moves_backwards() {
        let mut order = placed_order("o1", "u1");
        let earlier = CommandContext {
            now: t0() - Duration::minutes(5),
            ..ctx(admin())
        };
        order.execute(&OrderCommand::Approve, &earlier).unwrap();

        assert_eq!(order.updated_at(), t0());
        assert!(order.updated_at() >= order.created_at());
    }

    #[test]
    fn test_document_round_trip_keeps_wire_names() {
        let mut order = order_in(OrderStatus::Approved);
        order
            .execute(&OrderCommand::RequestCancellation { reason: "changed mind".into() }, &ctx(customer("u1")))
            .unwrap();

        let body = encode_document(&order).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "approved");
        assert_eq!(json["cancelRequested"], true);
        assert_eq!(json["cancelApproved"], serde_json::Value::Null);
        assert!(json.get("rejectedAt").is_none());

        let decoded: Order = decode_document(order.id(), &body).unwrap();
        assert_eq!(decoded, order);
    }

    #[test]
    fn test_malformed_order_rejected_at_boundary() {
        let order = placed_order("o1", "u1");
        let mut json: serde_json::Value = serde_json::from_str(&encode_document(&order).unwrap()).unwrap();
        json["items"] = serde_json::json!([]);

        let err = decode_document::<Order>("o1", &json.to_string()).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));

        json["status"] = serde_json::json!("on_hold");
        let err = decode_document::<Order>("o1", &json.to_string()).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_overflowing_line_rejected_at_boundary() {
        let order = placed_order("o1", "u1");
        let mut json: serde_json::Value = serde_json::from_str(&encode_document(&order).unwrap()).unwrap();
        json["items"][0]["unitPrice"] = serde_json::json!(Decimal::MAX.to_string());
        json["items"][0]["subtotal"] = serde_json::json!(Decimal::MAX.to_string());

        let err = decode_document::<Order>("o1", &json.to_string()).unwrap_err();
        match err {
            StoreError::Malformed { reason, .. } => assert!(reason.contains("overflows")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_legacy_pending_status_loads_as_pending_approval() {
        let order = placed_order("o1", "u1");
        let mut json: serde_json::Value = serde_json::from_str(&encode_document(&order).unwrap()).unwrap();
        json["status"] = serde_json::json!("pending");

        let decoded = decode_document::<Order>("o1", &json.to_string()).unwrap();
        assert_eq!(decoded.status(), OrderStatus::PendingApproval);
    }
}
