use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::pricing::PricedLine;

// ============================================================================
// Order Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Older documents spell this `pending`.
    #[serde(alias = "pending")]
    PendingApproval,
    Approved,
    InProgress,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::PendingApproval,
        OrderStatus::Approved,
        OrderStatus::InProgress,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingApproval => "pending_approval",
            OrderStatus::Approved => "approved",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Statuses from which `advance` may run.
    pub fn is_fulfilment(&self) -> bool {
        matches!(
            self,
            OrderStatus::Approved | OrderStatus::InProgress | OrderStatus::Shipped
        )
    }

    /// Position on the fulfilment path; `None` off the path.
    pub fn progression_rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Approved => Some(1),
            OrderStatus::InProgress => Some(2),
            OrderStatus::Shipped => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::PendingApproval | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_advance_target(&self) -> bool {
        self.progression_rank().is_some()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status {s:?}"))
    }
}

/// Admin's answer to a cancellation request. Stored as `null`/`true`/`false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum CancelDecision {
    #[default]
    Unset,
    Approved,
    Rejected,
}

impl From<Option<bool>> for CancelDecision {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => CancelDecision::Unset,
            Some(true) => CancelDecision::Approved,
            Some(false) => CancelDecision::Rejected,
        }
    }
}

impl From<CancelDecision> for Option<bool> {
    fn from(value: CancelDecision) -> Self {
        match value {
            CancelDecision::Unset => None,
            CancelDecision::Approved => Some(true),
            CancelDecision::Rejected => Some(false),
        }
    }
}

/// One product at its frozen price. Immutable once the order exists.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl OrderLineItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
        image_url: Option<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            // An out-of-range product saturates here and is refused by `check`.
            subtotal: unit_price.saturating_mul(Decimal::from(quantity)),
            image_url,
        }
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        if self.product_id.trim().is_empty() {
            return Err("line item without product id".to_string());
        }
        if self.quantity < 1 {
            return Err(format!("{}: quantity must be at least 1", self.product_id));
        }
        if self.unit_price.is_sign_negative() {
            return Err(format!("{}: negative unit price", self.product_id));
        }
        let expected = self
            .unit_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| format!("{}: subtotal overflows", self.product_id))?;
        if self.subtotal != expected {
            return Err(format!(
                "{}: subtotal {} != {} x {}",
                self.product_id, self.subtotal, self.unit_price, self.quantity
            ));
        }
        Ok(())
    }
}

impl PricedLine for OrderLineItem {
    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("fullName", &self.full_name),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Marker left by the payment collaborator. The gateway itself is out of scope.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub payment_id: String,
    pub method: String,
    pub paid_at: DateTime<Utc>,
}

// ============================================================================
// Transition Policies
// ============================================================================

/// How `advance` treats the current position on the fulfilment path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressionPolicy {
    /// Target must be further along than the current status. Skipping is allowed.
    #[default]
    ForwardOnly,
    /// Any fulfilment target from any fulfilment status.
    Permissive,
}

impl FromStr for ProgressionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward_only" => Ok(ProgressionPolicy::ForwardOnly),
            "permissive" => Ok(ProgressionPolicy::Permissive),
            other => Err(format!("expected forward_only or permissive, got {other:?}")),
        }
    }
}

/// What rejecting a cancellation request does to the request flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelRejectionPolicy {
    /// `cancelRequested` stays true, so the customer cannot ask again.
    #[default]
    KeepRequest,
    /// `cancelRequested` is cleared and the customer may ask again.
    AllowRerequest,
}

impl FromStr for CancelRejectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep_request" => Ok(CancelRejectionPolicy::KeepRequest),
            "allow_rerequest" => Ok(CancelRejectionPolicy::AllowRerequest),
            other => Err(format!("expected keep_request or allow_rerequest, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionPolicy {
    pub progression: ProgressionPolicy,
    pub cancel_rejection: CancelRejectionPolicy,
}

// ============================================================================
// Unit Tests
// ============================================================================
