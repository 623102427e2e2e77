//! Shared fixtures for unit tests.

use std::sync::Mutex;

use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rust_decimal::Decimal;

use crate::document_store::{Aggregate as _, Document, Versioned};
use crate::domain::catalog::{Offer, Product};
use crate::domain::order::{
    CommandContext, Order, OrderCommand, OrderLineItem, OrderStatus, ShippingAddress, TransitionPolicy,
};
use crate::domain::ActorContext;

// ============================================================================
// Clock
// ============================================================================

pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl FixtureClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Noon UTC on `day`.
    pub fn on(day: NaiveDate) -> Self {
        Self::at(noon(day))
    }

    pub fn set_date(&self, day: NaiveDate) {
        *self.lock_clock() = noon(day);
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *self.lock_clock() += TimeDelta::minutes(minutes);
    }

    pub fn advance_days(&self, days: i64) {
        *self.lock_clock() += TimeDelta::days(days);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().expect("clock mutex poisoned")
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

fn noon(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(12, 0, 0).expect("valid fixture time").and_utc()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// Fixed instant most order fixtures are placed at.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 15, 10, 0, 0).unwrap()
}

// ============================================================================
// Actors
// ============================================================================

pub fn customer(user_id: &str) -> ActorContext {
    ActorContext::customer(user_id)
}

pub fn admin() -> ActorContext {
    ActorContext::admin("admin-1")
}

// ============================================================================
// Catalog
// ============================================================================

pub fn sample_product(id: &str, price: Decimal, stock: u32) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        price,
        stock,
        category: Some("kitchen".to_string()),
        image_url: None,
        offer: None,
    }
}

pub fn product_with_offer(id: &str, price: Decimal, offer: Offer) -> Product {
    Product {
        offer: Some(offer),
        ..sample_product(id, price, 10)
    }
}

pub fn versioned<D: Document>(data: D, version: i64) -> Versioned<D> {
    Versioned {
        id: data.key(),
        version,
        stored_at: t0(),
        data,
    }
}

// ============================================================================
// Orders
// ============================================================================

pub fn sample_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".to_string(),
        phone: Some("+91 98765 43210".to_string()),
        address_line1: "12 MG Road".to_string(),
        address_line2: None,
        city: "Pune".to_string(),
        state: Some("Maharashtra".to_string()),
        postal_code: "411001".to_string(),
        country: "India".to_string(),
    }
}

/// Order in pending_approval, placed at `t0` by `user_id`.
pub fn placed_order(id: &str, user_id: &str) -> Order {
    let items = vec![OrderLineItem::new("p1", "Kettle", Decimal::ONE_HUNDRED, 2, None)];
    Order::placed(
        id.to_string(),
        user_id.to_string(),
        items,
        Decimal::from(236),
        sample_address(),
        format!("{user_id}@example.com"),
        t0(),
    )
}

/// Order owned by `u1`, driven to `status` through the normal transitions.
pub fn order_in(status: OrderStatus) -> Order {
    let mut order = placed_order("o1", "u1");
    let advance = |target| OrderCommand::Advance { target };
    let steps = match status {
        OrderStatus::PendingApproval => vec![],
        OrderStatus::Approved => vec![OrderCommand::Approve],
        OrderStatus::InProgress => vec![OrderCommand::Approve, advance(OrderStatus::InProgress)],
        OrderStatus::Shipped => vec![OrderCommand::Approve, advance(OrderStatus::Shipped)],
        OrderStatus::Delivered => vec![OrderCommand::Approve, advance(OrderStatus::Delivered)],
        OrderStatus::Cancelled => vec![OrderCommand::Reject {
            reason: "fixture".to_string(),
        }],
    };

    let ctx = CommandContext {
        actor: admin(),
        now: t0(),
        policy: TransitionPolicy::default(),
    };
    for step in &steps {
        order.execute(step, &ctx).expect("fixture step");
    }
    order
}
