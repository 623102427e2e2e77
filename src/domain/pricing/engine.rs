use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::errors::PricingError;

// ============================================================================
// Pricing Engine
// ============================================================================

/// Fixed GST rate, 18%.
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Anything with a frozen unit price and a quantity.
pub trait PricedLine {
    fn unit_price(&self) -> Decimal;
    fn quantity(&self) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Two decimal places, midpoints away from zero. For display only.
    pub fn rounded(&self) -> Self {
        let round = |value: Decimal| value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            subtotal: round(self.subtotal),
            tax: round(self.tax),
            total: round(self.total),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PricingEngine {
    tax_rate: Decimal,
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TAX_RATE)
    }
}

impl PricingEngine {
    pub fn new(tax_rate: Decimal) -> Self {
        Self { tax_rate }
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    pub fn line_subtotal<L: PricedLine>(&self, line: &L) -> Result<Decimal, PricingError> {
        line.unit_price()
            .checked_mul(Decimal::from(line.quantity()))
            .ok_or(PricingError::Overflow("line subtotal"))
    }

    pub fn order_subtotal<L: PricedLine>(&self, lines: &[L]) -> Result<Decimal, PricingError> {
        lines.iter().try_fold(Decimal::ZERO, |subtotal, line| {
            subtotal
                .checked_add(self.line_subtotal(line)?)
                .ok_or(PricingError::Overflow("order subtotal"))
        })
    }

    pub fn tax(&self, subtotal: Decimal) -> Result<Decimal, PricingError> {
        subtotal
            .checked_mul(self.tax_rate)
            .ok_or(PricingError::Overflow("tax"))
    }

    pub fn order_total(&self, subtotal: Decimal) -> Result<Decimal, PricingError> {
        subtotal
            .checked_add(self.tax(subtotal)?)
            .ok_or(PricingError::Overflow("order total"))
    }

    pub fn quote<L: PricedLine>(&self, lines: &[L]) -> Result<PriceBreakdown, PricingError> {
        let subtotal = self.order_subtotal(lines)?;
        let tax = self.tax(subtotal)?;
        let total = subtotal
            .checked_add(tax)
            .ok_or(PricingError::Overflow("order total"))?;
        Ok(PriceBreakdown { subtotal, tax, total })
    }
}
