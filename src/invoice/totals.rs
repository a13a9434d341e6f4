use rust_decimal::{Decimal, RoundingStrategy};

use super::{Invoice, InvoiceItem};

/// Derived money figures for one invoice. Values are exact; rounding happens
/// only when a figure is formatted for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub remaining: Decimal,
}

/// Round a money amount to 2 decimal places, half-up.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// quantity x unit price, plus extra hours billed at the same unit price.
pub fn line_total(item: &InvoiceItem) -> Decimal {
    let extra = item.extra_hours.unwrap_or(Decimal::ZERO);
    Decimal::from(item.quantity) * item.unit_price + extra * item.unit_price
}

/// Compute subtotal, tax, total and remaining balance for an invoice.
///
/// The discount amount is a frozen currency figure written at
/// coupon-application time; it is subtracted as-is and the total is not
/// clamped, so an oversized discount or an overpayment produces a negative
/// total or remaining balance.
pub fn compute_totals(invoice: &Invoice) -> Totals {
    let subtotal: Decimal = invoice.items.iter().map(line_total).sum();
    let tax = if invoice.tax_enabled {
        subtotal * invoice.tax_rate / Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    let total = subtotal + tax - invoice.discount_amount;
    let remaining = total - invoice.amount_paid;
    Totals {
        subtotal,
        tax,
        total,
        remaining,
    }
}
