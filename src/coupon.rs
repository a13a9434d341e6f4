use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BillingError, Result};
use crate::invoice::{line_total, Invoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

impl DiscountKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "percentage" | "percent" => Some(Self::Percentage),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Coupon {
    pub id: Uuid,
    /// Unique across the collection, compared case-insensitively.
    pub code: String,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub usage_count: u32,
    pub created_at: NaiveDate,
}

/// Case-insensitive exact-match lookup.
pub fn find_by_code<'a>(coupons: &'a [Coupon], code: &str) -> Option<&'a Coupon> {
    coupons.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Create a new coupon, rejecting codes that collide (case-insensitively)
/// with any existing coupon, active or not. Callers that persist the result
/// should re-run this check right before the insert if their store has no
/// uniqueness constraint.
pub fn create(
    coupons: &[Coupon],
    code: &str,
    kind: DiscountKind,
    value: Decimal,
    description: Option<String>,
    today: NaiveDate,
) -> Result<Coupon> {
    let code = code.trim();
    if code.is_empty() {
        return Err(BillingError::InvalidArgument(
            "coupon code must not be empty".to_string(),
        ));
    }
    if value <= Decimal::ZERO {
        return Err(BillingError::InvalidArgument(
            "discount value must be greater than zero".to_string(),
        ));
    }
    if find_by_code(coupons, code).is_some() {
        return Err(BillingError::DuplicateCode(code.to_uppercase()));
    }
    Ok(Coupon {
        id: Uuid::new_v4(),
        code: code.to_uppercase(),
        discount_kind: kind,
        discount_value: value,
        description,
        is_active: true,
        usage_count: 0,
        created_at: today,
    })
}

/// Flip the active flag; nothing else changes.
pub fn toggle_active(coupon: &mut Coupon) {
    coupon.is_active = !coupon.is_active;
}

/// Apply a coupon to an invoice draft.
///
/// The discount is computed against the invoice's current tax-inclusive
/// total and written onto the draft as a plain amount. It is a snapshot:
/// later edits to the coupon, the tax rate or the items do not rescale it.
pub fn apply_to_invoice(invoice: &mut Invoice, coupons: &[Coupon], code: &str) -> Result<Decimal> {
    let code = code.trim();
    let coupon = find_by_code(coupons, code)
        .filter(|c| c.is_active)
        .ok_or_else(|| BillingError::InvalidCoupon(code.to_string()))?;

    let subtotal: Decimal = invoice.items.iter().map(line_total).sum();
    let tax = if invoice.tax_enabled {
        subtotal * invoice.tax_rate / Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    let total_with_tax = subtotal + tax;

    let discount = match coupon.discount_kind {
        DiscountKind::Percentage => total_with_tax * coupon.discount_value / Decimal::ONE_HUNDRED,
        DiscountKind::Fixed => coupon.discount_value,
    };

    invoice.discount_code = Some(coupon.code.clone());
    invoice.discount_amount = discount;
    Ok(discount)
}

/// Clear the applied coupon from a draft.
pub fn remove_from_invoice(invoice: &mut Invoice) {
    invoice.discount_code = None;
    invoice.discount_amount = Decimal::ZERO;
}

/// Redeem a coupon: single-use semantics with code rotation.
///
/// The redeemed coupon gets its usage counted and is deactivated; a
/// replacement carrying the same discount terms is issued under the next
/// code in the chain, so a recurring campaign never runs out of codes.
/// Returns the replacement.
pub fn redeem(coupons: &mut Vec<Coupon>, code: &str, today: NaiveDate) -> Result<Coupon> {
    let idx = coupons
        .iter()
        .position(|c| c.code.eq_ignore_ascii_case(code.trim()) && c.is_active)
        .ok_or_else(|| BillingError::InvalidCoupon(code.trim().to_string()))?;

    coupons[idx].usage_count += 1;
    coupons[idx].is_active = false;

    let spent = coupons[idx].clone();
    let replacement = Coupon {
        id: Uuid::new_v4(),
        code: rotated_code(&spent.code, coupons),
        discount_kind: spent.discount_kind,
        discount_value: spent.discount_value,
        description: spent.description.clone(),
        is_active: true,
        usage_count: 0,
        created_at: today,
    };
    coupons.push(replacement.clone());
    Ok(replacement)
}

/// Next code in a rotation chain: `SAVE20` becomes `SAVE20-0001`,
/// `SAVE20-0001` becomes `SAVE20-0002`, bumped further past any code
/// already taken.
fn rotated_code(code: &str, existing: &[Coupon]) -> String {
    let (base, seq) = match code.rsplit_once('-') {
        Some((base, suffix)) if suffix.chars().all(|c| c.is_ascii_digit()) => {
            (base, suffix.parse::<u32>().unwrap_or(0))
        }
        _ => (code, 0),
    };

    let mut next = seq + 1;
    loop {
        let candidate = format!("{base}-{next:04}");
        if find_by_code(existing, &candidate).is_none() {
            return candidate;
        }
        next += 1;
    }
}
