use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{compute_totals, round_money, Invoice};
use crate::error::{BillingError, Result};
use crate::store::CompanySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "partial" => Some(Self::Partial),
            "paid" => Some(Self::Paid),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        };
        write!(f, "{s}")
    }
}

/// Status derived from the paid amount against the computed total.
/// Overdue is never derived here; it is only ever set manually.
pub fn derive_payment_status(amount_paid: Decimal, total: Decimal) -> PaymentStatus {
    if amount_paid >= total {
        PaymentStatus::Paid
    } else if amount_paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

impl Invoice {
    /// Record a new paid amount and re-derive the payment status from it.
    /// Overwrites a manually-set overdue flag, matching the edit behavior
    /// of the detail view.
    pub fn set_amount_paid(&mut self, amount: Decimal) -> Result<()> {
        if amount < Decimal::ZERO {
            return Err(BillingError::InvalidPaymentAmount);
        }
        let total = compute_totals(self).total;
        self.amount_paid = amount;
        self.payment_status = derive_payment_status(amount, total);
        Ok(())
    }

    /// Shortcut that settles the invoice in full: paid amount snaps to the
    /// computed total and the status flips to paid in the same step.
    pub fn mark_as_paid(&mut self) {
        let total = compute_totals(self).total;
        self.amount_paid = total;
        self.payment_status = PaymentStatus::Paid;
    }
}

// Everything encodeURIComponent escapes, nothing more: UPI apps are strict
// about which characters appear raw in the query string.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build the payment payload embedded in the invoice QR block.
///
/// With a UPI id configured this is a `upi://pay` URI; the `@` in the payee
/// address is deliberately left unencoded because some UPI apps reject `%40`.
/// Without one, a deterministic human-readable block with the invoice number,
/// amount and bank details stands in.
pub fn build_payment_info(invoice: &Invoice, settings: &CompanySettings) -> String {
    let total = round_money(compute_totals(invoice).total);
    let symbol = invoice.currency.symbol();

    let upi_id = settings.upi_id.as_deref().map(str::trim).unwrap_or("");
    if !upi_id.is_empty() && upi_id.contains('@') {
        let clean_id: String = upi_id.split_whitespace().collect();
        let payee = utf8_percent_encode(settings.name.trim(), COMPONENT).to_string();
        let note = utf8_percent_encode(&format!("Invoice {}", invoice.invoice_number), COMPONENT)
            .to_string();
        return format!(
            "upi://pay?pa={clean_id}&pn={payee}&am={total:.2}&cu={}&tn={note}",
            invoice.currency.code()
        );
    }

    let mut info = format!(
        "Payment for Invoice {}\nAmount: {symbol}{total:.2}\nCompany: {}\nEmail: {}",
        invoice.invoice_number, settings.name, settings.email
    );
    if !settings.bank_details.trim().is_empty() {
        info.push_str(&format!("\n\nBank Details:\n{}", settings.bank_details));
    }
    info
}
