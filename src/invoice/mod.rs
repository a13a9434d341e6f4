mod payment;
mod totals;

pub use payment::{build_payment_info, derive_payment_status, PaymentStatus};
pub use totals::{compute_totals, line_total, round_money, Totals};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::Currency;
use crate::error::{BillingError, Result};

/// What kind of work or goods a line item bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Product,
    #[default]
    Service,
    Hourly,
    Miscellaneous,
}

impl ItemKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "product" => Some(Self::Product),
            "service" => Some(Self::Service),
            "hourly" => Some(Self::Hourly),
            "miscellaneous" | "misc" => Some(Self::Miscellaneous),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Service => "service",
            Self::Hourly => "hourly",
            Self::Miscellaneous => "miscellaneous",
        }
    }
}

/// A line item on an invoice. Extra hours are billed at the same unit price.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvoiceItem {
    pub id: Uuid,
    pub description: String,
    #[serde(default)]
    pub kind: ItemKind,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_hours: Option<Decimal>,
}

impl InvoiceItem {
    pub fn new(description: &str, kind: ItemKind, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.to_string(),
            kind,
            quantity,
            unit_price,
            extra_hours: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringInterval {
    Monthly,
    Quarterly,
    Yearly,
}

/// The invoice aggregate. Client contact fields are copied in by value from
/// the customer record at draft time; the discount amount is a frozen
/// snapshot written by the coupon engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub project_number: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub client_name: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default)]
    pub client_address: String,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    pub currency: Currency,
    pub tax_enabled: bool,
    /// Percentage, 0-100.
    pub tax_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    pub discount_amount: Decimal,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub po_number: String,
    #[serde(default)]
    pub bank_details: String,
    pub payment_status: PaymentStatus,
    pub amount_paid: Decimal,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_interval: Option<RecurringInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    pub created_at: NaiveDate,
    pub updated_at: NaiveDate,
}

impl Invoice {
    /// Validate an invoice before save. Aborts the whole save on the first
    /// problem; nothing is partially persisted.
    pub fn validate(&self) -> Result<()> {
        if self.client_name.trim().is_empty() {
            return Err(BillingError::MissingClientName);
        }
        if self.items.is_empty() {
            return Err(BillingError::NoItems);
        }
        for item in &self.items {
            if item.description.trim().is_empty() {
                return Err(BillingError::InvalidItem(
                    "description must not be blank".to_string(),
                ));
            }
            if item.quantity == 0 {
                return Err(BillingError::InvalidItem(format!(
                    "quantity for '{}' must be at least 1",
                    item.description
                )));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(BillingError::InvalidItem(format!(
                    "unit price for '{}' must not be negative",
                    item.description
                )));
            }
            if item.extra_hours.is_some_and(|h| h < Decimal::ZERO) {
                return Err(BillingError::InvalidItem(format!(
                    "extra hours for '{}' must not be negative",
                    item.description
                )));
            }
        }
        Ok(())
    }
}
