use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;

/// Tenant-wide configuration singleton: company identity, payment details
/// and the numbering prefixes/counters. One instance exists per config
/// directory; the store creates it with these defaults on first read.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompanySettings {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub bank_details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub default_currency: Currency,
    /// Percentage, 0-100.
    pub default_tax_rate: Decimal,
    pub invoice_prefix: String,
    pub next_invoice_number: u32,
    pub project_prefix: String,
    pub next_project_number: u32,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            name: "Your Company Name".to_string(),
            email: "billing@yourcompany.com".to_string(),
            phone: String::new(),
            address: String::new(),
            bank_details: String::new(),
            tax_id: None,
            upi_id: None,
            logo: None,
            signature: None,
            default_currency: Currency::Usd,
            default_tax_rate: dec!(18),
            invoice_prefix: "INV".to_string(),
            next_invoice_number: 1,
            project_prefix: "PRJ".to_string(),
            next_project_number: 1,
        }
    }
}
