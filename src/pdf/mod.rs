mod typst;

pub use typst::render_invoice_pdf;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::invoice::{build_payment_info, compute_totals, line_total, round_money, Invoice};
use crate::store::CompanySettings;

/// Flattened, display-ready invoice data handed to the Typst template.
/// Money is pre-formatted here so the template only places strings.
#[derive(Debug, Serialize)]
pub struct RenderData {
    pub number: String,
    pub project_number: String,
    pub date: String,
    pub due_date: String,
    pub company_name: String,
    pub company_email: String,
    pub company_phone: String,
    pub company_address: String,
    pub company_tax_id: Option<String>,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub client_address: String,
    pub items: Vec<RenderItem>,
    pub has_extra_hours: bool,
    pub subtotal: String,
    pub tax_enabled: bool,
    pub tax_rate: String,
    pub tax_amount: String,
    pub discount_code: Option<String>,
    pub discount_amount: String,
    pub has_discount: bool,
    pub total: String,
    pub amount_paid: String,
    pub has_payment: bool,
    pub balance_due: String,
    pub payment_info: String,
    pub notes: String,
    pub po_number: String,
    pub bank_details: String,
}

#[derive(Debug, Serialize)]
pub struct RenderItem {
    pub description: String,
    pub kind: String,
    pub quantity: u32,
    pub extra_hours: String,
    pub rate: String,
    pub amount: String,
}

fn money(symbol: &str, value: Decimal) -> String {
    format!("{symbol}{:.2}", round_money(value))
}

pub fn build_render_data(invoice: &Invoice, settings: &CompanySettings) -> RenderData {
    let totals = compute_totals(invoice);
    let symbol = invoice.currency.symbol();

    let items = invoice
        .items
        .iter()
        .map(|item| RenderItem {
            description: item.description.clone(),
            kind: item.kind.as_str().to_string(),
            quantity: item.quantity,
            extra_hours: item
                .extra_hours
                .map(|h| format!("{h}"))
                .unwrap_or_default(),
            rate: money(symbol, item.unit_price),
            amount: money(symbol, line_total(item)),
        })
        .collect();

    RenderData {
        number: invoice.invoice_number.clone(),
        project_number: invoice.project_number.clone(),
        date: invoice.date.format("%B %d, %Y").to_string(),
        due_date: invoice.due_date.format("%B %d, %Y").to_string(),
        company_name: settings.name.clone(),
        company_email: settings.email.clone(),
        company_phone: settings.phone.clone(),
        company_address: settings.address.clone(),
        company_tax_id: settings.tax_id.clone(),
        client_name: invoice.client_name.clone(),
        client_email: invoice.client_email.clone(),
        client_phone: invoice.client_phone.clone(),
        client_address: invoice.client_address.clone(),
        items,
        has_extra_hours: invoice
            .items
            .iter()
            .any(|i| i.extra_hours.is_some_and(|h| h > Decimal::ZERO)),
        subtotal: money(symbol, totals.subtotal),
        tax_enabled: invoice.tax_enabled,
        tax_rate: format!("{}", invoice.tax_rate.normalize()),
        tax_amount: money(symbol, totals.tax),
        discount_code: invoice.discount_code.clone(),
        discount_amount: money(symbol, invoice.discount_amount),
        has_discount: invoice.discount_amount != Decimal::ZERO,
        total: money(symbol, totals.total),
        amount_paid: money(symbol, invoice.amount_paid),
        has_payment: invoice.amount_paid > Decimal::ZERO,
        balance_due: money(symbol, totals.remaining),
        payment_info: build_payment_info(invoice, settings),
        notes: invoice.notes.clone(),
        po_number: invoice.po_number.clone(),
        bank_details: invoice.bank_details.clone(),
    }
}
