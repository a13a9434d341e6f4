//! Invoice and project numbering.
//!
//! Generating a number and burning the counter are separate, explicit steps:
//! `next_*` is pure and can be called any number of times to preview the same
//! identifier, `increment_*` commits the counter. Callers that save invoices
//! should prefer the store's atomic reserve operations, which do both against
//! persisted settings in one call and so cannot hand the same number to two
//! concurrent drafts.

use crate::store::CompanySettings;

/// Format the next invoice number without consuming it.
/// Counters are zero-padded to 4 digits and never truncated.
pub fn next_invoice_number(settings: &CompanySettings) -> String {
    format!(
        "{}-{:04}",
        settings.invoice_prefix, settings.next_invoice_number
    )
}

/// Commit the invoice counter. Call only after a confirmed save.
pub fn increment_invoice_number(settings: &mut CompanySettings) {
    settings.next_invoice_number += 1;
}

/// Format the next project number without consuming it.
pub fn next_project_number(settings: &CompanySettings) -> String {
    format!(
        "{}-{:04}",
        settings.project_prefix, settings.next_project_number
    )
}

/// Commit the project counter. Call only after a confirmed save.
pub fn increment_project_number(settings: &mut CompanySettings) {
    settings.next_project_number += 1;
}
