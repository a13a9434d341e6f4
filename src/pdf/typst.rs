use std::path::PathBuf;
use std::process::Command;

use super::RenderData;
use crate::error::{BillingError, Result};

/// Embedded Typst template for invoice generation.
/// Money fields arrive pre-formatted; the template only does layout.
const INVOICE_TEMPLATE: &str = r##"// Invoice Template
// Data is loaded from JSON file

#let data = json("DATA_JSON_PATH")

#set page(
  paper: "a4",
  margin: (top: 1in, bottom: 1in, left: 1in, right: 1in),
)

#set text(font: "Helvetica", size: 10pt)

// Header with company info and invoice details
#grid(
  columns: (1fr, 1fr),
  align: (left, right),
  [
    #text(size: 18pt, weight: "bold")[#data.company_name]
    #v(0.3em)
    #if data.company_address != "" [
      #data.company_address \
    ]
    #data.company_email
    #if data.company_phone != "" [
      \ #data.company_phone
    ]
  ],
  [
    #text(size: 24pt, weight: "bold")[INVOICE]
    #v(0.5em)
    #table(
      columns: (auto, auto),
      stroke: none,
      align: (right, left),
      inset: 2pt,
      [*Invoice \#:*], [#data.number],
      [*Project \#:*], [#data.project_number],
      [*Date:*], [#data.date],
      [*Due Date:*], [#data.due_date],
      ..if data.po_number != "" {
        ([*PO \#:*], [#data.po_number])
      } else {
        ()
      },
    )
  ]
)

#v(1em)
#line(length: 100%, stroke: 0.5pt + gray)
#v(1em)

// Bill To section
#grid(
  columns: (1fr, 1fr),
  [
    #text(weight: "bold", size: 11pt)[Bill To:]
    #v(0.3em)
    #text(weight: "bold")[#data.client_name]
    #if data.client_address != "" [
      \ #data.client_address
    ]
    #if data.client_email != "" [
      \ #data.client_email
    ]
    #if data.client_phone != "" [
      \ #data.client_phone
    ]
  ],
  []
)

#v(1.5em)

// Line items table
#let cols = if data.has_extra_hours {
  (auto, 1fr, auto, auto, auto, auto, auto)
} else {
  (auto, 1fr, auto, auto, auto, auto)
}

#table(
  columns: cols,
  align: (center, left, left, right, right, right, right),
  stroke: (x, y) => if y == 0 { (bottom: 1pt + black) } else if y > 0 { (bottom: 0.5pt + gray) },
  inset: 8pt,
  fill: (x, y) => if y == 0 { luma(240) } else { none },

  // Header
  [*\#*], [*Description*], [*Type*], [*Qty*],
  ..if data.has_extra_hours { ([*Extra Hrs*],) } else { () },
  [*Rate*], [*Amount*],

  // Items
  ..data.items.enumerate().map(((i, item)) => (
    str(i + 1),
    item.description,
    item.kind,
    str(item.quantity),
    ..if data.has_extra_hours { (item.extra_hours,) } else { () },
    item.rate,
    item.amount,
  )).flatten()
)

#v(1em)

// Totals
#align(right)[
  #table(
    columns: (auto, auto),
    stroke: none,
    align: (right, right),
    inset: 6pt,

    [Subtotal:], [#data.subtotal],

    ..if data.tax_enabled {
      ([Tax (#data.tax_rate%):], [#data.tax_amount])
    } else {
      ()
    },

    ..if data.has_discount {
      ([Discount #if data.discount_code != none [(#data.discount_code)]:], [--#data.discount_amount])
    } else {
      ()
    },

    table.hline(stroke: 1pt),
    [*Total:*], [*#data.total*],

    ..if data.has_payment {
      ([Amount Paid:], [#data.amount_paid],
       [*Balance Due:*], [*#data.balance_due*])
    } else {
      ()
    },
  )
]

#v(2em)

// Payment block (UPI URI or bank transfer text)
#text(weight: "bold", size: 11pt)[Payment]
#v(0.3em)
#block(
  fill: luma(248),
  inset: 8pt,
  radius: 2pt,
  text(size: 8pt, font: "Courier New")[#data.payment_info]
)

#if data.notes != "" [
  #v(1em)
  #text(weight: "bold")[Notes:] \
  #data.notes
]

#if data.bank_details != "" [
  #v(1em)
  #text(weight: "bold")[Bank Details:] \
  #data.bank_details
]

#if data.company_tax_id != none [
  #v(0.5em)
  #text(size: 9pt, fill: gray)[Tax ID: #data.company_tax_id]
]
"##;

/// Render an invoice PDF using the Typst CLI.
pub fn render_invoice_pdf(data: &RenderData, output_path: &PathBuf) -> Result<()> {
    // Check if typst is available
    let typst_check = Command::new("typst").arg("--version").output();

    if typst_check.is_err() {
        return Err(BillingError::TypstNotFound);
    }

    // Create temp directory for template
    let temp_dir = std::env::temp_dir().join("quickbill");
    std::fs::create_dir_all(&temp_dir)?;

    // Serialize render data to JSON
    let json_data =
        serde_json::to_string(data).map_err(|e| BillingError::PdfGeneration(e.to_string()))?;

    // Write JSON to temp file
    let json_path = temp_dir.join("data.json");
    std::fs::write(&json_path, &json_data)?;

    // Write template with relative JSON path (data.json is in same directory)
    let template_content = INVOICE_TEMPLATE.replace("DATA_JSON_PATH", "data.json");
    let template_path = temp_dir.join("invoice.typ");
    std::fs::write(&template_path, &template_content)?;

    // Run typst compile with root set to temp directory
    let output = Command::new("typst")
        .args([
            "compile",
            "--root",
            temp_dir.to_str().unwrap_or("."),
            template_path.to_str().unwrap_or(""),
            output_path.to_str().unwrap_or(""),
        ])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BillingError::PdfGeneration(stderr.to_string()));
    }

    // Clean up temp files
    let _ = std::fs::remove_file(&template_path);
    let _ = std::fs::remove_file(&json_path);

    Ok(())
}
