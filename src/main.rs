mod coupon;
mod currency;
mod error;
mod invoice;
mod numbering;
mod pdf;
mod store;

use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};
use uuid::Uuid;

use crate::coupon::DiscountKind;
use crate::currency::{Currency, RateProvider, RateSource};
use crate::error::{BillingError, Result};
use crate::invoice::{
    build_payment_info, compute_totals, round_money, Invoice, InvoiceItem, ItemKind,
    PaymentStatus, RecurringInterval,
};
use crate::pdf::{build_render_data, render_invoice_pdf};
use crate::store::{Customer, Store};

#[derive(Parser)]
#[command(name = "quickbill")]
#[command(version, about = "Small-business invoicing with coupons and payment tracking", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.quickbill or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// Show company settings, counts and the next invoice/project numbers
    Status,

    /// Create and save a new invoice
    New {
        /// Customer name (or id) from the customer list
        #[arg(short, long)]
        customer: String,

        /// Line items as "description:quantity:price[:extra-hours[:kind]]" (can be repeated)
        #[arg(short, long, value_name = "DESC:QTY:PRICE")]
        item: Vec<String>,

        /// Enable tax on this invoice
        #[arg(long)]
        tax: bool,

        /// Tax rate percentage (default: settings default rate)
        #[arg(long)]
        tax_rate: Option<String>,

        /// Coupon code to apply
        #[arg(long)]
        coupon: Option<String>,

        /// Days until the invoice is due
        #[arg(long, default_value_t = 30)]
        due_days: u32,

        /// Purchase order number
        #[arg(long)]
        po: Option<String>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,

        /// Recurring interval (monthly, quarterly, yearly)
        #[arg(long)]
        recurring: Option<String>,
    },

    /// List saved invoices
    List {
        /// Number of invoices to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one invoice in detail
    Show {
        /// Invoice number or index from 'list' (e.g., 1 or INV-0001)
        invoice: String,
    },

    /// Delete an invoice
    Delete {
        /// Invoice number or index from 'list'
        invoice: String,
    },

    /// List customers
    Customers,

    /// Add a customer
    AddCustomer {
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long)]
        company: Option<String>,
    },

    /// Remove a customer
    DeleteCustomer {
        /// Customer name or id
        customer: String,
    },

    /// List coupons
    Coupons,

    /// Create a discount coupon
    CreateCoupon {
        code: String,
        /// Discount kind: percentage or fixed
        #[arg(long, default_value = "percentage")]
        kind: String,
        /// Discount value (percent or currency amount)
        value: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Toggle a coupon between active and inactive
    ToggleCoupon { code: String },

    /// Delete a coupon
    DeleteCoupon { code: String },

    /// Redeem a coupon: retires the code and issues a replacement with the same terms
    RedeemCoupon { code: String },

    /// Apply a coupon to an invoice
    ApplyCoupon { invoice: String, code: String },

    /// Remove the applied coupon from an invoice
    RemoveCoupon { invoice: String },

    /// Record the paid amount on an invoice (status is derived from it)
    SetPaid {
        invoice: String,
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Manually override the payment status (pending, partial, paid, overdue)
    SetStatus { invoice: String, status: String },

    /// Mark an invoice as paid in full
    MarkPaid { invoice: String },

    /// Convert an invoice to another currency
    Convert {
        invoice: String,
        /// Target currency code (USD, EUR, INR, GBP)
        #[arg(long)]
        to: String,
    },

    /// Render an invoice PDF
    Render {
        invoice: String,

        /// Custom output file path (default: output/<number>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => store::config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(cfg_dir),
        Commands::Status => cmd_status(&Store::open(cfg_dir)?),
        Commands::New {
            customer,
            item,
            tax,
            tax_rate,
            coupon,
            due_days,
            po,
            notes,
            recurring,
        } => cmd_new(
            &Store::open(cfg_dir)?,
            &customer,
            &item,
            tax,
            tax_rate,
            coupon,
            due_days,
            po,
            notes,
            recurring,
        ),
        Commands::List { limit } => cmd_list(&Store::open(cfg_dir)?, limit),
        Commands::Show { invoice } => cmd_show(&Store::open(cfg_dir)?, &invoice),
        Commands::Delete { invoice } => cmd_delete(&Store::open(cfg_dir)?, &invoice),
        Commands::Customers => cmd_customers(&Store::open(cfg_dir)?),
        Commands::AddCustomer {
            name,
            email,
            phone,
            address,
            company,
        } => cmd_add_customer(&Store::open(cfg_dir)?, name, email, phone, address, company),
        Commands::DeleteCustomer { customer } => {
            cmd_delete_customer(&Store::open(cfg_dir)?, &customer)
        }
        Commands::Coupons => cmd_coupons(&Store::open(cfg_dir)?),
        Commands::CreateCoupon {
            code,
            kind,
            value,
            description,
        } => cmd_create_coupon(&Store::open(cfg_dir)?, &code, &kind, &value, description),
        Commands::ToggleCoupon { code } => cmd_toggle_coupon(&Store::open(cfg_dir)?, &code),
        Commands::DeleteCoupon { code } => cmd_delete_coupon(&Store::open(cfg_dir)?, &code),
        Commands::RedeemCoupon { code } => cmd_redeem_coupon(&Store::open(cfg_dir)?, &code),
        Commands::ApplyCoupon { invoice, code } => {
            cmd_apply_coupon(&Store::open(cfg_dir)?, &invoice, &code)
        }
        Commands::RemoveCoupon { invoice } => cmd_remove_coupon(&Store::open(cfg_dir)?, &invoice),
        Commands::SetPaid { invoice, amount } => {
            cmd_set_paid(&Store::open(cfg_dir)?, &invoice, &amount)
        }
        Commands::SetStatus { invoice, status } => {
            cmd_set_status(&Store::open(cfg_dir)?, &invoice, &status)
        }
        Commands::MarkPaid { invoice } => cmd_mark_paid(&Store::open(cfg_dir)?, &invoice),
        Commands::Convert { invoice, to } => cmd_convert(&Store::open(cfg_dir)?, &invoice, &to),
        Commands::Render {
            invoice,
            output,
            open,
        } => cmd_render(&Store::open(cfg_dir)?, &invoice, output, open),
    }
}

// Table row structs for tabled
#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "PAID")]
    paid: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "PHONE")]
    phone: String,
    #[tabled(rename = "COMPANY")]
    company: String,
}

#[derive(Tabled)]
struct CouponRow {
    #[tabled(rename = "CODE")]
    code: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "VALUE")]
    value: String,
    #[tabled(rename = "ACTIVE")]
    active: String,
    #[tabled(rename = "USED")]
    used: u32,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn parse_decimal(s: &str, what: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim())
        .map_err(|_| BillingError::InvalidArgument(format!("{what} '{s}' is not a number")))
}

fn format_money(symbol: &str, value: Decimal) -> String {
    format!("{symbol}{:.2}", round_money(value))
}

/// Parse item input like "Design work:3:150" or "Support:1:80:2.5:hourly"
fn parse_item_input(input: &str) -> Result<InvoiceItem> {
    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() < 3 || parts.len() > 5 {
        return Err(BillingError::InvalidItemFormat(input.to_string()));
    }

    let description = parts[0].trim();
    let quantity: u32 = parts[1]
        .trim()
        .parse()
        .map_err(|_| BillingError::InvalidItemFormat(input.to_string()))?;
    let unit_price = parse_decimal(parts[2], "price")?;

    let extra_hours = match parts.get(3).map(|s| s.trim()) {
        None | Some("") | Some("-") => None,
        Some(raw) => Some(parse_decimal(raw, "extra hours")?),
    };

    let kind = match parts.get(4).map(|s| s.trim()) {
        None | Some("") => ItemKind::default(),
        Some(raw) => ItemKind::parse(raw)
            .ok_or_else(|| BillingError::InvalidItemFormat(input.to_string()))?,
    };

    let mut item = InvoiceItem::new(description, kind, quantity, unit_price);
    item.extra_hours = extra_hours;
    Ok(item)
}

/// Resolve an invoice reference to its position in the stored collection.
/// Accepts either a 1-based index from 'list' (newest first) or the number.
fn resolve_invoice(invoices: &[Invoice], reference: &str) -> Result<usize> {
    if let Ok(idx) = reference.parse::<usize>() {
        if idx == 0 || idx > invoices.len() {
            return Err(BillingError::InvalidInvoiceIndex(reference.to_string()));
        }
        // 'list' shows newest first, 1-indexed
        return Ok(invoices.len() - idx);
    }

    invoices
        .iter()
        .position(|i| i.invoice_number.eq_ignore_ascii_case(reference))
        .ok_or_else(|| BillingError::InvoiceNotFound(reference.to_string()))
}

fn find_customer<'a>(customers: &'a [Customer], reference: &str) -> Result<&'a Customer> {
    if let Ok(id) = Uuid::from_str(reference) {
        if let Some(c) = customers.iter().find(|c| c.id == id) {
            return Ok(c);
        }
    }
    customers
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(reference))
        .ok_or_else(|| BillingError::CustomerNotFound(reference.to_string()))
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: PathBuf) -> Result<()> {
    let store = Store::init(cfg_dir)?;

    println!("Initialized quickbill config at: {}", store.dir().display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your company details:  $EDITOR {}/settings.toml",
        store.dir().display()
    );
    println!("  2. Add customers:              quickbill add-customer \"Acme Corp\" --email billing@acme.com");
    println!();
    println!("Then create your first invoice:");
    println!("  quickbill new --customer \"Acme Corp\" --item \"Consulting:8:150\"");

    Ok(())
}

/// Show settings summary and the upcoming numbers (preview only; nothing is
/// consumed until an invoice is actually saved).
fn cmd_status(store: &Store) -> Result<()> {
    let settings = store.load_settings()?;
    let invoices = store.load_invoices()?;
    let customers = store.load_customers()?;
    let coupons = store.load_coupons()?;

    println!("quickbill status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", store.dir().display());
    println!("Company:          {}", settings.name);
    println!("Default currency: {}", settings.default_currency);
    println!("Customers:        {}", customers.len());
    println!("Coupons:          {}", coupons.len());
    println!("Invoices:         {}", invoices.len());
    println!(
        "Next invoice:     {}",
        numbering::next_invoice_number(&settings)
    );
    println!(
        "Next project:     {}",
        numbering::next_project_number(&settings)
    );

    if !invoices.is_empty() {
        println!();
        println!("Recent invoices:");
        for inv in invoices.iter().rev().take(5) {
            let totals = compute_totals(inv);
            println!(
                "  {} - {} - {}",
                inv.invoice_number,
                inv.client_name,
                format_money(inv.currency.symbol(), totals.total)
            );
        }
    }

    Ok(())
}

/// Create and save a new invoice
#[allow(clippy::too_many_arguments)]
fn cmd_new(
    store: &Store,
    customer_ref: &str,
    items_input: &[String],
    tax: bool,
    tax_rate: Option<String>,
    coupon_code: Option<String>,
    due_days: u32,
    po: Option<String>,
    notes: Option<String>,
    recurring: Option<String>,
) -> Result<()> {
    if items_input.is_empty() {
        return Err(BillingError::NoItems);
    }

    let settings = store.load_settings()?;
    let customers = store.load_customers()?;
    let customer = find_customer(&customers, customer_ref)?.clone();

    let items = items_input
        .iter()
        .map(|input| parse_item_input(input))
        .collect::<Result<Vec<_>>>()?;

    let tax_rate = match tax_rate {
        Some(raw) => parse_decimal(&raw, "tax rate")?,
        None => settings.default_tax_rate,
    };

    let recurring_interval = match recurring.as_deref() {
        None => None,
        Some("monthly") => Some(RecurringInterval::Monthly),
        Some("quarterly") => Some(RecurringInterval::Quarterly),
        Some("yearly") => Some(RecurringInterval::Yearly),
        Some(other) => {
            return Err(BillingError::InvalidArgument(format!(
                "unknown recurring interval '{other}'. Use monthly, quarterly or yearly."
            )))
        }
    };

    let date = today();
    let due_date = date
        .checked_add_signed(Duration::days(due_days as i64))
        .unwrap_or(date);

    let mut draft = Invoice {
        id: Uuid::new_v4(),
        invoice_number: String::new(),
        project_number: String::new(),
        date,
        due_date,
        client_name: customer.name.clone(),
        client_email: customer.email.clone(),
        client_phone: customer.phone.clone(),
        client_address: customer.address.clone(),
        items,
        currency: settings.default_currency,
        tax_enabled: tax,
        tax_rate,
        discount_code: None,
        discount_amount: Decimal::ZERO,
        notes: notes.unwrap_or_default(),
        po_number: po.unwrap_or_default(),
        bank_details: settings.bank_details.clone(),
        payment_status: PaymentStatus::Pending,
        amount_paid: Decimal::ZERO,
        is_recurring: recurring_interval.is_some(),
        recurring_interval,
        signature: settings.signature.clone(),
        attachments: Vec::new(),
        created_at: date,
        updated_at: date,
    };

    // Validate before any counter is consumed; an invalid draft must not
    // burn a number or leave partial state behind.
    draft.validate()?;

    if let Some(code) = coupon_code {
        let coupons = store.load_coupons()?;
        coupon::apply_to_invoice(&mut draft, &coupons, &code)?;
    }

    draft.invoice_number = store.reserve_invoice_number()?;
    draft.project_number = store.reserve_project_number()?;
    store.upsert_invoice(&draft)?;

    let totals = compute_totals(&draft);
    println!("Created {}", draft.invoice_number);
    println!("  Client:  {}", draft.client_name);
    if let Some(code) = &draft.discount_code {
        println!(
            "  Coupon:  {} (-{})",
            code,
            format_money(draft.currency.symbol(), draft.discount_amount)
        );
    }
    println!(
        "  Total:   {}",
        format_money(draft.currency.symbol(), totals.total)
    );
    println!("  Due:     {}", draft.due_date);

    Ok(())
}

/// List saved invoices, newest first
fn cmd_list(store: &Store, limit: Option<usize>) -> Result<()> {
    let invoices = store.load_invoices()?;

    if invoices.is_empty() {
        println!("No invoices yet. Create one with 'quickbill new'.");
        return Ok(());
    }

    let shown: Vec<(usize, &Invoice)> = invoices
        .iter()
        .rev()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .collect();

    let rows: Vec<InvoiceRow> = shown
        .iter()
        .map(|(idx, inv)| {
            let totals = compute_totals(inv);
            InvoiceRow {
                index: idx + 1,
                number: inv.invoice_number.clone(),
                date: inv.date.to_string(),
                client: inv.client_name.clone(),
                total: format_money(inv.currency.symbol(), totals.total),
                paid: format_money(inv.currency.symbol(), inv.amount_paid),
                status: inv.payment_status.to_string(),
            }
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();
    println!("Total: {} invoices", invoices.len());
    println!("Use the index with show/set-paid/mark-paid/convert/render (e.g., 'quickbill show 1')");

    Ok(())
}

/// Show one invoice in detail
fn cmd_show(store: &Store, reference: &str) -> Result<()> {
    let invoices = store.load_invoices()?;
    let settings = store.load_settings()?;
    let idx = resolve_invoice(&invoices, reference)?;
    let inv = &invoices[idx];
    let symbol = inv.currency.symbol();
    let totals = compute_totals(inv);

    println!("{}  ({})", inv.invoice_number, inv.project_number);
    println!("{}", "-".repeat(50));
    println!("Client:   {}", inv.client_name);
    if !inv.client_email.is_empty() {
        println!("Email:    {}", inv.client_email);
    }
    println!("Date:     {}   Due: {}", inv.date, inv.due_date);
    if !inv.po_number.is_empty() {
        println!("PO:       {}", inv.po_number);
    }
    println!();

    for (i, item) in inv.items.iter().enumerate() {
        let extra = item
            .extra_hours
            .map(|h| format!(" (+{h} extra hrs)"))
            .unwrap_or_default();
        println!(
            "  {}. {} [{}] {} x {}{}  =  {}",
            i + 1,
            item.description,
            item.kind.as_str(),
            item.quantity,
            format_money(symbol, item.unit_price),
            extra,
            format_money(symbol, invoice::line_total(item)),
        );
    }

    println!();
    println!("Subtotal:  {}", format_money(symbol, totals.subtotal));
    if inv.tax_enabled {
        println!(
            "Tax ({}%):  {}",
            inv.tax_rate.normalize(),
            format_money(symbol, totals.tax)
        );
    }
    if let Some(code) = &inv.discount_code {
        println!(
            "Discount:  -{}  ({})",
            format_money(symbol, inv.discount_amount),
            code
        );
    }
    println!("Total:     {}", format_money(symbol, totals.total));
    println!(
        "Paid:      {}  [{}]",
        format_money(symbol, inv.amount_paid),
        inv.payment_status
    );
    println!("Balance:   {}", format_money(symbol, totals.remaining));

    println!();
    println!("Payment info:");
    for line in build_payment_info(inv, &settings).lines() {
        println!("  {line}");
    }

    Ok(())
}

/// Delete an invoice
fn cmd_delete(store: &Store, reference: &str) -> Result<()> {
    let invoices = store.load_invoices()?;
    let idx = resolve_invoice(&invoices, reference)?;
    let number = invoices[idx].invoice_number.clone();
    store.delete_invoice(invoices[idx].id)?;
    println!("Deleted {number}");
    Ok(())
}

/// List customers
fn cmd_customers(store: &Store) -> Result<()> {
    let customers = store.load_customers()?;

    if customers.is_empty() {
        println!("No customers yet. Add one with 'quickbill add-customer'.");
        return Ok(());
    }

    let rows: Vec<CustomerRow> = customers
        .iter()
        .map(|c| CustomerRow {
            name: c.name.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            company: c.company.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

fn cmd_add_customer(
    store: &Store,
    name: String,
    email: String,
    phone: String,
    address: String,
    company: Option<String>,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BillingError::MissingClientName);
    }

    let customer = Customer {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        email,
        phone,
        address,
        company,
        created_at: today(),
    };
    store.upsert_customer(&customer)?;

    println!("Added customer '{}'", customer.name);
    Ok(())
}

fn cmd_delete_customer(store: &Store, reference: &str) -> Result<()> {
    let customers = store.load_customers()?;
    let customer = find_customer(&customers, reference)?;
    let name = customer.name.clone();
    store.delete_customer(customer.id)?;
    println!("Removed customer '{name}'");
    Ok(())
}

/// List coupons
fn cmd_coupons(store: &Store) -> Result<()> {
    let coupons = store.load_coupons()?;

    if coupons.is_empty() {
        println!("No coupons yet. Create one with 'quickbill create-coupon'.");
        return Ok(());
    }

    let rows: Vec<CouponRow> = coupons
        .iter()
        .map(|c| CouponRow {
            code: c.code.clone(),
            kind: match c.discount_kind {
                DiscountKind::Percentage => "percentage".to_string(),
                DiscountKind::Fixed => "fixed".to_string(),
            },
            value: match c.discount_kind {
                DiscountKind::Percentage => format!("{}%", c.discount_value.normalize()),
                DiscountKind::Fixed => c.discount_value.normalize().to_string(),
            },
            active: if c.is_active { "yes" } else { "no" }.to_string(),
            used: c.usage_count,
            description: c.description.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

fn cmd_create_coupon(
    store: &Store,
    code: &str,
    kind: &str,
    value: &str,
    description: Option<String>,
) -> Result<()> {
    let kind = DiscountKind::parse(kind).ok_or_else(|| {
        BillingError::InvalidArgument(format!(
            "unknown discount kind '{kind}'. Use 'percentage' or 'fixed'."
        ))
    })?;
    let value = parse_decimal(value, "discount value")?;

    // Re-load right before the insert: the TOML store has no uniqueness
    // constraint, so the duplicate check and the write stay adjacent.
    let mut coupons = store.load_coupons()?;
    let coupon = coupon::create(&coupons, code, kind, value, description, today())?;
    let created_code = coupon.code.clone();
    coupons.push(coupon);
    store.save_coupons(&coupons)?;

    println!("Created coupon {created_code}");
    Ok(())
}

fn cmd_toggle_coupon(store: &Store, code: &str) -> Result<()> {
    let mut coupons = store.load_coupons()?;
    let coupon = coupons
        .iter_mut()
        .find(|c| c.code.eq_ignore_ascii_case(code))
        .ok_or_else(|| BillingError::CouponNotFound(code.to_string()))?;

    coupon::toggle_active(coupon);
    let state = if coupon.is_active { "active" } else { "inactive" };
    let coupon_code = coupon.code.clone();
    store.save_coupons(&coupons)?;

    println!("Coupon {coupon_code} is now {state}");
    Ok(())
}

fn cmd_delete_coupon(store: &Store, code: &str) -> Result<()> {
    let coupons = store.load_coupons()?;
    let coupon = coupon::find_by_code(&coupons, code)
        .ok_or_else(|| BillingError::CouponNotFound(code.to_string()))?;
    let deleted = coupon.code.clone();
    store.delete_coupon(coupon.id)?;
    println!("Deleted coupon {deleted}");
    Ok(())
}

fn cmd_redeem_coupon(store: &Store, code: &str) -> Result<()> {
    let mut coupons = store.load_coupons()?;
    let replacement = coupon::redeem(&mut coupons, code, today())?;
    store.save_coupons(&coupons)?;

    println!(
        "Redeemed {}. Replacement code: {}",
        code.to_uppercase(),
        replacement.code
    );
    Ok(())
}

fn cmd_apply_coupon(store: &Store, reference: &str, code: &str) -> Result<()> {
    let mut invoices = store.load_invoices()?;
    let coupons = store.load_coupons()?;
    let idx = resolve_invoice(&invoices, reference)?;

    let discount = coupon::apply_to_invoice(&mut invoices[idx], &coupons, code)?;
    invoices[idx].updated_at = today();
    let inv = invoices[idx].clone();
    store.save_invoices(&invoices)?;

    let totals = compute_totals(&inv);
    println!(
        "Applied {} to {}: -{} (new total {})",
        inv.discount_code.as_deref().unwrap_or(code),
        inv.invoice_number,
        format_money(inv.currency.symbol(), discount),
        format_money(inv.currency.symbol(), totals.total)
    );
    Ok(())
}

fn cmd_remove_coupon(store: &Store, reference: &str) -> Result<()> {
    let mut invoices = store.load_invoices()?;
    let idx = resolve_invoice(&invoices, reference)?;

    coupon::remove_from_invoice(&mut invoices[idx]);
    invoices[idx].updated_at = today();
    let number = invoices[idx].invoice_number.clone();
    store.save_invoices(&invoices)?;

    println!("Removed coupon from {number}");
    Ok(())
}

fn cmd_set_paid(store: &Store, reference: &str, amount: &str) -> Result<()> {
    let amount = parse_decimal(amount, "amount")?;
    let mut invoices = store.load_invoices()?;
    let idx = resolve_invoice(&invoices, reference)?;

    invoices[idx].set_amount_paid(amount)?;
    invoices[idx].updated_at = today();
    let inv = invoices[idx].clone();
    store.save_invoices(&invoices)?;

    let totals = compute_totals(&inv);
    println!(
        "Recorded {} on {} ({}, balance {})",
        format_money(inv.currency.symbol(), amount),
        inv.invoice_number,
        inv.payment_status,
        format_money(inv.currency.symbol(), totals.remaining)
    );
    Ok(())
}

fn cmd_set_status(store: &Store, reference: &str, status: &str) -> Result<()> {
    let status = PaymentStatus::parse(status).ok_or_else(|| {
        BillingError::InvalidArgument(format!(
            "unknown status '{status}'. Use pending, partial, paid or overdue."
        ))
    })?;

    let mut invoices = store.load_invoices()?;
    let idx = resolve_invoice(&invoices, reference)?;

    // Direct user intent; no derivation here.
    invoices[idx].payment_status = status;
    invoices[idx].updated_at = today();
    let number = invoices[idx].invoice_number.clone();
    store.save_invoices(&invoices)?;

    println!("Set {number} to {status}");
    Ok(())
}

fn cmd_mark_paid(store: &Store, reference: &str) -> Result<()> {
    let mut invoices = store.load_invoices()?;
    let idx = resolve_invoice(&invoices, reference)?;

    invoices[idx].mark_as_paid();
    invoices[idx].updated_at = today();
    let inv = invoices[idx].clone();
    store.save_invoices(&invoices)?;

    println!(
        "Marked {} as paid ({})",
        inv.invoice_number,
        format_money(inv.currency.symbol(), inv.amount_paid)
    );
    Ok(())
}

fn cmd_convert(store: &Store, reference: &str, to: &str) -> Result<()> {
    let to = Currency::parse(to).ok_or_else(|| BillingError::UnknownCurrency(to.to_string()))?;

    let mut invoices = store.load_invoices()?;
    let idx = resolve_invoice(&invoices, reference)?;
    let from = invoices[idx].currency;

    if from == to {
        println!("{} is already in {to}", invoices[idx].invoice_number);
        return Ok(());
    }

    let mut provider = RateProvider::new();
    let (rate, source) = provider.rate(from, to);

    currency::convert_invoice(&mut invoices[idx], to, rate);
    invoices[idx].updated_at = today();
    let inv = invoices[idx].clone();
    store.save_invoices(&invoices)?;

    let totals = compute_totals(&inv);
    println!(
        "Converted {} from {from} to {to} at rate {rate}",
        inv.invoice_number
    );
    if source == RateSource::Fallback {
        println!("Note: live rates were unavailable; an approximate static rate was used.");
    }
    println!(
        "  New total: {}",
        format_money(inv.currency.symbol(), totals.total)
    );
    Ok(())
}

fn cmd_render(store: &Store, reference: &str, output: Option<PathBuf>, open: bool) -> Result<()> {
    let invoices = store.load_invoices()?;
    let settings = store.load_settings()?;
    let idx = resolve_invoice(&invoices, reference)?;
    let inv = &invoices[idx];

    let pdf_path = match output {
        Some(path) => path,
        None => {
            let output_dir = store.output_dir();
            std::fs::create_dir_all(&output_dir)?;
            output_dir.join(format!("{}.pdf", inv.invoice_number))
        }
    };

    let data = build_render_data(inv, &settings);
    render_invoice_pdf(&data, &pdf_path)?;

    println!("Rendered {}", inv.invoice_number);
    println!("  Saved: {}", pdf_path.display());

    if open {
        open_path(&pdf_path)?;
    }

    Ok(())
}

fn open_path(pdf_path: &PathBuf) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(pdf_path)
            .spawn()
            .map_err(BillingError::Io)?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(pdf_path)
            .spawn()
            .map_err(BillingError::Io)?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", pdf_path.to_str().unwrap_or("")])
            .spawn()
            .map_err(BillingError::Io)?;
    }
    Ok(())
}
