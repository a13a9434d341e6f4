mod customer;
mod settings;

pub use customer::Customer;
pub use settings::CompanySettings;

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::coupon::Coupon;
use crate::error::{BillingError, Result};
use crate::invoice::Invoice;
use crate::numbering;

/// Default config directory (XDG-style, falling back to ~/.quickbill).
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "quickbill") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        BillingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".quickbill"))
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct InvoicesFile {
    #[serde(default)]
    invoices: Vec<Invoice>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CustomersFile {
    #[serde(default)]
    customers: Vec<Customer>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CouponsFile {
    #[serde(default)]
    coupons: Vec<Coupon>,
}

/// TOML-file persistence over the four record kinds: the settings singleton
/// and the invoice, customer and coupon collections. Passed by value into
/// commands rather than living in a global.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open an existing config directory.
    pub fn open(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            return Err(BillingError::ConfigNotFound(dir));
        }
        Ok(Self { dir })
    }

    /// Create a fresh config directory with template files.
    pub fn init(dir: PathBuf) -> Result<Self> {
        if dir.exists() {
            return Err(BillingError::AlreadyInitialized(dir));
        }
        fs::create_dir_all(&dir)?;
        fs::create_dir_all(dir.join("output"))?;
        fs::write(dir.join("settings.toml"), SETTINGS_TEMPLATE)?;
        fs::write(dir.join("customers.toml"), CUSTOMERS_TEMPLATE)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where rendered PDFs land.
    pub fn output_dir(&self) -> PathBuf {
        self.dir.join("output")
    }

    fn read_file<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| BillingError::StoreParse { path, source: e })
    }

    fn write_file<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let content = toml::to_string_pretty(value).map_err(|e| BillingError::StoreWrite {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, content)?;
        Ok(())
    }

    // Settings singleton

    /// Load the settings, materializing the defaults on first read.
    pub fn load_settings(&self) -> Result<CompanySettings> {
        let path = self.dir.join("settings.toml");
        if !path.exists() {
            let defaults = CompanySettings::default();
            self.save_settings(&defaults)?;
            return Ok(defaults);
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| BillingError::StoreParse { path, source: e })
    }

    pub fn save_settings(&self, settings: &CompanySettings) -> Result<()> {
        self.write_file("settings.toml", settings)
    }

    /// Format, increment and persist the invoice counter in one call, so two
    /// drafts can never be handed the same number.
    pub fn reserve_invoice_number(&self) -> Result<String> {
        let mut settings = self.load_settings()?;
        let number = numbering::next_invoice_number(&settings);
        numbering::increment_invoice_number(&mut settings);
        self.save_settings(&settings)?;
        Ok(number)
    }

    /// Same reserve-and-increment contract for project numbers.
    pub fn reserve_project_number(&self) -> Result<String> {
        let mut settings = self.load_settings()?;
        let number = numbering::next_project_number(&settings);
        numbering::increment_project_number(&mut settings);
        self.save_settings(&settings)?;
        Ok(number)
    }

    // Invoices

    pub fn load_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self.read_file::<InvoicesFile>("invoices.toml")?.invoices)
    }

    pub fn save_invoices(&self, invoices: &[Invoice]) -> Result<()> {
        self.write_file(
            "invoices.toml",
            &InvoicesFile {
                invoices: invoices.to_vec(),
            },
        )
    }

    pub fn get_invoice(&self, id: Uuid) -> Result<Option<Invoice>> {
        Ok(self.load_invoices()?.into_iter().find(|i| i.id == id))
    }

    /// Insert or replace by id. Last write wins.
    pub fn upsert_invoice(&self, invoice: &Invoice) -> Result<()> {
        let mut invoices = self.load_invoices()?;
        match invoices.iter_mut().find(|i| i.id == invoice.id) {
            Some(slot) => *slot = invoice.clone(),
            None => invoices.push(invoice.clone()),
        }
        self.save_invoices(&invoices)
    }

    pub fn delete_invoice(&self, id: Uuid) -> Result<()> {
        let mut invoices = self.load_invoices()?;
        invoices.retain(|i| i.id != id);
        self.save_invoices(&invoices)
    }

    // Customers

    pub fn load_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.read_file::<CustomersFile>("customers.toml")?.customers)
    }

    pub fn save_customers(&self, customers: &[Customer]) -> Result<()> {
        self.write_file(
            "customers.toml",
            &CustomersFile {
                customers: customers.to_vec(),
            },
        )
    }

    pub fn upsert_customer(&self, customer: &Customer) -> Result<()> {
        let mut customers = self.load_customers()?;
        match customers.iter_mut().find(|c| c.id == customer.id) {
            Some(slot) => *slot = customer.clone(),
            None => customers.push(customer.clone()),
        }
        self.save_customers(&customers)
    }

    pub fn delete_customer(&self, id: Uuid) -> Result<()> {
        let mut customers = self.load_customers()?;
        customers.retain(|c| c.id != id);
        self.save_customers(&customers)
    }

    // Coupons

    pub fn load_coupons(&self) -> Result<Vec<Coupon>> {
        Ok(self.read_file::<CouponsFile>("coupons.toml")?.coupons)
    }

    pub fn save_coupons(&self, coupons: &[Coupon]) -> Result<()> {
        self.write_file(
            "coupons.toml",
            &CouponsFile {
                coupons: coupons.to_vec(),
            },
        )
    }

    pub fn delete_coupon(&self, id: Uuid) -> Result<()> {
        let mut coupons = self.load_coupons()?;
        coupons.retain(|c| c.id != id);
        self.save_coupons(&coupons)
    }
}

/// Template content for settings.toml
const SETTINGS_TEMPLATE: &str = r#"# Company settings. Edit to match your business.

name = "Your Company Name"
email = "billing@yourcompany.com"
phone = ""
address = ""
bank_details = ""
# tax_id = "12-3456789"           # optional
# upi_id = "yourbusiness@upi"     # optional, enables the payment QR payload
# signature = "signature.png"     # optional, path to a signature image

default_currency = "USD"
default_tax_rate = 18             # percentage applied when tax is enabled

invoice_prefix = "INV"
next_invoice_number = 1
project_prefix = "PRJ"
next_project_number = 1
"#;

/// Template content for customers.toml
const CUSTOMERS_TEMPLATE: &str = r#"# Customers. Add entries here or with 'quickbill add-customer'.
#
# [[customers]]
# id = "4a6f1c1e-0000-0000-0000-000000000000"
# name = "Example Client Inc."
# email = "jane@example.com"
# phone = "+1-555-123-4567"
# address = "456 Client Avenue, Los Angeles CA"
# created_at = "2026-01-01"
"#;
