use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Config directory not found at {0}. Run 'quickbill init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Failed to parse store file {path}: {source}")]
    StoreParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write store file {path}: {reason}")]
    StoreWrite { path: PathBuf, reason: String },

    #[error("Customer '{0}' not found")]
    CustomerNotFound(String),

    #[error("Invoice '{0}' not found")]
    InvoiceNotFound(String),

    #[error("Invalid invoice reference '{0}'. Use 'quickbill list' to see available invoices.")]
    InvalidInvoiceIndex(String),

    #[error("Client name is required")]
    MissingClientName,

    #[error("An invoice needs at least one line item")]
    NoItems,

    #[error("Invalid line item: {0}")]
    InvalidItem(String),

    #[error("Invalid item format '{0}'. Expected 'description:quantity:price[:extra-hours[:kind]]'")]
    InvalidItemFormat(String),

    #[error("Invalid or inactive coupon code '{0}'")]
    InvalidCoupon(String),

    #[error("A coupon with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Coupon '{0}' not found")]
    CouponNotFound(String),

    #[error("Unknown currency '{0}'. Supported: USD, EUR, INR, GBP")]
    UnknownCurrency(String),

    #[error("Payment amount must not be negative")]
    InvalidPaymentAmount,

    #[error("Invalid value: {0}")]
    InvalidArgument(String),

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillingError>;
