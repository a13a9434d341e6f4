pub mod coupon;
pub mod currency;
pub mod error;
pub mod invoice;
pub mod numbering;
pub mod pdf;
pub mod store;

pub use currency::{Currency, RateProvider};
pub use error::{BillingError, Result};
pub use invoice::{compute_totals, Invoice, InvoiceItem, PaymentStatus};
pub use store::{CompanySettings, Customer, Store};
