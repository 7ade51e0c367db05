//! Types that represent the invoice data model, such as `Invoice`, `LineItem` and `Customer`.
mod amount;
mod customer;
mod invoice;
mod item;
mod logo;
mod totals;

pub use amount::{format_currency, format_currency_text, Amount, AmountError};
pub use customer::{Customer, CustomerId, Customers, Template};
pub use invoice::{Invoice, DATE_FORMAT};
pub use item::{ItemField, ItemId, LineItem};
pub use logo::{Logo, LogoImage};
pub use totals::{compute_totals, split_gst, ItemTotals, Totals};

#[cfg(test)]
pub(crate) use customer::test_customers;
