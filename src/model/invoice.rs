//! The invoice being edited.
//!
//! `Invoice` is the single store for a session. Every change goes through one of the named
//! operations below, and everything else (totals, subject line, GST) is derived on read, so the
//! derived values can never drift from the items.

use crate::error::{Error, ErrorType, Result};
use crate::model::{
    compute_totals, Customer, CustomerId, Customers, ItemField, ItemId, LineItem, Logo, Template,
    Totals,
};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::path::Path;
use tracing::{debug, trace};

/// The date format used for the invoice date and for seeded item dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct Invoice {
    customers: Customers,
    /// Index into `customers`; always valid.
    selected: usize,
    items: Vec<LineItem>,
    last_id: ItemId,
    date: NaiveDate,
    reference: String,
    logo: Option<Logo>,
}

impl Invoice {
    /// Starts a new invoice for the first configured customer. `now` fixes the invoice date and
    /// reference for the life of the invoice.
    pub fn new<Tz: TimeZone>(customers: Customers, now: DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let logo = customers
            .default_customer()
            .logo()
            .map(|p| Logo::Asset(p.to_path_buf()));
        Self {
            customers,
            selected: 0,
            items: Vec::new(),
            last_id: ItemId::default(),
            date: now.date_naive(),
            reference: now.format("INV-%Y%m%d-%H%M%S").to_string(),
            logo,
        }
    }

    pub fn customers(&self) -> &Customers {
        &self.customers
    }

    /// The selected customer.
    pub fn customer(&self) -> &Customer {
        self.customers
            .iter()
            .nth(self.selected)
            .unwrap_or_else(|| self.customers.default_customer())
    }

    pub fn template(&self) -> Template<'_> {
        self.customer().template()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn logo(&self) -> Option<&Logo> {
        self.logo.as_ref()
    }

    /// Appends an item with the selected customer's default description and a zero amount.
    pub fn add_item(&mut self) -> ItemId {
        let description = self.customer().default_description().to_string();
        let id = self.fresh_id();
        self.push(LineItem::new(id, description))
    }

    /// Removes the item with `id`. Returns `false` if there was no such item.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id() != id);
        let removed = self.items.len() != before;
        trace!("remove_item {id}: removed={removed}");
        removed
    }

    /// Replaces one field of the item with `id`. Returns `false` if there was no such item.
    ///
    /// Amount text is stored as typed; it is normalized when totals are computed.
    pub fn update_item(&mut self, id: ItemId, field: ItemField, value: impl Into<String>) -> bool {
        match self.items.iter_mut().find(|i| i.id() == id) {
            Some(item) => {
                item.set(field, value);
                trace!("update_item {id}: {field}={:?}", item.get(field));
                true
            }
            None => {
                trace!("update_item {id}: no such item");
                false
            }
        }
    }

    /// Appends one item per file, dated today, as a stub to be filled in. Only the file names are
    /// used, never the contents.
    pub fn bulk_add_from_files<I, P>(&mut self, files: I) -> Vec<ItemId>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.bulk_add_from_files_on(files, Local::now().date_naive())
    }

    pub(crate) fn bulk_add_from_files_on<I, P>(&mut self, files: I, date: NaiveDate) -> Vec<ItemId>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let date = date.format(DATE_FORMAT).to_string();
        files
            .into_iter()
            .map(|file| {
                let file = file.as_ref();
                let name = file
                    .file_name()
                    .unwrap_or(file.as_os_str())
                    .to_string_lossy();
                let item =
                    LineItem::new(self.fresh_id(), format!("Receipt: {name}")).with_date(&date);
                self.push(item)
            })
            .collect()
    }

    /// Selects the customer with `id`.
    ///
    /// Unknown ids are rejected with `ErrorType::NotFound` and nothing changes. Selecting a
    /// different customer resets the logo to that customer's default, discarding any upload.
    /// Items are never touched.
    pub fn select_customer(&mut self, id: CustomerId) -> Result<&Customer> {
        let ix = self
            .customers
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| Error::msg(ErrorType::NotFound, format!("No customer with id {id}")))?;
        if ix != self.selected {
            self.selected = ix;
            self.logo = self
                .customer()
                .logo()
                .map(|p| Logo::Asset(p.to_path_buf()));
            debug!(
                "Selected customer {} '{}'",
                id,
                self.customer().display_name()
            );
        }
        Ok(self.customer())
    }

    /// Overrides the logo until the customer changes.
    pub fn set_logo(&mut self, logo: Logo) {
        self.logo = Some(logo);
    }

    pub fn clear_logo(&mut self) {
        self.logo = None;
    }

    /// Derived totals for the current items and customer.
    pub fn totals(&self) -> Totals {
        compute_totals(&self.items, self.customer().gst_exempt())
    }

    /// The PDF file name: `Invoice_<name line 1>_<unix millis>.pdf` with whitespace runs in the
    /// name replaced by `_`.
    pub fn pdf_file_name<Tz: TimeZone>(&self, at: DateTime<Tz>) -> String {
        let name = underscore_whitespace(self.customer().name_line_1());
        format!("Invoice_{name}_{}.pdf", at.timestamp_millis())
    }

    fn fresh_id(&mut self) -> ItemId {
        self.last_id = self.last_id.next();
        self.last_id
    }

    fn push(&mut self, item: LineItem) -> ItemId {
        let id = item.id();
        trace!("add_item {id}: {:?}", item.description());
        self.items.push(item);
        id
    }
}

/// Replaces every run of whitespace, including leading and trailing runs, with one `_`.
fn underscore_whitespace(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::customer::test_customers;
    use crate::model::LogoImage;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::path::PathBuf;
    use std::str::FromStr;

    const QUEST: CustomerId = CustomerId::new(1);
    const MEEKHUN: CustomerId = CustomerId::new(2);

    fn invoice() -> Invoice {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 5).unwrap();
        Invoice::new(test_customers(), now)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn upload() -> Logo {
        Logo::Upload(LogoImage::new("mine.png", b"png".to_vec()))
    }

    #[test]
    fn test_new_invoice_defaults() {
        let invoice = invoice();
        assert_eq!(invoice.customer().id(), QUEST);
        assert!(invoice.items().is_empty());
        assert_eq!(invoice.date().format(DATE_FORMAT).to_string(), "2026-10-16");
        assert_eq!(invoice.reference(), "INV-20261016-093005");
        assert_eq!(
            invoice.logo(),
            Some(&Logo::Asset(PathBuf::from("pad-logo.png")))
        );
    }

    #[test]
    fn test_add_item_uses_customer_default_description() {
        let mut invoice = invoice();
        let a = invoice.add_item();
        invoice.select_customer(MEEKHUN).unwrap();
        let b = invoice.add_item();
        assert_ne!(a, b);
        assert_eq!(invoice.item(a).unwrap().description(), "Chargeback");
        assert_eq!(invoice.item(b).unwrap().description(), "Rent");
        assert!(invoice.item(b).unwrap().amount().is_zero());
    }

    #[test]
    fn test_add_twice_remove_first() {
        let mut invoice = invoice();
        let first = invoice.add_item();
        let second = invoice.add_item();
        assert!(invoice.remove_item(first));
        assert_eq!(invoice.items().len(), 1);
        assert_eq!(invoice.items()[0].id(), second);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut invoice = invoice();
        invoice.add_item();
        assert!(!invoice.remove_item(ItemId::new(42)));
        assert_eq!(invoice.items().len(), 1);
    }

    #[test]
    fn test_ids_are_not_reused_after_remove() {
        let mut invoice = invoice();
        let a = invoice.add_item();
        invoice.remove_item(a);
        let b = invoice.add_item();
        assert_ne!(a, b);
    }

    #[test]
    fn test_update_item_amount_invalid_contributes_zero() {
        let mut invoice = invoice();
        let a = invoice.add_item();
        let b = invoice.add_item();
        assert!(invoice.update_item(a, ItemField::Amount, "10"));
        assert!(invoice.update_item(b, ItemField::Amount, "abc"));
        let totals = invoice.totals();
        assert_eq!(totals.gross.value(), dec("10"));
        assert!(totals.item(b).unwrap().gross.is_zero());
    }

    #[test]
    fn test_update_unknown_item_is_noop() {
        let mut invoice = invoice();
        invoice.add_item();
        let before = invoice.items().to_vec();
        assert!(!invoice.update_item(ItemId::new(99), ItemField::Description, "x"));
        assert_eq!(invoice.items(), before.as_slice());
    }

    #[test]
    fn test_insertion_order_is_display_order() {
        let mut invoice = invoice();
        let ids: Vec<ItemId> = (0..4).map(|_| invoice.add_item()).collect();
        invoice.remove_item(ids[1]);
        let seen: Vec<ItemId> = invoice.items().iter().map(|i| i.id()).collect();
        assert_eq!(seen, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn test_bulk_add_from_files() {
        let mut invoice = invoice();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let ids = invoice
            .bulk_add_from_files_on(["/tmp/scans/receipt-01.pdf", "receipt-02.jpg"], date);
        assert_eq!(ids.len(), 2);
        let first = invoice.item(ids[0]).unwrap();
        assert_eq!(first.description(), "Receipt: receipt-01.pdf");
        assert_eq!(first.date(), "2026-10-16");
        assert!(first.amount().is_zero());
        assert_eq!(
            invoice.item(ids[1]).unwrap().description(),
            "Receipt: receipt-02.jpg"
        );
    }

    #[test]
    fn test_bulk_add_uses_today() {
        let mut invoice = invoice();
        let ids = invoice.bulk_add_from_files(["a.pdf"]);
        let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
        assert_eq!(invoice.item(ids[0]).unwrap().date(), today);
    }

    #[test]
    fn test_select_unknown_customer_is_not_found() {
        let mut invoice = invoice();
        invoice.set_logo(upload());
        let err = invoice.select_customer(CustomerId::new(9)).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
        assert_eq!(invoice.customer().id(), QUEST);
        assert!(invoice.logo().unwrap().is_upload());
    }

    #[test]
    fn test_switching_customer_never_mutates_items() {
        let mut invoice = invoice();
        let a = invoice.add_item();
        invoice.update_item(a, ItemField::Amount, "143.48");
        let before = invoice.items().to_vec();

        invoice.select_customer(MEEKHUN).unwrap();
        assert_eq!(invoice.items(), before.as_slice());
        assert_eq!(invoice.template().subject_line, "Rent");
        assert!(!invoice.template().gst_applies);
        assert!(invoice.logo().is_none());

        invoice.select_customer(QUEST).unwrap();
        assert_eq!(invoice.items(), before.as_slice());
        assert_eq!(
            invoice.template().subject_line,
            "Chargeback from PAD Thai Food"
        );
    }

    #[test]
    fn test_gst_follows_customer() {
        let mut invoice = invoice();
        let a = invoice.add_item();
        invoice.update_item(a, ItemField::Amount, "143.48");

        let t = invoice.totals();
        assert_eq!(t.gross.value(), dec("143.48"));
        assert_eq!(t.item(a).unwrap().gst.rounded(), dec("13.04"));
        assert_eq!(t.item(a).unwrap().net.rounded(), dec("130.44"));

        invoice.select_customer(MEEKHUN).unwrap();
        let t = invoice.totals();
        assert!(t.item(a).unwrap().gst.is_zero());
        assert_eq!(t.item(a).unwrap().net.value(), dec("143.48"));
    }

    #[test]
    fn test_uploaded_logo_survives_item_edits() {
        let mut invoice = invoice();
        invoice.set_logo(upload());
        let a = invoice.add_item();
        invoice.update_item(a, ItemField::Amount, "5");
        invoice.bulk_add_from_files(["x.pdf"]);
        invoice.remove_item(a);
        assert_eq!(invoice.logo(), Some(&upload()));
    }

    #[test]
    fn test_uploaded_logo_reset_on_customer_change() {
        let mut invoice = invoice();
        invoice.set_logo(upload());
        invoice.select_customer(MEEKHUN).unwrap();
        assert!(invoice.logo().is_none());

        invoice.set_logo(upload());
        invoice.select_customer(QUEST).unwrap();
        assert_eq!(
            invoice.logo(),
            Some(&Logo::Asset(PathBuf::from("pad-logo.png")))
        );
    }

    #[test]
    fn test_reselecting_same_customer_keeps_upload() {
        let mut invoice = invoice();
        invoice.set_logo(upload());
        invoice.select_customer(QUEST).unwrap();
        assert!(invoice.logo().unwrap().is_upload());
    }

    #[test]
    fn test_underscore_whitespace() {
        assert_eq!(underscore_whitespace("Quest Frankston"), "Quest_Frankston");
        assert_eq!(underscore_whitespace(" A \t B  "), "_A_B_");
        assert_eq!(underscore_whitespace("Solo"), "Solo");
        assert_eq!(underscore_whitespace(""), "");
    }

    #[test]
    fn test_pdf_file_name() {
        let mut invoice = invoice();
        let at = Utc.timestamp_millis_opt(1_760_000_000_123).unwrap();
        assert_eq!(
            invoice.pdf_file_name(at),
            "Invoice_Quest_Frankston_1760000000123.pdf"
        );
        invoice.select_customer(MEEKHUN).unwrap();
        assert_eq!(
            invoice.pdf_file_name(at),
            "Invoice_MEEKHUN_PTY_LTD_1760000000123.pdf"
        );
    }
}
