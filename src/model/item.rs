use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// Identifies a line item within one invoice. Ids are never reused within a session.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// The editable fields of a `LineItem`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    Description,
    Date,
    Reference,
    Amount,
}

serde_plain::derive_display_from_serialize!(ItemField);
serde_plain::derive_fromstr_from_deserialize!(ItemField);

/// One row of the invoice table.
///
/// The amount is kept exactly as the user typed it. Use `amount()` to get the normalized value.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LineItem {
    id: ItemId,
    description: String,
    date: String,
    reference: String,
    amount_text: String,
}

impl LineItem {
    pub(crate) fn new(id: ItemId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            date: String::new(),
            reference: String::new(),
            amount_text: String::from("0"),
        }
    }

    pub(crate) fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The raw amount text as entered.
    pub fn amount_text(&self) -> &str {
        &self.amount_text
    }

    /// The amount, with unparsable text counted as zero.
    pub fn amount(&self) -> Amount {
        Amount::coerce(&self.amount_text)
    }

    /// Replaces one field with `value`.
    pub(crate) fn set(&mut self, field: ItemField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ItemField::Description => self.description = value,
            ItemField::Date => self.date = value,
            ItemField::Reference => self.reference = value,
            ItemField::Amount => self.amount_text = value,
        }
    }

    /// Returns the value of one field as text.
    pub fn get(&self, field: ItemField) -> &str {
        match field {
            ItemField::Description => &self.description,
            ItemField::Date => &self.date,
            ItemField::Reference => &self.reference,
            ItemField::Amount => &self.amount_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_new_item_is_zero() {
        let item = LineItem::new(ItemId::new(1), "Rent");
        assert!(item.amount().is_zero());
        assert_eq!(item.date(), "");
        assert_eq!(item.reference(), "");
    }

    #[test]
    fn test_set_each_field() {
        let mut item = LineItem::new(ItemId::new(1), "Rent");
        item.set(ItemField::Description, "Chargeback");
        item.set(ItemField::Date, "2026-10-16");
        item.set(ItemField::Reference, "REF-9");
        item.set(ItemField::Amount, "$1,000.50");
        assert_eq!(item.get(ItemField::Description), "Chargeback");
        assert_eq!(item.get(ItemField::Date), "2026-10-16");
        assert_eq!(item.get(ItemField::Reference), "REF-9");
        assert_eq!(item.amount_text(), "$1,000.50");
        assert_eq!(item.amount().value(), Decimal::from_str("1000.50").unwrap());
    }

    #[test]
    fn test_invalid_amount_text_is_kept_but_counts_as_zero() {
        let mut item = LineItem::new(ItemId::new(1), "Rent");
        item.set(ItemField::Amount, "abc");
        assert_eq!(item.amount_text(), "abc");
        assert!(item.amount().is_zero());
    }

    #[test]
    fn test_item_field_from_str() {
        assert_eq!(ItemField::from_str("amount").unwrap(), ItemField::Amount);
        assert_eq!(
            ItemField::from_str("description").unwrap(),
            ItemField::Description
        );
        assert!(ItemField::from_str("price").is_err());
        assert_eq!(ItemField::Reference.to_string(), "reference");
    }
}
