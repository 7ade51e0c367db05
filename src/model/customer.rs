//! Customers and the template choices that hang off them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identifies a configured customer.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CustomerId(u32);

impl CustomerId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for CustomerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A customer that can be billed. Customers are static configuration and are never mutated
/// once loaded.
///
/// Everything that varies by customer on the printed invoice (subject line, GST, the default
/// description for new items, the letterhead logo) is data on this record.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Customer {
    id: CustomerId,
    display_name: String,
    name_line_1: String,
    #[serde(default)]
    name_line_2: String,
    address_line_1: String,
    #[serde(default)]
    address_line_2: String,
    subject_line: String,
    #[serde(default)]
    gst_exempt: bool,
    default_description: String,
    /// Letterhead image shown automatically for this customer. Relative paths are resolved
    /// against the invoice home directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logo: Option<PathBuf>,
}

impl Customer {
    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn name_line_1(&self) -> &str {
        &self.name_line_1
    }

    /// May be empty, in which case it is not rendered.
    pub fn name_line_2(&self) -> &str {
        &self.name_line_2
    }

    pub fn address_line_1(&self) -> &str {
        &self.address_line_1
    }

    pub fn address_line_2(&self) -> &str {
        &self.address_line_2
    }

    pub fn subject_line(&self) -> &str {
        &self.subject_line
    }

    pub fn gst_exempt(&self) -> bool {
        self.gst_exempt
    }

    pub fn default_description(&self) -> &str {
        &self.default_description
    }

    pub fn logo(&self) -> Option<&Path> {
        self.logo.as_deref()
    }

    /// The presentation choices derived from this customer.
    pub fn template(&self) -> Template<'_> {
        Template {
            subject_line: &self.subject_line,
            gst_applies: !self.gst_exempt,
            default_logo: self.logo.as_deref(),
            default_description: &self.default_description,
        }
    }
}

/// The presentation choices for the selected customer, looked up from the customer record.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Template<'a> {
    pub subject_line: &'a str,
    pub gst_applies: bool,
    pub default_logo: Option<&'a Path>,
    pub default_description: &'a str,
}

/// The static, ordered list of customers. It is never empty and ids are unique, including when it
/// is deserialized.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Customer>", into = "Vec<Customer>")]
pub struct Customers(Vec<Customer>);

impl Customers {
    /// Validates and wraps `customers`. The list must be non-empty and ids must be unique.
    pub fn new(customers: Vec<Customer>) -> crate::error::Res<Self> {
        anyhow::ensure!(!customers.is_empty(), "At least one customer is required");
        for (ix, customer) in customers.iter().enumerate() {
            anyhow::ensure!(
                !customers[..ix].iter().any(|c| c.id == customer.id),
                "Duplicate customer id {}",
                customer.id
            );
        }
        Ok(Self(customers))
    }

    /// The default customer is the first one configured.
    pub fn default_customer(&self) -> &Customer {
        // Every constructor goes through `new`, which rejects an empty list.
        &self.0[0]
    }

    pub fn get(&self, id: CustomerId) -> Option<&Customer> {
        self.0.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Customer> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The two customers the tool ships with.
    pub(crate) fn defaults() -> Self {
        Self(default_customers())
    }
}

impl TryFrom<Vec<Customer>> for Customers {
    type Error = anyhow::Error;

    fn try_from(value: Vec<Customer>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Customers> for Vec<Customer> {
    fn from(value: Customers) -> Self {
        value.0
    }
}

fn default_customers() -> Vec<Customer> {
    vec![
        Customer {
            id: CustomerId(1),
            display_name: "Quest Frankston on the Bay".to_string(),
            name_line_1: "Quest Frankston".to_string(),
            name_line_2: "on the Bay".to_string(),
            address_line_1: "435 Nepean Hwy".to_string(),
            address_line_2: "Frankston VIC 3199".to_string(),
            subject_line: "Chargeback from PAD Thai Food".to_string(),
            gst_exempt: false,
            default_description: "Chargeback".to_string(),
            logo: Some(PathBuf::from("pad-logo.png")),
        },
        Customer {
            id: CustomerId(2),
            display_name: "MEEKHUN PTY LTD".to_string(),
            name_line_1: "MEEKHUN PTY LTD".to_string(),
            name_line_2: String::new(),
            address_line_1: "77 Harrison Dr".to_string(),
            address_line_2: "Noble Park VIC 3174".to_string(),
            subject_line: "Rent".to_string(),
            gst_exempt: true,
            default_description: "Rent".to_string(),
            logo: None,
        },
    ]
}

#[cfg(test)]
pub(crate) fn test_customers() -> Customers {
    Customers::defaults()
}
