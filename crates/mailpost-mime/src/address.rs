//! Address types and header rendering.
//!
//! Addresses are not validated; whatever the caller supplies is rendered.

use crate::encoding::encode_rfc2047;
use std::fmt;

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: String,
}

impl Address {
    /// Creates a new address without a display name.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    /// Creates a new address with a display name.
    #[must_use]
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: address.into(),
        }
    }

    /// Renders the mailbox as `"Display Name" <addr>`.
    ///
    /// Printable ASCII names are written as a quoted string with `"` and `\`
    /// escaped. Other names become RFC 2047 encoded-words. Without a name
    /// only `<addr>` is written.
    #[must_use]
    pub fn to_header(&self) -> String {
        let angle = format!("<{}>", self.address);
        let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) else {
            return angle;
        };

        if name.bytes().all(|b| matches!(b, b' '..=b'~' | b'\t')) {
            let mut quoted = String::with_capacity(name.len() + 2);
            quoted.push('"');
            for ch in name.chars() {
                if ch == '"' || ch == '\\' {
                    quoted.push('\\');
                }
                quoted.push(ch);
            }
            quoted.push('"');
            format!("{quoted} {angle}")
        } else {
            format!("{} {angle}", encode_rfc2047(name, "utf-8"))
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header())
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Ordered list of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddressList(pub Vec<Address>);

impl AddressList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an address.
    pub fn push(&mut self, address: Address) {
        self.0.push(address);
    }

    /// Returns true if the list has no addresses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the bare mailbox addresses, in order.
    #[must_use]
    pub fn addresses(&self) -> Vec<&str> {
        self.0.iter().map(|a| a.address.as_str()).collect()
    }

    /// Renders the list as one comma-joined header value.
    ///
    /// With `include_name` each entry is rendered by [`Address::to_header`],
    /// otherwise only bare addresses are joined.
    #[must_use]
    pub fn render(&self, include_name: bool) -> String {
        if include_name {
            self.0
                .iter()
                .map(Address::to_header)
                .collect::<Vec<_>>()
                .join(",")
        } else {
            self.addresses().join(",")
        }
    }
}

impl From<Vec<Address>> for AddressList {
    fn from(addresses: Vec<Address>) -> Self {
        Self(addresses)
    }
}

impl FromIterator<Address> for AddressList {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
