//! Record and attribute traits.
//!
//! A [`Record`] is a value-comparable item whose filterable fields are reached
//! through a fixed accessor table ([`Attribute::ALL`]) instead of by-name
//! reflection. Filters are validated against that table when they are built,
//! both for the attribute name and for the [`AttrKind`] of each value.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Key naming one filterable field of a record type.
pub trait Attribute: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
	/// Every attribute the record type exposes.
	const ALL: &'static [Self];

	/// Canonical name used by filter specifications.
	fn name(self) -> &'static str;

	/// Kind of value the attribute holds.
	fn kind(self) -> AttrKind;

	/// Resolves a canonical name back to its attribute.
	fn from_name(name: &str) -> Option<Self> {
		Self::ALL.iter().copied().find(|attr| attr.name() == name)
	}
}

/// Item stored in a registry partition.
///
/// Identity is value identity: two records comparing equal collapse into one
/// set entry and are removed together.
pub trait Record: Clone + Eq + Hash + Send + Sync + 'static {
	/// Attribute table for this record type.
	type Attr: Attribute;

	/// Reads one attribute. `None` means the record carries no value for it,
	/// which fails any constraint placed on that attribute.
	fn attribute(&self, attr: Self::Attr) -> Option<AttrRef<'_>>;
}

/// Value kind of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AttrKind {
	Bool,
	Text,
}

/// Borrowed view of a record attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrRef<'a> {
	Bool(bool),
	Text(&'a str),
}

/// Owned acceptable value inside a filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
	Bool(bool),
	Text(Box<str>),
}

impl AttrValue {
	pub fn kind(&self) -> AttrKind {
		match self {
			Self::Bool(_) => AttrKind::Bool,
			Self::Text(_) => AttrKind::Text,
		}
	}

	/// Returns true when `attr` holds this exact value.
	///
	/// Text comparison is exact; `"HTTP"` does not match `"http"`.
	pub fn matches(&self, attr: AttrRef<'_>) -> bool {
		match (self, attr) {
			(Self::Bool(a), AttrRef::Bool(b)) => *a == b,
			(Self::Text(a), AttrRef::Text(b)) => &**a == b,
			_ => false,
		}
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		Self::Text(value.into())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		Self::Text(value.into_boxed_str())
	}
}

impl From<AttrRef<'_>> for AttrValue {
	fn from(value: AttrRef<'_>) -> Self {
		match value {
			AttrRef::Bool(b) => Self::Bool(b),
			AttrRef::Text(s) => Self::from(s),
		}
	}
}

impl fmt::Display for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(b) => write!(f, "{b}"),
			Self::Text(s) => f.write_str(s),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_matches_same_kind_only() {
		assert!(AttrValue::from("http").matches(AttrRef::Text("http")));
		assert!(!AttrValue::from("http").matches(AttrRef::Text("HTTP")));
		assert!(AttrValue::from(true).matches(AttrRef::Bool(true)));
		assert!(!AttrValue::from(true).matches(AttrRef::Bool(false)));
		assert!(!AttrValue::from("true").matches(AttrRef::Bool(true)));
	}

	#[test]
	fn test_value_kind() {
		assert_eq!(AttrValue::from(false).kind(), AttrKind::Bool);
		assert_eq!(AttrValue::from("socks4").kind(), AttrKind::Text);
		assert_eq!(AttrKind::Text.to_string(), "text");
	}

	#[test]
	fn test_untagged_serde() {
		let values: Vec<AttrValue> = serde_json::from_str(r#"[true, "socks5"]"#).unwrap();
		assert_eq!(values, vec![AttrValue::Bool(true), AttrValue::from("socks5")]);
	}
}
