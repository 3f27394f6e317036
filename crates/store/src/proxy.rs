//! Proxy records as produced by the scraping feeds.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::record::{AttrKind, AttrRef, Attribute, Record};

/// Protocol spoken by a proxy.
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	PartialOrd,
	Ord,
	Serialize,
	Deserialize,
	Display,
	EnumString,
	AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProxyType {
	Http,
	Https,
	Socks4,
	Socks5,
}

/// A single proxy endpoint.
///
/// Equality covers every field, so the same `host:port` reported by two feeds
/// with different metadata is two distinct records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proxy {
	pub host: String,
	pub port: u16,
	/// ISO country code, lower-case (`"us"`).
	#[serde(default)]
	pub code: Option<String>,
	/// Country name, lower-case (`"united states"`).
	#[serde(default)]
	pub country: Option<String>,
	#[serde(default)]
	pub anonymous: bool,
	#[serde(rename = "type")]
	pub kind: ProxyType,
	/// Name of the feed that reported this proxy.
	#[serde(default)]
	pub source: String,
}

impl Proxy {
	pub fn new(host: impl Into<String>, port: u16, kind: ProxyType) -> Self {
		Self {
			host: host.into(),
			port,
			code: None,
			country: None,
			anonymous: false,
			kind,
			source: String::new(),
		}
	}

	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());
		self
	}

	pub fn with_country(mut self, country: impl Into<String>) -> Self {
		self.country = Some(country.into());
		self
	}

	pub fn anonymous(mut self, anonymous: bool) -> Self {
		self.anonymous = anonymous;
		self
	}

	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source = source.into();
		self
	}
}

impl fmt::Display for Proxy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.host, self.port)
	}
}

/// Filterable proxy attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProxyAttr {
	Country,
	Anonymous,
	Type,
}

impl Attribute for ProxyAttr {
	const ALL: &'static [Self] = &[Self::Country, Self::Anonymous, Self::Type];

	fn name(self) -> &'static str {
		match self {
			Self::Country => "country",
			Self::Anonymous => "anonymous",
			Self::Type => "type",
		}
	}

	fn kind(self) -> AttrKind {
		match self {
			Self::Anonymous => AttrKind::Bool,
			Self::Country | Self::Type => AttrKind::Text,
		}
	}
}

impl Record for Proxy {
	type Attr = ProxyAttr;

	fn attribute(&self, attr: ProxyAttr) -> Option<AttrRef<'_>> {
		match attr {
			ProxyAttr::Country => self.country.as_deref().map(AttrRef::Text),
			ProxyAttr::Anonymous => Some(AttrRef::Bool(self.anonymous)),
			ProxyAttr::Type => Some(AttrRef::Text(self.kind.as_ref())),
		}
	}
}
