//! Filter specifications, blacklists and sampling queries.
//!
//! A [`Filter`] maps attributes to the set of values each accepts. A record
//! passes when, for every constrained attribute, it carries a value in that
//! set. Unconstrained attributes are ignored. Names are validated when a
//! filter is built from strings or deserialized, so a typo surfaces as
//! [`FilterError::UnknownAttribute`] rather than an always-empty sample, and a
//! value of the wrong kind as [`FilterError::ValueType`].
//!
//! Blacklists and record sets hash with `rustc_hash`'s Fx hasher, which is not
//! resistant to hash flooding; the scraping feeds are treated as trusted input.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{FilterError, Result};
use crate::record::{AttrValue, Attribute, Record};

/// Records excluded from a sampling call, compared by value.
pub type Blacklist<R> = FxHashSet<R>;

type ValueSet = SmallVec<[AttrValue; 4]>;

/// Attribute-to-acceptable-values mapping.
#[derive(Clone, PartialEq, Eq)]
pub struct Filter<A: Attribute> {
	constraints: FxHashMap<A, ValueSet>,
}

impl<A: Attribute> Default for Filter<A> {
	fn default() -> Self {
		Self {
			constraints: FxHashMap::default(),
		}
	}
}

impl<A: Attribute> Filter<A> {
	/// Creates a filter that accepts every record.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds acceptable values for `attr`, unioned with any already present.
	///
	/// Passing no values still registers the constraint, which then accepts
	/// nothing.
	pub fn allow<I, V>(mut self, attr: A, values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<AttrValue>,
	{
		self.insert(attr, values);
		self
	}

	fn insert<I, V>(&mut self, attr: A, values: I)
	where
		I: IntoIterator<Item = V>,
		V: Into<AttrValue>,
	{
		let set = self.constraints.entry(attr).or_default();
		for value in values {
			let value = value.into();
			if !set.contains(&value) {
				set.push(value);
			}
		}
	}

	/// Builds a filter from attribute names, rejecting names the record type
	/// does not expose and values of the wrong kind for their attribute.
	pub fn from_names<I, N, V>(spec: I) -> Result<Self>
	where
		I: IntoIterator<Item = (N, V)>,
		N: AsRef<str>,
		V: IntoIterator,
		V::Item: Into<AttrValue>,
	{
		let mut filter = Self::new();
		for (name, values) in spec {
			let name = name.as_ref();
			let Some(attr) = A::from_name(name) else {
				return Err(FilterError::UnknownAttribute {
					name: name.to_string(),
					known: A::ALL.iter().map(|a| a.name()).collect::<Vec<_>>().join(", "),
				});
			};
			let values = values
				.into_iter()
				.map(Into::into)
				.map(|value: AttrValue| {
					if value.kind() == attr.kind() {
						Ok(value)
					} else {
						Err(FilterError::ValueType {
							attr: attr.name(),
							expected: attr.kind(),
							found: value.kind(),
							value: value.to_string(),
						})
					}
				})
				.collect::<Result<ValueSet>>()?;
			filter.insert(attr, values);
		}
		Ok(filter)
	}

	/// Returns true when no attribute is constrained.
	pub fn is_empty(&self) -> bool {
		self.constraints.is_empty()
	}

	/// Number of constrained attributes.
	pub fn len(&self) -> usize {
		self.constraints.len()
	}

	/// Acceptable values for `attr`, if constrained.
	pub fn values(&self, attr: A) -> Option<&[AttrValue]> {
		self.constraints.get(&attr).map(|set| set.as_slice())
	}

	/// Returns true when `record` satisfies every constraint.
	pub fn accepts<R>(&self, record: &R) -> bool
	where
		R: Record<Attr = A>,
	{
		self.constraints.iter().all(|(attr, set)| {
			record
				.attribute(*attr)
				.is_some_and(|value| set.iter().any(|allowed| allowed.matches(value)))
		})
	}
}

impl<A: Attribute> fmt::Debug for Filter<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map()
			.entries(self.sorted().into_iter().map(|(attr, set)| (attr.name(), set)))
			.finish()
	}
}

impl<A: Attribute> Filter<A> {
	fn sorted(&self) -> Vec<(A, &ValueSet)> {
		let mut entries: Vec<_> = self.constraints.iter().map(|(a, s)| (*a, s)).collect();
		entries.sort_by_key(|(attr, _)| attr.name());
		entries
	}
}

impl<A: Attribute> Serialize for Filter<A> {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let entries = self.sorted();
		let mut map = serializer.serialize_map(Some(entries.len()))?;
		for (attr, set) in entries {
			map.serialize_entry(attr.name(), set.as_slice())?;
		}
		map.end()
	}
}

/// Either a bare value or a list, so `anonymous = true` and
/// `type = ["http", "https"]` are both accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValues {
	One(AttrValue),
	Many(Vec<AttrValue>),
}

impl IntoIterator for RawValues {
	type Item = AttrValue;
	type IntoIter = std::vec::IntoIter<AttrValue>;

	fn into_iter(self) -> Self::IntoIter {
		match self {
			Self::One(value) => vec![value].into_iter(),
			Self::Many(values) => values.into_iter(),
		}
	}
}

impl<'de, A: Attribute> Deserialize<'de> for Filter<A> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let raw = BTreeMap::<String, RawValues>::deserialize(deserializer)?;
		Self::from_names(raw).map_err(de::Error::custom)
	}
}

/// Criteria for one sampling call.
pub struct Query<'a, R: Record> {
	pub filter: Option<&'a Filter<R::Attr>>,
	pub blacklist: Option<&'a Blacklist<R>>,
}

impl<R: Record> Clone for Query<'_, R> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<R: Record> Copy for Query<'_, R> {}

impl<R: Record> Default for Query<'_, R> {
	fn default() -> Self {
		Self::any()
	}
}

impl<R: Record> fmt::Debug for Query<'_, R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Query")
			.field("filter", &self.filter)
			.field("blacklist", &self.blacklist.map(|b| b.len()))
			.finish()
	}
}

impl<'a, R: Record> Query<'a, R> {
	/// Accepts every record.
	pub const fn any() -> Self {
		Self {
			filter: None,
			blacklist: None,
		}
	}

	pub fn filtered(filter: &'a Filter<R::Attr>) -> Self {
		Self {
			filter: Some(filter),
			blacklist: None,
		}
	}

	pub fn with_filter(mut self, filter: &'a Filter<R::Attr>) -> Self {
		self.filter = Some(filter);
		self
	}

	pub fn with_blacklist(mut self, blacklist: &'a Blacklist<R>) -> Self {
		self.blacklist = Some(blacklist);
		self
	}

	/// Returns true when `record` passes the filter and is not blacklisted.
	pub fn admits(&self, record: &R) -> bool {
		if self.blacklist.is_some_and(|b| b.contains(record)) {
			return false;
		}
		self.filter.is_none_or(|f| f.accepts(record))
	}
}
