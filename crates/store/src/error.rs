//! Error types for filter construction.

use thiserror::Error;

use crate::record::AttrKind;

/// Errors raised while validating a filter specification.
///
/// Sampling itself never fails: an empty result is `None`, and unknown
/// partition handles are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
	/// The specification names an attribute the record type does not expose.
	#[error("unknown filter attribute {name:?} (expected one of: {known})")]
	UnknownAttribute {
		/// Name as it appeared in the specification.
		name: String,
		/// Comma-separated list of accepted attribute names.
		known: String,
	},

	/// A value does not have the kind its attribute holds, so it could never
	/// match (`anonymous = "true"`).
	#[error("filter attribute {attr:?} expects {expected} values, found {found} value {value:?}")]
	ValueType {
		/// Attribute name.
		attr: &'static str,
		expected: AttrKind,
		found: AttrKind,
		/// The offending value as written.
		value: String,
	},
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
