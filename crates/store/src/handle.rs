use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for one registry partition.
///
/// Backed by a random v4 UUID; the registry never issues the same handle
/// twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionHandle(Uuid);

impl PartitionHandle {
	/// Draws a fresh random handle.
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}
}

impl fmt::Display for PartitionHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}
