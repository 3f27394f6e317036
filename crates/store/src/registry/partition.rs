//! Single partition cell.
//!
//! # Role
//!
//! Holds one partition's record set as an atomically published snapshot.
//! Readers load the current `Arc` without locking; writers serialize on a
//! per-partition mutex and publish a complete replacement set.
//!
//! # Invariants
//!
//! - A reader observes either the set before a write or the set after it,
//!   never an intermediate (see `invariants::test_replace_is_all_or_nothing`).

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::record::Record;

pub(crate) struct Partition<R: Record> {
	records: ArcSwap<FxHashSet<R>>,
	/// Serializes `replace` and `remove` so a removal never republishes a
	/// set that a concurrent replace already discarded.
	write: Mutex<()>,
}

impl<R: Record> Partition<R> {
	pub(crate) fn new() -> Self {
		Self {
			records: ArcSwap::from_pointee(FxHashSet::default()),
			write: Mutex::new(()),
		}
	}

	/// Returns the current record set.
	#[inline]
	pub(crate) fn load(&self) -> Arc<FxHashSet<R>> {
		self.records.load_full()
	}

	pub(crate) fn len(&self) -> usize {
		self.records.load().len()
	}

	/// Publishes `records` as the whole partition content.
	pub(crate) fn replace(&self, records: FxHashSet<R>) {
		let next = Arc::new(records);
		let _guard = self.write.lock();
		self.records.store(next);
	}

	/// Removes `record`, returning whether it was present.
	///
	/// Absent records leave the published snapshot untouched.
	pub(crate) fn remove(&self, record: &R) -> bool {
		let _guard = self.write.lock();
		let current = self.records.load_full();
		if !current.contains(record) {
			return false;
		}

		let mut next = FxHashSet::clone(&current);
		next.remove(record);
		self.records.store(Arc::new(next));
		true
	}
}
