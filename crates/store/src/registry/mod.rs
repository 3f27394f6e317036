#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Partitioned record registry.
//!
//! # Purpose
//!
//! A [`Registry`] owns any number of partitions, each filled wholesale by one
//! producer (typically one scraping feed) and drained record by record by
//! consumers that find a record unusable. Consumers draw from the registry as a
//! whole, never from one partition.
//!
//! # Mental Model
//!
//! 1. **Creation:** [`Registry::create_partition`] publishes a new, empty
//!    partition under a fresh [`PartitionHandle`].
//! 2. **Population:** [`Registry::replace`] swaps a partition's whole content.
//!    There is no incremental insert.
//! 3. **Sampling:** [`Registry::sample`] unions every partition snapshot, keeps
//!    the records the [`Query`] admits, and draws one uniformly.
//! 4. **Pruning:** [`Registry::remove`] drops one record from one partition.
//!
//! # Leniency Contract
//!
//! Unknown handles are not errors. `replace` and `remove` on a handle this
//! registry never issued do nothing, and "nothing matched" is `None` rather
//! than an error. Callers that care use [`Registry::contains_partition`].
//!
//! # Concurrency
//!
//! - **Reads:** Wait-free. Both the partition map and each partition's record
//!   set are published through `ArcSwap`.
//! - **Partition creation:** Lock-free CAS retry loop on the partition map.
//! - **Writes:** `replace` and `remove` serialize on a per-partition mutex and
//!   publish a complete new set, so partitions never contend with each other.
//!
//! A sample sees each partition at one point in time, but not all partitions
//! at the same point: a record being removed from partition A while B is
//! replaced may or may not be drawn. Every drawn record was present in some
//! partition snapshot.
//!
//! # Invariants
//!
//! - Handles are unique and never reused.
//!   - Enforced in: [`Registry::insert_partition`] (panics on collision).
//!   - Tested by: [`invariants::test_handles_are_unique`]
//!   - Failure symptom: Two producers overwrite each other's records.
//!
//! - A partition holds no two equal records.
//!   - Enforced in: [`Registry::replace`] (collects into a hash set).
//!   - Tested by: [`invariants::test_duplicates_collapse`]
//!   - Failure symptom: Duplicated records are drawn more often.
//!
//! - `replace` is observed all-or-nothing.
//!   - Enforced in: [`partition::Partition::replace`] (single snapshot store).
//!   - Tested by: [`invariants::test_replace_is_all_or_nothing`]
//!   - Failure symptom: A reader sees a half-cleared partition or a mix of
//!     old and new records.
//!
//! - Removal touches only the named partition.
//!   - Enforced in: [`Registry::remove`].
//!   - Tested by: [`invariants::test_remove_is_partition_local`]
//!   - Failure symptom: A record still held by another feed disappears.
//!
//! - Sampling never returns a record the query rejects.
//!   - Enforced in: [`sample::Candidates::collect`].
//!   - Tested by: [`invariants::test_sample_respects_query`]
//!   - Failure symptom: Consumers receive blacklisted or mismatched records.

mod partition;
mod sample;

#[cfg(any(test, doc))]
pub(crate) mod invariants;


use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use self::partition::Partition;
use self::sample::Candidates;
use crate::filter::Query;
use crate::handle::PartitionHandle;
use crate::record::Record;

type PartitionMap<R> = FxHashMap<PartitionHandle, Arc<Partition<R>>>;

/// In-memory registry of records split into independently managed partitions.
///
/// Cheap to share behind an `Arc`; every operation takes `&self`.
pub struct Registry<R: Record> {
	partitions: ArcSwap<PartitionMap<R>>,
}

impl<R: Record> Default for Registry<R> {
	fn default() -> Self {
		Self {
			partitions: ArcSwap::from_pointee(FxHashMap::default()),
		}
	}
}

impl<R: Record> fmt::Debug for Registry<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry")
			.field("partitions", &self.partition_count())
			.finish()
	}
}

impl<R: Record> Registry<R> {
	/// Creates a registry with no partitions.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty partition and returns its handle.
	pub fn create_partition(&self) -> PartitionHandle {
		let handle = PartitionHandle::generate();
		self.insert_partition(handle);
		debug!(partition = %handle, "created partition");
		handle
	}

	/// Publishes an empty partition under `handle`.
	///
	/// # Panics
	///
	/// Panics if `handle` is already taken. Random v4 handles make this a
	/// broken invariant, not a recoverable condition.
	fn insert_partition(&self, handle: PartitionHandle) {
		let partition = Arc::new(Partition::new());

		loop {
			let old = self.partitions.load_full();
			assert!(
				!old.contains_key(&handle),
				"partition handle collision: {handle} already issued"
			);

			let mut next = PartitionMap::clone(&old);
			next.insert(handle, Arc::clone(&partition));

			let prev = self.partitions.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				return;
			}
			// CAS failed, retry against the map another creator published
		}
	}

	fn partition(&self, handle: PartitionHandle) -> Option<Arc<Partition<R>>> {
		self.partitions.load().get(&handle).cloned()
	}

	/// Draws one record admitted by `query`, uniformly at random.
	///
	/// Returns `None` when the registry holds no records or none pass the
	/// query; callers are expected to hit this routinely.
	pub fn sample(&self, query: Query<'_, R>) -> Option<R> {
		self.sample_with(query, &mut rand::thread_rng())
	}

	/// Like [`Registry::sample`], drawing from the given generator.
	pub fn sample_with<G: Rng + ?Sized>(&self, query: Query<'_, R>, rng: &mut G) -> Option<R> {
		let snapshots = self.snapshots();
		let candidates = Candidates::collect(&snapshots, &query);
		if candidates.seen == 0 {
			trace!(partitions = snapshots.len(), "sample: registry empty");
			return None;
		}

		let (seen, admitted) = (candidates.seen, candidates.admitted.len());
		let picked = candidates.pick(rng).cloned();
		match picked {
			Some(_) => trace!(seen, admitted, "sample: drew record"),
			None => trace!(seen, "sample: no record matched"),
		}
		picked
	}

	/// Removes `record` from the partition named by `handle`.
	///
	/// Unknown handles and absent records are ignored. Equal records held by
	/// other partitions are untouched.
	pub fn remove(&self, handle: PartitionHandle, record: &R) {
		let Some(partition) = self.partition(handle) else {
			debug!(partition = %handle, "remove ignored: unknown partition");
			return;
		};
		if partition.remove(record) {
			debug!(partition = %handle, remaining = partition.len(), "removed record");
		}
	}

	/// Replaces the whole content of the partition named by `handle`.
	///
	/// Duplicates in `records` collapse. An empty iterator empties the
	/// partition. Unknown handles are ignored.
	pub fn replace<I>(&self, handle: PartitionHandle, records: I)
	where
		I: IntoIterator<Item = R>,
	{
		let Some(partition) = self.partition(handle) else {
			debug!(partition = %handle, "replace ignored: unknown partition");
			return;
		};
		let records: FxHashSet<R> = records.into_iter().collect();
		let len = records.len();
		partition.replace(records);
		debug!(partition = %handle, len, "replaced partition");
	}

	/// Empties the partition named by `handle`.
	pub fn clear(&self, handle: PartitionHandle) {
		self.replace(handle, std::iter::empty());
	}

	/// Returns true if `handle` was issued by this registry.
	pub fn contains_partition(&self, handle: PartitionHandle) -> bool {
		self.partitions.load().contains_key(&handle)
	}

	/// Number of records in one partition, or `None` for an unknown handle.
	pub fn partition_len(&self, handle: PartitionHandle) -> Option<usize> {
		self.partition(handle).map(|p| p.len())
	}

	/// Current record set of one partition.
	pub fn snapshot(&self, handle: PartitionHandle) -> Option<Arc<FxHashSet<R>>> {
		self.partition(handle).map(|p| p.load())
	}

	pub fn partition_count(&self) -> usize {
		self.partitions.load().len()
	}

	/// Issued handles, sorted.
	pub fn handles(&self) -> Vec<PartitionHandle> {
		let mut handles: Vec<_> = self.partitions.load().keys().copied().collect();
		handles.sort_unstable();
		handles
	}

	/// Number of distinct records across all partitions.
	pub fn len(&self) -> usize {
		let snapshots = self.snapshots();
		Candidates::collect(&snapshots, &Query::any()).admitted.len()
	}

	/// Returns true if no partition holds a record.
	pub fn is_empty(&self) -> bool {
		self.partitions.load().values().all(|p| p.len() == 0)
	}

	fn snapshots(&self) -> Vec<Arc<FxHashSet<R>>> {
		self.partitions.load().values().map(|p| p.load()).collect()
	}
}
