//! Candidate collection and uniform selection.

use std::sync::Arc;

use rand::Rng;
use rand::seq::IteratorRandom;
use rustc_hash::FxHashSet;

use crate::filter::Query;
use crate::record::Record;

/// Admitted records across a set of partition snapshots.
pub(crate) struct Candidates<'a, R: Record> {
	/// Records seen before filtering, counting duplicates across partitions.
	pub(crate) seen: usize,
	/// Value-deduplicated records that passed the query.
	pub(crate) admitted: FxHashSet<&'a R>,
}

impl<'a, R: Record> Candidates<'a, R> {
	/// Unions `snapshots` and keeps the records `query` admits.
	///
	/// A record held by several partitions appears once, so partition
	/// membership never weights the draw.
	pub(crate) fn collect(snapshots: &'a [Arc<FxHashSet<R>>], query: &Query<'_, R>) -> Self {
		let mut seen = 0;
		let mut admitted = FxHashSet::default();
		for snapshot in snapshots {
			seen += snapshot.len();
			admitted.extend(snapshot.iter().filter(|record| query.admits(record)));
		}
		Self { seen, admitted }
	}

	/// Draws one admitted record with equal probability.
	pub(crate) fn pick<G: Rng + ?Sized>(self, rng: &mut G) -> Option<&'a R> {
		self.admitted.into_iter().choose(rng)
	}
}
