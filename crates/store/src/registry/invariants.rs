#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use rustc_hash::FxHashSet;

use super::Registry;
use crate::filter::{Blacklist, Filter, Query};
use crate::handle::PartitionHandle;
use crate::proxy::{Proxy, ProxyAttr, ProxyType};

fn proxy(port: u16, kind: ProxyType) -> Proxy {
	Proxy::new("127.0.0.1", port, kind)
}

fn generation(base: u16) -> Vec<Proxy> {
	(base..base + 64).map(|port| proxy(port, ProxyType::Http)).collect()
}

/// Invariant: Handles are unique and never reused.
///
/// Every created handle must name exactly one, initially empty, partition.
pub(crate) fn inv_handles_are_unique() {
	let registry = Registry::<Proxy>::new();
	let handles: Vec<_> = (0..256).map(|_| registry.create_partition()).collect();

	let distinct: FxHashSet<_> = handles.iter().copied().collect();
	assert_eq!(distinct.len(), handles.len(), "handles must be distinct");
	assert_eq!(registry.partition_count(), handles.len());
	for handle in handles {
		assert_eq!(registry.partition_len(handle), Some(0));
	}
}

#[cfg_attr(test, test)]
pub(crate) fn test_handles_are_unique() {
	inv_handles_are_unique()
}

/// Invariant: A colliding handle aborts creation instead of overwriting.
pub(crate) fn inv_handle_collision_is_fatal() {
	let registry = Registry::<Proxy>::new();
	let handle = PartitionHandle::generate();
	registry.insert_partition(handle);
	registry.replace(handle, [proxy(1, ProxyType::Http)]);

	let result =
		std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| registry.insert_partition(handle)));
	assert!(result.is_err(), "reissuing a handle must panic");
	assert_eq!(
		registry.partition_len(handle),
		Some(1),
		"existing partition must survive the collision"
	);
}

#[cfg_attr(test, test)]
pub(crate) fn test_handle_collision_is_fatal() {
	inv_handle_collision_is_fatal()
}

/// Invariant: A partition holds no two equal records.
pub(crate) fn inv_duplicates_collapse() {
	let registry = Registry::new();
	let handle = registry.create_partition();
	let p = proxy(80, ProxyType::Http);

	registry.replace(handle, [p.clone(), p.clone()]);
	assert_eq!(registry.partition_len(handle), Some(1));
	assert_eq!(registry.sample(Query::any()), Some(p));
}

#[cfg_attr(test, test)]
pub(crate) fn test_duplicates_collapse() {
	inv_duplicates_collapse()
}

/// Invariant: `replace` is observed all-or-nothing.
///
/// While one thread flips a partition between two disjoint generations, a
/// reader must only ever see one complete generation.
pub(crate) fn inv_replace_is_all_or_nothing() {
	let registry = Registry::new();
	let handle = registry.create_partition();
	let old: FxHashSet<_> = generation(0).into_iter().collect();
	let new: FxHashSet<_> = generation(1000).into_iter().collect();
	registry.replace(handle, old.iter().cloned());

	let done = AtomicBool::new(false);
	std::thread::scope(|s| {
		s.spawn(|| {
			for round in 0..500 {
				let next = if round % 2 == 0 { &new } else { &old };
				registry.replace(handle, next.iter().cloned());
			}
			done.store(true, Ordering::Release);
		});

		s.spawn(|| {
			while !done.load(Ordering::Acquire) {
				let seen = registry.snapshot(handle).expect("partition exists");
				assert!(
					*seen == old || *seen == new,
					"reader observed a mixed partition of {} records",
					seen.len()
				);

				let drawn = registry.sample(Query::any()).expect("partition never empty");
				assert!(old.contains(&drawn) || new.contains(&drawn));
			}
		});
	});
}

#[cfg_attr(test, test)]
pub(crate) fn test_replace_is_all_or_nothing() {
	inv_replace_is_all_or_nothing()
}

/// Invariant: Removal touches only the named partition.
pub(crate) fn inv_remove_is_partition_local() {
	let registry = Registry::new();
	let a = registry.create_partition();
	let b = registry.create_partition();
	let p = proxy(3128, ProxyType::Https);

	registry.replace(a, [p.clone()]);
	registry.replace(b, [p.clone()]);
	registry.remove(a, &p);

	assert_eq!(registry.partition_len(a), Some(0));
	assert_eq!(registry.partition_len(b), Some(1));
	assert_eq!(registry.sample(Query::any()), Some(p));
}

#[cfg_attr(test, test)]
pub(crate) fn test_remove_is_partition_local() {
	inv_remove_is_partition_local()
}

/// Invariant: Sampling never returns a record the query rejects.
pub(crate) fn inv_sample_respects_query() {
	let registry = Registry::new();
	let a = registry.create_partition();
	let b = registry.create_partition();
	registry.replace(
		a,
		[
			proxy(1, ProxyType::Http),
			proxy(2, ProxyType::Socks4),
			proxy(3, ProxyType::Http).anonymous(true),
		],
	);
	registry.replace(b, [proxy(4, ProxyType::Https), proxy(5, ProxyType::Http)]);

	let filter = Filter::new().allow(ProxyAttr::Type, ["http"]);
	let blacklist: Blacklist<_> = [proxy(5, ProxyType::Http)].into_iter().collect();
	let query = Query::filtered(&filter).with_blacklist(&blacklist);

	for _ in 0..200 {
		let drawn = registry.sample(query).expect("two candidates remain");
		assert!(filter.accepts(&drawn), "drew {drawn} outside the filter");
		assert!(!blacklist.contains(&drawn), "drew blacklisted {drawn}");
	}
}

#[cfg_attr(test, test)]
pub(crate) fn test_sample_respects_query() {
	inv_sample_respects_query()
}
