#![allow(unused_crate_dependencies)]
//! Multi-threaded feed/consumer workloads against a shared registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use proxyscrape_store::{
	Blacklist, Filter, PartitionHandle, Proxy, ProxyAttr, ProxyType, Query, Registry,
};

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

/// Proxies reported by feed `feed` on refresh `round`.
fn batch(feed: u16, round: u16) -> Vec<Proxy> {
	(0..32)
		.map(|i| {
			let kind = if i % 2 == 0 { ProxyType::Http } else { ProxyType::Socks5 };
			Proxy::new(format!("10.{feed}.{round}.{i}"), 8000 + i, kind)
				.anonymous(i % 3 == 0)
				.with_source(format!("feed-{feed}"))
		})
		.collect()
}

#[test]
fn feeds_and_consumers_share_registry() {
	init_tracing();
	let registry = Arc::new(Registry::new());
	let feeds: Vec<PartitionHandle> = (0..4).map(|_| registry.create_partition()).collect();
	let drawn = AtomicUsize::new(0);
	let filter = Filter::new()
		.allow(ProxyAttr::Type, ["http"])
		.allow(ProxyAttr::Anonymous, [true]);

	thread::scope(|s| {
		for (feed, &handle) in feeds.iter().enumerate() {
			let registry = Arc::clone(&registry);
			s.spawn(move || {
				for round in 0..100 {
					registry.replace(handle, batch(feed as u16, round));
				}
			});
		}

		for _ in 0..4 {
			let registry = Arc::clone(&registry);
			let feeds = &feeds;
			let filter = &filter;
			let drawn = &drawn;
			s.spawn(move || {
				let mut blacklist = Blacklist::default();
				for i in 0..500 {
					let query = Query::filtered(filter).with_blacklist(&blacklist);
					let Some(proxy) = registry.sample(query) else {
						continue;
					};
					assert_eq!(proxy.kind, ProxyType::Http);
					assert!(proxy.anonymous);
					assert!(!blacklist.contains(&proxy));
					drawn.fetch_add(1, Ordering::Relaxed);

					// Report every other proxy as dead to its feed.
					if i % 2 == 0 {
						let feed: usize = proxy.source["feed-".len()..].parse().unwrap();
						registry.remove(feeds[feed], &proxy);
					}
					blacklist.insert(proxy);
				}
			});
		}
	});

	assert!(drawn.load(Ordering::Relaxed) > 0);
	for (feed, &handle) in feeds.iter().enumerate() {
		let last: std::collections::HashSet<_> = batch(feed as u16, 99).into_iter().collect();
		let remaining = registry.snapshot(handle).unwrap();
		assert!(
			remaining.iter().all(|p| last.contains(p)),
			"feed {feed} kept records from an older refresh"
		);
	}
}

#[test]
fn concurrent_partition_creation_loses_nothing() {
	init_tracing();
	let registry = Registry::<Proxy>::new();

	let handles: Vec<PartitionHandle> = thread::scope(|s| {
		let workers: Vec<_> = (0..8)
			.map(|_| s.spawn(|| (0..64).map(|_| registry.create_partition()).collect::<Vec<_>>()))
			.collect();
		workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
	});

	assert_eq!(handles.len(), 8 * 64);
	assert_eq!(registry.partition_count(), handles.len());
	for handle in handles {
		assert!(registry.contains_partition(handle));
	}
}

#[test]
fn removal_races_with_replace_without_resurrection() {
	let registry = Registry::new();
	let handle = registry.create_partition();
	let stale = batch(0, 0);
	let fresh = batch(0, 1);
	registry.replace(handle, stale.clone());

	thread::scope(|s| {
		s.spawn(|| {
			for proxy in &stale {
				registry.remove(handle, proxy);
			}
		});
		s.spawn(|| registry.replace(handle, fresh.clone()));
	});

	// Whatever the interleaving, the last replace wins and removals of stale
	// records never bring the old generation back.
	let remaining = registry.snapshot(handle).unwrap();
	assert_eq!(remaining.len(), fresh.len());
	assert!(fresh.iter().all(|p| remaining.contains(p)));
}
