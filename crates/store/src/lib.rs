//! In-memory proxy store.
//!
//! Records (proxies) live in independently managed partitions, one per
//! producing feed, inside a [`Registry`]. Consumers draw a random record from
//! the union of all partitions, constrained by a [`Filter`] and a
//! [`Blacklist`], and prune records they find unusable.
//!
//! ```
//! use proxyscrape_store::{Filter, Proxy, ProxyAttr, ProxyType, Query, Registry};
//!
//! let registry = Registry::new();
//! let feed = registry.create_partition();
//! registry.replace(feed, [
//! 	Proxy::new("10.0.0.1", 8080, ProxyType::Http),
//! 	Proxy::new("10.0.0.2", 1080, ProxyType::Socks5),
//! ]);
//!
//! let filter = Filter::new().allow(ProxyAttr::Type, ["http"]);
//! let proxy = registry.sample(Query::filtered(&filter)).unwrap();
//! assert_eq!(proxy.port, 8080);
//! ```

/// Filter validation errors.
pub mod error;
/// Filter specifications, blacklists and queries.
pub mod filter;
/// Partition handles.
pub mod handle;
/// Proxy record type.
pub mod proxy;
/// Record and attribute traits.
pub mod record;
/// The partitioned registry.
pub mod registry;

pub use error::{FilterError, Result};
pub use filter::{Blacklist, Filter, Query};
pub use handle::PartitionHandle;
pub use proxy::{Proxy, ProxyAttr, ProxyType};
pub use record::{AttrKind, AttrRef, AttrValue, Attribute, Record};
pub use registry::Registry;
