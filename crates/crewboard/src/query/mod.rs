//! Keyed, de-duplicating query cache for backend reads.
//!
//! A [`QueryCache`] is an explicit value handed to whoever needs it; clones share state.
//! Reads are identified by a [`QueryKey`], writes invalidate by [`KeyFilter`], and mounted
//! views hold a [`QuerySubscription`] that polls and reacts to invalidation.

mod cache;
mod key;
mod subscription;

pub use cache::{QueryCache, QueryOptions, QueryState};
pub use key::{KeyFilter, KeyValue, QueryKey};
pub use subscription::QuerySubscription;
