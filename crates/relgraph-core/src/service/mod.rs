//! Composition query service and its resolution cache.

mod cache;
mod query;

pub use cache::{CacheKey, CacheStats, CacheStatsSnapshot, ResolutionCache};
pub use query::{EntityRef, RelationService};
