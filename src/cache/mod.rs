//! Cache Module
//!
//! Provides the two-tier object cache facade and its namespace registry.

mod registry;
mod stats;
mod store;


// Re-export public types
pub use registry::{Namespace, NamespaceRegistry};
pub use stats::CacheStats;
pub use store::ObjectCache;
