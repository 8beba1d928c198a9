//! Index Module
//!
//! Path arithmetic mapping storage identifiers to entry files.

mod path_builder;
mod path_resolver;

pub use path_builder::{build, build_with};
pub use path_resolver::PathResolver;
