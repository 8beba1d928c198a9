//! Path Resolver
//!
//! Resolves storage identifiers to `<cache_dir>/<namespace>/<identifier>.<ext>`.

use std::path::PathBuf;

use crate::config::CacheConfig;
use crate::index::path_builder;

// == Path Resolver ==
/// Pure path arithmetic over a namespace's static configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    cache_dir: String,
    namespace: String,
    extension: String,
}

impl PathResolver {
    /// Creates a resolver for the given namespace configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cache_dir: config.cache_dir.to_string_lossy().into_owned(),
            namespace: config.namespace.clone(),
            extension: config.extension.trim_start_matches('.').to_string(),
        }
    }

    /// Returns the configured extension, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the basename of the entry file for `identifier`.
    pub fn file_name(&self, identifier: &str) -> String {
        if self.extension.is_empty() {
            identifier.to_string()
        } else {
            format!("{identifier}.{}", self.extension)
        }
    }

    /// Returns the identifier for an entry file name, if it carries this
    /// resolver's extension.
    pub fn identifier_of<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let stem = if self.extension.is_empty() {
            file_name
        } else {
            file_name
                .strip_suffix(self.extension.as_str())?
                .strip_suffix('.')?
        };
        (!stem.is_empty()).then_some(stem)
    }

    /// Returns the cache root directory.
    pub fn root_dir(&self) -> PathBuf {
        PathBuf::from(path_builder::build(&self.cache_dir, &[], ""))
    }

    /// Returns the namespace directory.
    pub fn namespace_dir(&self) -> PathBuf {
        PathBuf::from(path_builder::build(&self.cache_dir, &[], &self.namespace))
    }

    /// Resolves the absolute entry path for `identifier`.
    pub fn resolve(&self, identifier: &str) -> PathBuf {
        PathBuf::from(path_builder::build(
            &self.cache_dir,
            &[&self.namespace],
            &self.file_name(identifier),
        ))
    }
}
