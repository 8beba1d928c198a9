//! Storage Backend
//!
//! Owns the `<cache_dir>/<namespace>` directory pair and the file primitives
//! used by the codec and the cache facade.

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::index::PathResolver;

/// Permission mode of the cache root and namespace directories
pub const DIR_MODE: u32 = 0o700;

// == Storage Backend ==
/// Filesystem backend for one namespace.
#[derive(Debug, Clone)]
pub struct StorageBackend {
    root_dir: PathBuf,
    namespace_dir: PathBuf,
}

impl StorageBackend {
    /// Creates a backend over the directories known to `resolver`.
    ///
    /// No I/O happens until [`StorageBackend::init`].
    pub fn new(resolver: &PathResolver) -> Self {
        Self {
            root_dir: resolver.root_dir(),
            namespace_dir: resolver.namespace_dir(),
        }
    }

    /// Returns the namespace directory.
    pub fn namespace_dir(&self) -> &Path {
        &self.namespace_dir
    }

    // == Init ==
    /// Ensures the root and namespace directories exist.
    ///
    /// Missing directories are created with [`DIR_MODE`]. Existing directories
    /// with a different mode only produce a warning.
    pub fn init(&self) -> Result<()> {
        ensure_dir(&self.root_dir, "cache storage")?;
        ensure_dir(&self.namespace_dir, "cache namespace")?;
        Ok(())
    }

    // == Exists ==
    /// Returns true if `path` is an existing regular file.
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    // == Delete ==
    /// Removes the file at `path`.
    ///
    /// Returns false without error when there is nothing to remove or the
    /// removal fails.
    pub fn delete(&self, path: &Path) -> bool {
        if !self.exists(path) {
            return false;
        }
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed entry file {}", path.display());
                true
            }
            Err(err) => {
                warn!("Unable to remove entry file {}: {}", path.display(), err);
                false
            }
        }
    }

    // == Touch ==
    /// Updates the timestamps of an existing file.
    ///
    /// `mtime` defaults to now and `atime` defaults to `mtime`. Returns false
    /// when the file does not exist or the update fails.
    pub fn touch(
        &self,
        path: &Path,
        mtime: Option<DateTime<Utc>>,
        atime: Option<DateTime<Utc>>,
    ) -> bool {
        if !self.exists(path) {
            return false;
        }
        let mtime = mtime.unwrap_or_else(Utc::now);
        let atime = atime.unwrap_or(mtime);
        let times = FileTimes::new()
            .set_modified(SystemTime::from(mtime))
            .set_accessed(SystemTime::from(atime));

        match File::options()
            .write(true)
            .open(path)
            .and_then(|file| file.set_times(times))
        {
            Ok(()) => true,
            Err(err) => {
                warn!("Unable to touch entry file {}: {}", path.display(), err);
                false
            }
        }
    }

    // == List ==
    /// Returns the names of all regular files in the namespace directory.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.namespace_dir)
            .map_err(|e| CacheError::storage(&self.namespace_dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::storage(&self.namespace_dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn ensure_dir(dir: &Path, label: &str) -> Result<()> {
    if !dir.is_dir() {
        create_dir(dir).map_err(|e| CacheError::storage(dir, e))?;
        info!("Created {} directory {}", label, dir.display());
    }
    check_mode(dir, label);
    Ok(())
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(dir)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn check_mode(dir: &Path, label: &str) {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(dir) {
        Ok(meta) => {
            let mode = meta.permissions().mode() & 0o777;
            if mode != DIR_MODE {
                warn!(
                    "Fix permissions for {} directory \"{}\". Current permissions: \"{:o}\"; Required permissions: \"{:o}\"",
                    label,
                    dir.display(),
                    mode,
                    DIR_MODE
                );
            }
        }
        Err(err) => warn!("Unable to read permissions of {}: {}", dir.display(), err),
    }
}

#[cfg(not(unix))]
fn check_mode(_dir: &Path, _label: &str) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use chrono::TimeZone;

    fn backend_in(dir: &Path) -> (StorageBackend, PathResolver) {
        let config = CacheConfig::new(dir.join("root"), "ns");
        let resolver = PathResolver::new(&config);
        (StorageBackend::new(&resolver), resolver)
    }

    #[test]
    fn test_init_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let (backend, resolver) = backend_in(tmp.path());

        backend.init().unwrap();
        assert!(resolver.root_dir().is_dir());
        assert!(resolver.namespace_dir().is_dir());

        // Second init is a no-op
        backend.init().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_init_uses_restrictive_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let (backend, resolver) = backend_in(tmp.path());
        backend.init().unwrap();

        let mode = fs::metadata(resolver.namespace_dir())
            .unwrap()
            .permissions()
            .mode();
        // umask can only remove bits
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_init_fails_when_root_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("root"), b"not a dir").unwrap();
        let (backend, _) = backend_in(tmp.path());

        assert!(matches!(backend.init(), Err(CacheError::Storage { .. })));
    }

    #[test]
    fn test_exists_and_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let (backend, resolver) = backend_in(tmp.path());
        backend.init().unwrap();

        let path = resolver.resolve("abc");
        assert!(!backend.exists(&path));
        assert!(!backend.delete(&path));

        fs::write(&path, b"x").unwrap();
        assert!(backend.exists(&path));
        assert!(backend.delete(&path));
        assert!(!backend.exists(&path));
        assert!(!backend.delete(&path));
    }

    #[test]
    fn test_exists_false_for_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let (backend, resolver) = backend_in(tmp.path());
        backend.init().unwrap();
        assert!(!backend.exists(&resolver.namespace_dir()));
    }

    #[test]
    fn test_touch_sets_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        let (backend, resolver) = backend_in(tmp.path());
        backend.init().unwrap();

        let path = resolver.resolve("abc");
        let when = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert!(!backend.touch(&path, Some(when), None));

        fs::write(&path, b"x").unwrap();
        assert!(backend.touch(&path, Some(when), None));

        let modified: DateTime<Utc> = fs::metadata(&path).unwrap().modified().unwrap().into();
        assert_eq!(modified.timestamp(), when.timestamp());
    }

    #[test]
    fn test_list_only_files() {
        let tmp = tempfile::tempdir().unwrap();
        let (backend, resolver) = backend_in(tmp.path());
        backend.init().unwrap();

        fs::write(resolver.resolve("b"), b"x").unwrap();
        fs::write(resolver.resolve("a"), b"x").unwrap();
        fs::create_dir(resolver.namespace_dir().join("sub")).unwrap();

        assert_eq!(backend.list().unwrap(), vec!["a.ocache", "b.ocache"]);
    }
}
