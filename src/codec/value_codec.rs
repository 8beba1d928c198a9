//! Value Codec
//!
//! Exports values to entry files through the chunked writer and imports them
//! back with every failure downgraded to a miss.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::format;
use crate::error::{CacheError, Result};
use crate::index::PathResolver;
use crate::storage::StorageBackend;
use crate::stream::ChunkedWriter;

// == Value Codec ==
/// Persistence of single values keyed by storage identifier.
#[derive(Debug, Clone)]
pub struct ValueCodec {
    resolver: PathResolver,
    storage: StorageBackend,
    chunk_bytes: usize,
}

impl ValueCodec {
    /// Creates a codec writing through `chunk_bytes`-sized units.
    pub fn new(resolver: PathResolver, storage: StorageBackend, chunk_bytes: usize) -> Self {
        Self {
            resolver,
            storage,
            chunk_bytes,
        }
    }

    /// The chunk ceiling used for exports.
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    // == Export ==
    /// Writes `value` (or a stored absence) to the entry file of `identifier`.
    ///
    /// The file is created or truncated. On a storage error the partially
    /// written file is left behind and must be re-exported.
    pub fn export<V: Serialize>(&self, identifier: &str, value: Option<&V>) -> Result<()> {
        let path = self.resolver.resolve(identifier);
        let encoded = format::encode(value)?;

        let file = File::create(&path).map_err(|e| CacheError::storage(&path, e))?;
        // Closing the returned handle detaches the file from the writer
        let (_file, units) = self.stream_to(file, &path, &encoded)?;

        debug!(
            "Exported {} ({} bytes, {} full units)",
            path.display(),
            encoded.len(),
            units
        );
        Ok(())
    }

    /// Streams an encoded entry into `sink` in chunk-sized units, returning
    /// the sink and the number of full units written.
    fn stream_to<W: Write>(&self, sink: W, path: &Path, encoded: &[u8]) -> Result<(W, usize)> {
        let mut writer = ChunkedWriter::new(sink, self.chunk_bytes)?.for_path(path);
        writer.write(encoded)?;
        let units = writer.units_written();
        Ok((writer.finish()?, units))
    }

    // == Import ==
    /// Loads the value stored for `identifier`.
    ///
    /// A missing file, a read error, a corrupt envelope or a payload of the
    /// wrong shape all yield `None`. Each call decodes the file afresh.
    pub fn import<V: DeserializeOwned>(&self, identifier: &str) -> Option<V> {
        let path = self.resolver.resolve(identifier);
        if !self.storage.exists(&path) {
            return None;
        }

        match self.load(identifier) {
            Ok(value) => value,
            Err(err) => {
                warn!("Ignoring unreadable entry {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Loads and decodes an entry, reporting why it failed.
    pub fn load<V: DeserializeOwned>(&self, identifier: &str) -> Result<Option<V>> {
        let path = self.resolver.resolve(identifier);
        let file = File::open(&path).map_err(|e| CacheError::storage(&path, e))?;

        let mut bytes = Vec::new();
        BufReader::with_capacity(self.chunk_bytes, file)
            .read_to_end(&mut bytes)
            .map_err(|e| CacheError::storage(&path, e))?;

        format::decode(&bytes)
    }
}
