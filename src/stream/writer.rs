//! Chunked Writer
//!
//! Streams a payload into a sink in units of at most `ceiling` bytes.
//!
//! Input is accumulated in a [`TransferBuffer`]. Whenever the buffer reaches
//! the ceiling exactly one full unit is drained and written; whatever is left
//! at [`ChunkedWriter::finish`] goes out as a final short unit. No single
//! write handed to the sink is ever larger than the ceiling, which keeps
//! per-call limits of wrapped sinks (encoders, compressors) intact.

use std::io::Write;
use std::path::PathBuf;

use tracing::{error, trace};

use crate::error::{CacheError, Result};
use crate::stream::TransferBuffer;

// == Chunked Writer ==
/// Bounded-unit writer over any `Write` sink.
#[derive(Debug)]
pub struct ChunkedWriter<W: Write> {
    sink: W,
    buffer: TransferBuffer,
    ceiling: usize,
    target: PathBuf,
    units: usize,
    bytes: usize,
}

impl<W: Write> ChunkedWriter<W> {
    // == Constructor ==
    /// Wraps `sink` with the given chunk ceiling.
    ///
    /// A zero ceiling is a configuration error.
    pub fn new(sink: W, ceiling: usize) -> Result<Self> {
        if ceiling == 0 {
            return Err(CacheError::Configuration(
                "chunk ceiling must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            sink,
            buffer: TransferBuffer::new(),
            ceiling,
            target: PathBuf::new(),
            units: 0,
            bytes: 0,
        })
    }

    /// Names the file behind the sink, for error reporting.
    pub fn for_path(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = target.into();
        self
    }

    /// The chunk ceiling.
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Bytes accepted but not yet handed to the sink.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Number of units handed to the sink so far.
    pub fn units_written(&self) -> usize {
        self.units
    }

    /// Number of bytes handed to the sink so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes
    }

    // == Write ==
    /// Accepts `data`, emitting a full unit each time the buffer fills up.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut cursor = 0;
        while cursor < data.len() {
            let room = self.ceiling.saturating_sub(self.buffer.len());
            let end = data.len().min(cursor + room);
            self.buffer.append(&data[cursor..end]);
            cursor = end;

            if self.buffer.len() >= self.ceiling {
                self.emit_full()?;
            }
        }
        Ok(())
    }

    // == Finish ==
    /// Emits any residual bytes as a final unit, flushes the sink and
    /// returns it.
    pub fn finish(mut self) -> Result<W> {
        if !self.buffer.is_empty() {
            let unit = self.buffer.flush();
            self.emit(&unit)?;
        }
        self.sink
            .flush()
            .map_err(|e| CacheError::storage(&self.target, e))?;
        trace!(
            "Chunked write complete: {} bytes in {} units",
            self.bytes,
            self.units
        );
        Ok(self.sink)
    }

    fn emit_full(&mut self) -> Result<()> {
        if self.buffer.len() != self.ceiling {
            return Err(self.invariant_violation(self.buffer.len()));
        }
        let unit = self
            .buffer
            .drain_up_to(self.ceiling)
            .ok_or_else(|| self.invariant_violation(self.buffer.len()))?;
        if unit.len() != self.ceiling {
            return Err(self.invariant_violation(unit.len()));
        }
        self.emit(&unit)
    }

    fn emit(&mut self, unit: &[u8]) -> Result<()> {
        self.sink
            .write_all(unit)
            .map_err(|e| CacheError::storage(&self.target, e))?;
        self.units += 1;
        self.bytes += unit.len();
        trace!("Flushed unit {} ({} bytes)", self.units, unit.len());
        Ok(())
    }

    fn invariant_violation(&self, actual: usize) -> CacheError {
        error!(
            "Transfer buffer holds {} bytes at flush, expected {} ({})",
            actual,
            self.ceiling,
            self.target.display()
        );
        CacheError::Internal(format!(
            "transfer buffer length {actual} does not match chunk ceiling {}",
            self.ceiling
        ))
    }

    #[cfg(test)]
    fn buffer_mut(&mut self) -> &mut TransferBuffer {
        &mut self.buffer
    }
}
