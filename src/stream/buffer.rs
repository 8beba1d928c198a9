//! Transfer Buffer
//!
//! Ordered chunks of not-yet-flushed bytes with an exact running length.

use std::collections::VecDeque;

// == Transfer Buffer ==
/// Pending bytes of one export, kept as the chunks they were appended in.
#[derive(Debug, Default)]
pub struct TransferBuffer {
    chunks: VecDeque<Vec<u8>>,
    length: usize,
}

impl TransferBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of pending bytes.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if no bytes are pending.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of pending chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    // == Append ==
    /// Appends `chunk` without any capacity check.
    pub fn append(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.chunks.push_back(chunk.to_vec());
        self.length += chunk.len();
    }

    // == Drain Up To ==
    /// Removes exactly `n` bytes from the front of the buffer.
    ///
    /// Returns `None` and leaves the buffer untouched when fewer than `n`
    /// bytes are pending. A chunk split by the boundary keeps its tail as the
    /// new head.
    pub fn drain_up_to(&mut self, n: usize) -> Option<Vec<u8>> {
        if self.length < n {
            return None;
        }
        let mut unit = Vec::with_capacity(n);
        while unit.len() < n {
            let Some(mut head) = self.chunks.pop_front() else {
                break;
            };
            let wanted = n - unit.len();
            if head.len() > wanted {
                let rest = head.split_off(wanted);
                self.chunks.push_front(rest);
            }
            unit.extend_from_slice(&head);
        }
        self.length -= unit.len();
        Some(unit)
    }

    // == Flush ==
    /// Removes and returns all pending bytes as one unit.
    pub fn flush(&mut self) -> Vec<u8> {
        let mut unit = Vec::with_capacity(self.length);
        for chunk in self.chunks.drain(..) {
            unit.extend_from_slice(&chunk);
        }
        self.length = 0;
        unit
    }
}
