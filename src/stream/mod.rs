//! Stream Module
//!
//! Bounded-chunk buffered writing used by entry exports.

mod buffer;
mod writer;

pub use buffer::TransferBuffer;
pub use writer::ChunkedWriter;
