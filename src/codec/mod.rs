//! Codec Module
//!
//! Entry file format and value export/import.

pub mod format;
mod value_codec;

pub use format::{decode, encode, EntryHeader, ENTRY_FORMAT_VERSION, ENTRY_MAGIC};
pub use value_codec::ValueCodec;
