//! # Tether Serde
//! Byte-oriented wire serialization shared by every tether crate.
//!
//! The format is deliberately byte-aligned: numeric payloads are copied
//! little-endian, so float round trips are bit-exact by construction.

mod error;
mod reader_writer;
mod serde;

pub use error::SerdeErr;
pub use reader_writer::{ByteReader, ByteWriter};
pub use serde::{read_var_u64, write_var_u64, Serde};
