//! Property serializer and destination writer.
//!
//! [`PropertiesFormat`] turns a [`SecretPayload`](crate::secrets::SecretPayload)
//! into YAML or JSON bytes, and [`replace_atomically`] swaps those bytes
//! into the destination file.

pub mod format;
pub mod writer;

pub use format::{encode, PropertiesFormat};
pub use writer::replace_atomically;
