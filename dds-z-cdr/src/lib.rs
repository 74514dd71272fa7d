//! CDR (Common Data Representation) serialization for DDS-Z.
//!
//! This crate provides the XCDR wire encoding used by CycloneDDS: an
//! alignment-respecting field payload behind a 4-byte encapsulation header.
//! Serialization goes through serde, so any `Serialize`/`Deserialize` record
//! can be put on the wire.

pub mod buffer;
pub mod deserializer;
pub mod encapsulation;
pub mod error;
pub mod serializer;
pub mod sizer;

// Re-export main types for convenience
pub use buffer::CdrBuffer;
// Re-export byteorder types for convenience
pub use byteorder::{BigEndian, LittleEndian};
pub use deserializer::{CdrDeserializer, from_bytes, from_bytes_with};
pub use encapsulation::{ENCAPSULATION_HEADER_SIZE, EncodingKind, from_bytes_with_header, to_vec_with_header};
pub use error::{Error, Result};
pub use serializer::{CdrSerializer, to_buffer, to_vec, to_vec_reuse};
pub use sizer::serialized_size;

/// Native endian type alias for the current platform.
///
/// On little-endian platforms (x86_64, ARM), this is `LittleEndian`.
/// On big-endian platforms, this is `BigEndian`.
#[cfg(target_endian = "little")]
pub type NativeEndian = LittleEndian;

#[cfg(target_endian = "big")]
pub type NativeEndian = BigEndian;
