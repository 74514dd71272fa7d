//! XCDR encapsulation: the 4-byte header that prefixes every serialized
//! payload on the wire.
//!
//! Layout: `[0x00, encoding kind, 0x00, 0x00]`. Byte 0 and the two options
//! bytes are reserved. The encoding kind selects the CDR version and the
//! payload endianness. Payload alignment restarts after the header.

use byteorder::{BigEndian, LittleEndian};
use serde::{Deserialize, Serialize};
use strum::FromRepr;

use crate::deserializer::from_bytes;
use crate::error::{Error, Result};
use crate::serializer::CdrSerializer;
use crate::sizer::serialized_size;

/// Size of the encapsulation header in bytes.
pub const ENCAPSULATION_HEADER_SIZE: usize = 4;

/// Encoding kind byte of the encapsulation header.
///
/// Values follow the DDS-XTypes encoding identifiers as emitted by
/// CycloneDDS: plain CDR (XCDR1), parameter-list CDR, and the XCDR2
/// plain/delimited/parameter-list variants, each in both endiannesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u8)]
pub enum EncodingKind {
    CdrBe = 0x00,
    CdrLe = 0x01,
    PlCdrBe = 0x02,
    PlCdrLe = 0x03,
    Cdr2Be = 0x06,
    Cdr2Le = 0x07,
    DelimitedCdr2Be = 0x08,
    DelimitedCdr2Le = 0x09,
    PlCdr2Be = 0x0A,
    PlCdr2Le = 0x0B,
}

impl EncodingKind {
    /// All supported encoding kinds.
    pub const ALL: [EncodingKind; 10] = [
        EncodingKind::CdrBe,
        EncodingKind::CdrLe,
        EncodingKind::PlCdrBe,
        EncodingKind::PlCdrLe,
        EncodingKind::Cdr2Be,
        EncodingKind::Cdr2Le,
        EncodingKind::DelimitedCdr2Be,
        EncodingKind::DelimitedCdr2Le,
        EncodingKind::PlCdr2Be,
        EncodingKind::PlCdr2Le,
    ];

    /// Decode the kind byte of a header.
    pub fn from_byte(byte: u8) -> Result<Self> {
        Self::from_repr(byte).ok_or(Error::BadEncapsulation(byte))
    }

    /// Whether the payload is little-endian.
    pub fn is_little_endian(self) -> bool {
        matches!(
            self,
            EncodingKind::CdrLe
                | EncodingKind::PlCdrLe
                | EncodingKind::Cdr2Le
                | EncodingKind::DelimitedCdr2Le
                | EncodingKind::PlCdr2Le
        )
    }

    /// Whether this is an XCDR2 encoding.
    pub fn is_xcdr2(self) -> bool {
        (self as u8) >= 0x06
    }
}

/// Serialize `value` behind an encapsulation header.
///
/// The output starts with `[0x00, kind, 0x00, 0x00]`; the payload follows,
/// aligned relative to the payload start and encoded with the endianness
/// `kind` implies. No trailing padding is appended.
pub fn to_vec_with_header<T>(value: &T, kind: EncodingKind) -> Result<Vec<u8>>
where
    T: Serialize,
{
    let payload_size = serialized_size(value, 0)?;
    let mut buffer = Vec::with_capacity(ENCAPSULATION_HEADER_SIZE + payload_size);
    buffer.extend_from_slice(&[0x00, kind as u8, 0x00, 0x00]);

    // The serializer starts counting at the current buffer length, which
    // makes payload alignment relative to the payload start.
    if kind.is_little_endian() {
        let mut serializer = CdrSerializer::<LittleEndian>::new(&mut buffer);
        value.serialize(&mut serializer)?;
    } else {
        let mut serializer = CdrSerializer::<BigEndian>::new(&mut buffer);
        value.serialize(&mut serializer)?;
    }
    Ok(buffer)
}

/// Deserialize a value from an encapsulated byte stream.
///
/// Returns the value, the encoding kind announced by the header, and the
/// total number of bytes consumed (header included).
pub fn from_bytes_with_header<'de, T>(input: &'de [u8]) -> Result<(T, EncodingKind, usize)>
where
    T: Deserialize<'de>,
{
    if input.len() < ENCAPSULATION_HEADER_SIZE {
        return Err(Error::HeaderTooShort(input.len()));
    }
    let kind = EncodingKind::from_byte(input[1])?;
    let payload = &input[ENCAPSULATION_HEADER_SIZE..];

    let (value, consumed) = if kind.is_little_endian() {
        from_bytes::<T, LittleEndian>(payload)?
    } else {
        from_bytes::<T, BigEndian>(payload)?
    };
    Ok((value, kind, ENCAPSULATION_HEADER_SIZE + consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_byte() {
        for kind in EncodingKind::ALL {
            assert_eq!(EncodingKind::from_byte(kind as u8).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_bytes_rejected() {
        for byte in [0x04u8, 0x05, 0x0C, 0x7F, 0xFF] {
            assert!(matches!(
                EncodingKind::from_byte(byte),
                Err(Error::BadEncapsulation(b)) if b == byte
            ));
        }
    }

    #[test]
    fn endianness_split() {
        assert!(!EncodingKind::CdrBe.is_little_endian());
        assert!(EncodingKind::CdrLe.is_little_endian());
        assert!(!EncodingKind::DelimitedCdr2Be.is_little_endian());
        assert!(EncodingKind::DelimitedCdr2Le.is_little_endian());
    }

    #[test]
    fn xcdr2_split() {
        assert!(!EncodingKind::CdrLe.is_xcdr2());
        assert!(!EncodingKind::PlCdrBe.is_xcdr2());
        assert!(EncodingKind::Cdr2Be.is_xcdr2());
        assert!(EncodingKind::PlCdr2Le.is_xcdr2());
    }
}
