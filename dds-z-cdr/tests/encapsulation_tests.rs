//! Tests for the encapsulation header and the header-aware entry points.

use dds_z_cdr::{
    ENCAPSULATION_HEADER_SIZE, EncodingKind, Error, from_bytes_with_header, to_vec_with_header,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct Record {
    id: i32,
    value: bool,
}

#[test]
fn test_header_shape_for_every_kind() {
    let record = Record { id: 42, value: false };
    for kind in EncodingKind::ALL {
        let bytes = to_vec_with_header(&record, kind).unwrap();
        assert_eq!(
            &bytes[0..4],
            &[0x00, kind as u8, 0x00, 0x00],
            "header mismatch for {kind:?}"
        );
    }
}

#[test]
fn test_two_field_record_delimited_cdr2_le() {
    let record = Record { id: 1, value: true };
    let bytes = to_vec_with_header(&record, EncodingKind::DelimitedCdr2Le).unwrap();

    assert_eq!(&bytes[0..4], &[0x00, 0x09, 0x00, 0x00]);
    // i32 at payload offset 0, bool right after
    assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
    assert_eq!(bytes[8], 1);
    assert_eq!(bytes.len(), ENCAPSULATION_HEADER_SIZE + 5);
}

#[test]
fn test_round_trip_every_kind() {
    let record = Record { id: -7, value: true };
    for kind in EncodingKind::ALL {
        let bytes = to_vec_with_header(&record, kind).unwrap();
        let (decoded, decoded_kind, consumed) = from_bytes_with_header::<Record>(&bytes).unwrap();
        assert_eq!(decoded, record, "round trip failed for {kind:?}");
        assert_eq!(decoded_kind, kind);
        assert_eq!(consumed, bytes.len());
    }
}

#[test]
fn test_big_endian_payload_bytes() {
    let bytes = to_vec_with_header(&1u32, EncodingKind::CdrBe).unwrap();
    assert_eq!(bytes, vec![0x00, 0x00, 0x00, 0x00, 0, 0, 0, 1]);
}

#[test]
fn test_alignment_restarts_after_header() {
    // A lone u64 sits at payload offset 0, so no padding is emitted even
    // though its stream offset is 4.
    let bytes = to_vec_with_header(&0x0102030405060708u64, EncodingKind::CdrLe).unwrap();
    assert_eq!(bytes.len(), ENCAPSULATION_HEADER_SIZE + 8);
    assert_eq!(&bytes[4..], &[8, 7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn test_string_alignment_relative_to_payload() {
    let bytes = to_vec_with_header(&"ab", EncodingKind::Cdr2Le).unwrap();
    // length prefix directly after the header, no padding
    assert_eq!(&bytes[4..8], &[3, 0, 0, 0]);
    assert_eq!(&bytes[8..], &[b'a', b'b', 0]);
}

#[test]
fn test_short_input_rejected() {
    for input in [&[][..], &[0x00][..], &[0x00, 0x01, 0x00][..]] {
        let err = from_bytes_with_header::<Record>(input).unwrap_err();
        assert!(matches!(err, Error::HeaderTooShort(n) if n == input.len()));
    }
}

#[test]
fn test_unknown_encoding_kind_rejected() {
    let input = [0x00, 0x05, 0x00, 0x00, 1, 0, 0, 0, 1];
    let err = from_bytes_with_header::<Record>(&input).unwrap_err();
    assert!(matches!(err, Error::BadEncapsulation(0x05)));
}

#[test]
fn test_truncated_payload_reports_eof() {
    let record = Record { id: 9, value: false };
    let bytes = to_vec_with_header(&record, EncodingKind::CdrLe).unwrap();
    let err = from_bytes_with_header::<Record>(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, Error::Eof { .. }));
}
