//! Integration tests for dds-z-cdr

use dds_z_cdr::{BigEndian, CdrBuffer, Error, LittleEndian, from_bytes, serialized_size, to_vec, to_vec_reuse};
use serde::{Deserialize, Serialize};

// ============================================================================
// Buffer tests
// ============================================================================

#[test]
fn test_vec_cdr_buffer() {
    let mut buf: Vec<u8> = Vec::new();

    // Use CdrBuffer trait methods explicitly
    CdrBuffer::extend_from_slice(&mut buf, &[1, 2, 3]);
    assert_eq!(CdrBuffer::len(&buf), 3);

    CdrBuffer::push(&mut buf, 4);
    assert_eq!(CdrBuffer::len(&buf), 4);

    assert!(!CdrBuffer::is_empty(&buf));

    CdrBuffer::clear(&mut buf);
    assert!(CdrBuffer::is_empty(&buf));
}

#[test]
fn test_reserve_4k_rounds_up() {
    let mut buf: Vec<u8> = Vec::new();
    CdrBuffer::reserve_4k(&mut buf, 100);
    assert!(buf.capacity() >= 4096);
}

// ============================================================================
// Serializer tests
// ============================================================================

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Example {
    a: u32,
    b: [u8; 4],
}

#[test]
fn test_serializer_basic() {
    let o = Example {
        a: 1,
        b: [b'a', b'b', b'c', b'd'],
    };

    let expected: Vec<u8> = vec![0x01, 0x00, 0x00, 0x00, 0x61, 0x62, 0x63, 0x64];

    let serialized = to_vec::<_, LittleEndian>(&o).unwrap();
    assert_eq!(serialized, expected);
}

#[test]
fn test_serializer_big_endian() {
    let serialized = to_vec::<_, BigEndian>(&0x01020304u32).unwrap();
    assert_eq!(serialized, vec![0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn test_serializer_bytes() {
    let data = vec![0u8, 1, 2, 3, 4, 5];
    let serialized = to_vec::<_, LittleEndian>(&data).unwrap();

    assert_eq!(serialized.len(), 4 + 6);
    assert_eq!(&serialized[0..4], &[6, 0, 0, 0]);
    assert_eq!(&serialized[4..], &[0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_serializer_string_has_nul_and_length() {
    let serialized = to_vec::<_, LittleEndian>(&"hi").unwrap();
    // length prefix counts the NUL terminator
    assert_eq!(serialized, vec![3, 0, 0, 0, b'h', b'i', 0]);
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Padded {
    a: u8,
    b: u32,
}

#[test]
fn test_serializer_inserts_zero_padding() {
    let serialized = to_vec::<_, LittleEndian>(&Padded { a: 0xAA, b: 1 }).unwrap();
    assert_eq!(serialized, vec![0xAA, 0, 0, 0, 1, 0, 0, 0]);
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Wide {
    a: u8,
    b: u64,
}

#[test]
fn test_serializer_eight_byte_alignment() {
    let serialized = to_vec::<_, LittleEndian>(&Wide { a: 1, b: 2 }).unwrap();
    assert_eq!(serialized.len(), 16);
    assert_eq!(serialized[0], 1);
    assert_eq!(&serialized[1..8], &[0; 7]);
    assert_eq!(serialized[8], 2);
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Inner {
    x: u8,
    y: u16,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Outer {
    head: u8,
    nested: Inner,
    tail: u32,
}

#[test]
fn test_nested_struct_alignment_does_not_restart() {
    let o = Outer {
        head: 1,
        nested: Inner { x: 2, y: 3 },
        tail: 4,
    };
    let serialized = to_vec::<_, LittleEndian>(&o).unwrap();
    // head at 0, nested.x at 1, nested.y aligned to 2 at stream offset 2,
    // tail aligned to 4 at stream offset 4
    assert_eq!(serialized, vec![1, 2, 3, 0, 4, 0, 0, 0]);
}

#[test]
fn test_buffer_reuse() {
    let data1 = vec![1u8, 2, 3];
    let data2 = vec![4u8, 5, 6, 7, 8];

    let mut buffer = Vec::new();

    to_vec_reuse::<_, LittleEndian>(&data1, &mut buffer).unwrap();
    let len1 = buffer.len();
    assert!(len1 > 0);

    to_vec_reuse::<_, LittleEndian>(&data2, &mut buffer).unwrap();
    let len2 = buffer.len();
    assert!(len2 > len1);
}

// ============================================================================
// Deserializer tests
// ============================================================================

#[test]
fn test_deserializer_basic() {
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x61, 0x62, 0x63, 0x64];
    let (o, consumed) = from_bytes::<Example, LittleEndian>(&bytes).unwrap();
    assert_eq!(consumed, 8);
    assert_eq!(
        o,
        Example {
            a: 1,
            b: [b'a', b'b', b'c', b'd'],
        }
    );
}

#[test]
fn test_deserializer_string_without_nul_tolerated() {
    // Some peers put the exact byte count without a terminator
    let bytes = [0x02, 0x00, 0x00, 0x00, b'h', b'i'];
    let (s, _) = from_bytes::<String, LittleEndian>(&bytes).unwrap();
    assert_eq!(s, "hi");

    let bytes_nul = [0x03, 0x00, 0x00, 0x00, b'h', b'i', 0];
    let (s, _) = from_bytes::<String, LittleEndian>(&bytes_nul).unwrap();
    assert_eq!(s, "hi");
}

#[test]
fn test_deserializer_eof_has_context() {
    // Declared string length reads past the buffer end
    let bytes = [10, 0, 0, 0, b'a'];
    let err = from_bytes::<String, LittleEndian>(&bytes).unwrap_err();
    match err {
        Error::Eof {
            position,
            needed,
            available,
        } => {
            assert_eq!(position, 4);
            assert_eq!(needed, 10);
            assert_eq!(available, 1);
        }
        other => panic!("expected Eof, got {other:?}"),
    }
}

#[test]
fn test_deserializer_bad_boolean() {
    let err = from_bytes::<bool, LittleEndian>(&[7]).unwrap_err();
    assert!(matches!(err, Error::BadBoolean(7)));
}

#[test]
fn test_deserializer_bad_option_tag() {
    let err = from_bytes::<Option<u8>, LittleEndian>(&[2, 0, 0, 0, 1]).unwrap_err();
    assert!(matches!(err, Error::BadOption(2)));
}

// ============================================================================
// Round trips
// ============================================================================

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
enum Status {
    Idle,
    Running(u32),
    Named { label: String },
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct Sample {
    id: i32,
    flag: bool,
    label: String,
    readings: Vec<f64>,
    maybe: Option<u16>,
    status: Status,
}

fn sample() -> Sample {
    Sample {
        id: -5,
        flag: true,
        label: "sensor::front".to_string(),
        readings: vec![1.5, -2.25, 0.0],
        maybe: Some(7),
        status: Status::Named {
            label: "ok".to_string(),
        },
    }
}

#[test]
fn test_round_trip_little_endian() {
    let original = sample();
    let bytes = to_vec::<_, LittleEndian>(&original).unwrap();
    let (decoded, consumed) = from_bytes::<Sample, LittleEndian>(&bytes).unwrap();
    assert_eq!(decoded, original);
    assert_eq!(consumed, bytes.len());
}

#[test]
fn test_round_trip_big_endian() {
    let original = sample();
    let bytes = to_vec::<_, BigEndian>(&original).unwrap();
    let (decoded, _) = from_bytes::<Sample, BigEndian>(&bytes).unwrap();
    assert_eq!(decoded, original);
}

// ============================================================================
// Sizer agreement
// ============================================================================

#[test]
fn test_sizer_matches_serializer_output() {
    let original = sample();
    let bytes = to_vec::<_, LittleEndian>(&original).unwrap();
    assert_eq!(serialized_size(&original, 0).unwrap(), bytes.len());
}

#[test]
fn test_sizer_matches_at_nonzero_start_offset() {
    let value = Wide { a: 1, b: 2 };

    let mut buffer = vec![0u8; 4];
    let mut serializer = dds_z_cdr::CdrSerializer::<LittleEndian>::new(&mut buffer);
    serde::Serialize::serialize(&value, &mut serializer).unwrap();

    let payload_len = buffer.len() - 4;
    assert_eq!(serialized_size(&value, 4).unwrap(), payload_len);
}
