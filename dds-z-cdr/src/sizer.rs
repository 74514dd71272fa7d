//! Counting serializer: computes the encoded size of a value without
//! writing any bytes.
//!
//! Used to pre-size output buffers exactly. The `start_offset` parameter
//! accounts for bytes already in the stream (e.g. the encapsulation header)
//! so alignment padding is counted the same way the real serializer pads.

use serde::{Serialize, ser};

use crate::error::{Error, Result};

/// Compute the serialized size of `value` when encoding starts at
/// `start_offset` bytes into the stream.
///
/// Size is independent of endianness; only alignment matters.
pub fn serialized_size<T>(value: &T, start_offset: usize) -> Result<usize>
where
    T: Serialize,
{
    let mut sizer = CdrSizer::new(start_offset);
    value.serialize(&mut sizer)?;
    Ok(sizer.position - start_offset)
}

struct CdrSizer {
    position: usize,
}

impl CdrSizer {
    fn new(start_offset: usize) -> Self {
        Self {
            position: start_offset,
        }
    }

    #[inline(always)]
    fn add_aligned(&mut self, size: usize) {
        let modulo = self.position % size;
        if modulo != 0 {
            self.position += size - modulo;
        }
        self.position += size;
    }
}

impl ser::Serializer for &mut CdrSizer {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    #[inline]
    fn serialize_bool(self, _v: bool) -> Result<()> {
        self.position += 1;
        Ok(())
    }

    #[inline]
    fn serialize_u8(self, _v: u8) -> Result<()> {
        self.position += 1;
        Ok(())
    }

    #[inline]
    fn serialize_i8(self, _v: i8) -> Result<()> {
        self.position += 1;
        Ok(())
    }

    #[inline]
    fn serialize_u16(self, _v: u16) -> Result<()> {
        self.add_aligned(2);
        Ok(())
    }

    #[inline]
    fn serialize_i16(self, _v: i16) -> Result<()> {
        self.add_aligned(2);
        Ok(())
    }

    #[inline]
    fn serialize_u32(self, _v: u32) -> Result<()> {
        self.add_aligned(4);
        Ok(())
    }

    #[inline]
    fn serialize_i32(self, _v: i32) -> Result<()> {
        self.add_aligned(4);
        Ok(())
    }

    #[inline]
    fn serialize_u64(self, _v: u64) -> Result<()> {
        self.add_aligned(8);
        Ok(())
    }

    #[inline]
    fn serialize_i64(self, _v: i64) -> Result<()> {
        self.add_aligned(8);
        Ok(())
    }

    #[inline]
    fn serialize_u128(self, _v: u128) -> Result<()> {
        self.add_aligned(16);
        Ok(())
    }

    #[inline]
    fn serialize_i128(self, _v: i128) -> Result<()> {
        self.add_aligned(16);
        Ok(())
    }

    #[inline]
    fn serialize_f32(self, _v: f32) -> Result<()> {
        self.add_aligned(4);
        Ok(())
    }

    #[inline]
    fn serialize_f64(self, _v: f64) -> Result<()> {
        self.add_aligned(8);
        Ok(())
    }

    #[inline]
    fn serialize_char(self, _v: char) -> Result<()> {
        self.add_aligned(4);
        Ok(())
    }

    #[inline]
    fn serialize_str(self, v: &str) -> Result<()> {
        self.add_aligned(4);
        self.position += v.len() + 1;
        Ok(())
    }

    #[inline]
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.add_aligned(4);
        self.position += v.len();
        Ok(())
    }

    #[inline]
    fn serialize_none(self) -> Result<()> {
        self.add_aligned(4);
        Ok(())
    }

    #[inline]
    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.add_aligned(4);
        value.serialize(self)
    }

    #[inline]
    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        self.add_aligned(4);
        Ok(())
    }

    #[inline]
    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    #[inline]
    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.add_aligned(4);
        value.serialize(self)
    }

    #[inline]
    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        match len {
            None => Err(Error::UnknownLength),
            Some(_) => {
                self.add_aligned(4);
                Ok(self)
            }
        }
    }

    #[inline]
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(self)
    }

    #[inline]
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(self)
    }

    #[inline]
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.add_aligned(4);
        Ok(self)
    }

    #[inline]
    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        match len {
            None => Err(Error::UnknownLength),
            Some(_) => {
                self.add_aligned(4);
                Ok(self)
            }
        }
    }

    #[inline]
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }

    #[inline]
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.add_aligned(4);
        Ok(self)
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

impl ser::SerializeSeq for &mut CdrSizer {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTuple for &mut CdrSizer {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for &mut CdrSizer {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for &mut CdrSizer {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeMap for &mut CdrSizer {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        key.serialize(&mut **self)
    }

    #[inline]
    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStruct for &mut CdrSizer {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for &mut CdrSizer {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_sizes() {
        assert_eq!(serialized_size(&1u8, 0).unwrap(), 1);
        assert_eq!(serialized_size(&1u16, 0).unwrap(), 2);
        assert_eq!(serialized_size(&1u32, 0).unwrap(), 4);
        assert_eq!(serialized_size(&1u64, 0).unwrap(), 8);
        assert_eq!(serialized_size(&1.0f64, 0).unwrap(), 8);
    }

    #[test]
    fn start_offset_counts_toward_alignment() {
        // At offset 4 a u64 needs 4 bytes of padding first
        assert_eq!(serialized_size(&1u64, 4).unwrap(), 12);
        // At offset 8 it is already aligned
        assert_eq!(serialized_size(&1u64, 8).unwrap(), 8);
    }

    #[test]
    fn string_size_includes_length_prefix_and_nul() {
        assert_eq!(serialized_size(&"abc", 0).unwrap(), 4 + 3 + 1);
        assert_eq!(serialized_size(&"", 0).unwrap(), 4 + 1);
    }

    #[test]
    fn sequence_size() {
        let v = vec![1u16, 2, 3];
        // 4-byte count, u16 elements packed
        assert_eq!(serialized_size(&v, 0).unwrap(), 4 + 6);
    }
}
