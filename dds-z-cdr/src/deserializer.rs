//! CDR deserializer for DDS-Z payloads.

use std::marker::PhantomData;

use byteorder::ByteOrder;
use serde::de::{
    self, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess, VariantAccess,
    Visitor,
};

use crate::error::{Error, Result};

/// Deserializer converting a CDR byte stream into Rust values.
///
/// `CdrDeserializer` is about three machine words of data, so fairly cheap
/// to create. Padding is consumed based on the running position, so nested
/// structs never restart alignment.
pub struct CdrDeserializer<'i, BO> {
    phantom: PhantomData<BO>,
    input: &'i [u8],
    consumed: usize,
}

impl<'de, BO> CdrDeserializer<'de, BO>
where
    BO: ByteOrder,
{
    /// Create a new deserializer from input bytes.
    #[inline]
    pub fn new(input: &'de [u8]) -> CdrDeserializer<'de, BO> {
        CdrDeserializer::<BO> {
            phantom: PhantomData,
            input,
            consumed: 0,
        }
    }

    /// How many bytes of input have been consumed.
    #[inline]
    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    /// Take the next `count` bytes of input.
    ///
    /// Returns a slice with the input data lifetime `'de`, enabling
    /// zero-copy borrowed deserialization.
    #[inline]
    fn next_bytes(&mut self, count: usize) -> Result<&'de [u8]> {
        if count <= self.input.len() {
            let (head, tail) = self.input.split_at(count);
            self.input = tail;
            self.consumed += count;
            Ok(head)
        } else {
            Err(Error::Eof {
                position: self.consumed,
                needed: count,
                available: self.input.len(),
            })
        }
    }

    /// Consume and discard alignment padding.
    #[inline]
    fn align(&mut self, type_octet_alignment: usize) -> Result<()> {
        let modulo = self.consumed % type_octet_alignment;
        if modulo == 0 {
            Ok(())
        } else {
            let _pad = self.next_bytes(type_octet_alignment - modulo)?;
            Ok(())
        }
    }

    #[inline]
    fn read_u32(&mut self) -> Result<u32> {
        Ok(BO::read_u32(self.next_bytes(4)?))
    }
}

/// Deserialize a value from `&[u8]` based on its [`serde::Deserialize`] impl.
///
/// Returns the deserialized value plus the count of bytes consumed.
///
/// For zero-copy deserialization of borrowed types (like `&str`), the input
/// bytes must outlive the deserialized value.
#[inline]
pub fn from_bytes<'de, T, BO>(input_bytes: &'de [u8]) -> Result<(T, usize)>
where
    T: serde::Deserialize<'de>,
    BO: ByteOrder,
{
    from_bytes_with::<PhantomData<T>, BO>(input_bytes, PhantomData)
}

/// Deserialize through an explicit [`DeserializeSeed`].
///
/// Returns the deserialized value plus the count of bytes consumed.
#[inline]
pub fn from_bytes_with<'de, S, BO>(input_bytes: &'de [u8], decoder: S) -> Result<(S::Value, usize)>
where
    S: DeserializeSeed<'de>,
    BO: ByteOrder,
{
    let mut deserializer = CdrDeserializer::<BO>::new(input_bytes);
    let t = decoder.deserialize(&mut deserializer)?;
    Ok((t, deserializer.consumed))
}

impl<'de, BO> de::Deserializer<'de> for &mut CdrDeserializer<'de, BO>
where
    BO: ByteOrder,
{
    type Error = Error;

    /// CDR is not a self-describing data format.
    fn deserialize_any<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::UnsupportedAny)
    }

    /// Boolean values are encoded as single octets (0 or 1).
    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.next_bytes(1)?[0] {
            0 => visitor.visit_bool(false),
            1 => visitor.visit_bool(true),
            x => Err(Error::BadBoolean(x)),
        }
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i8(self.next_bytes(1)?[0] as i8)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u8(self.next_bytes(1)?[0])
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(2)?;
        visitor.visit_i16(BO::read_i16(self.next_bytes(2)?))
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(2)?;
        visitor.visit_u16(BO::read_u16(self.next_bytes(2)?))
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        visitor.visit_i32(BO::read_i32(self.next_bytes(4)?))
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        visitor.visit_u32(self.read_u32()?)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(8)?;
        visitor.visit_i64(BO::read_i64(self.next_bytes(8)?))
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(8)?;
        visitor.visit_u64(BO::read_u64(self.next_bytes(8)?))
    }

    fn deserialize_u128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(16)?;
        visitor.visit_u128(BO::read_u128(self.next_bytes(16)?))
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(16)?;
        visitor.visit_i128(BO::read_i128(self.next_bytes(16)?))
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        visitor.visit_f32(BO::read_f32(self.next_bytes(4)?))
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(8)?;
        visitor.visit_f64(BO::read_f64(self.next_bytes(8)?))
    }

    /// A char is a 32-bit Unicode codepoint on the wire.
    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        let codepoint = self.read_u32()?;
        match char::from_u32(codepoint) {
            Some(c) => visitor.visit_char(c),
            None => Err(Error::BadChar(codepoint)),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // The u32 length includes the NUL terminator
        self.align(4)?;
        let bytes_len = self.read_u32()? as usize;
        let bytes = self.next_bytes(bytes_len)?;

        // Strip the NUL terminator; tolerate implementations that omit it
        let contents = match bytes.split_last() {
            Some((0, contents)) => contents,
            _ => bytes,
        };

        std::str::from_utf8(contents)
            .map_err(Error::BadUtf8)
            .and_then(|s| visitor.visit_borrowed_str(s))
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // Owned strings use the borrowed path; serde copies if needed
        self.deserialize_str(visitor)
    }

    /// Bulk byte read with zero-copy borrowing, important for large payloads.
    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        let len = self.read_u32()? as usize;
        let bytes = self.next_bytes(len)?;
        visitor.visit_borrowed_bytes(bytes)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        let len = self.read_u32()? as usize;
        let buf = self.next_bytes(len)?.to_vec();
        visitor.visit_byte_buf(buf)
    }

    #[inline]
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        let tag = self.read_u32()?;
        match tag {
            0 => visitor.visit_none(),
            1 => visitor.visit_some(self),
            other => Err(Error::BadOption(other)),
        }
    }

    #[inline]
    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // Unit data is not put on the wire
        visitor.visit_unit()
    }

    #[inline]
    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    #[inline]
    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    /// Sequences are encoded as a u32 element count followed by the elements.
    #[inline]
    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        let element_count = self.read_u32()? as usize;
        visitor.visit_seq(SequenceHelper::new(self, element_count))
    }

    /// Fixed length array; the element count is not on the wire.
    #[inline]
    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(SequenceHelper::new(self, len))
    }

    #[inline]
    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(SequenceHelper::new(self, len))
    }

    #[inline]
    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        let element_count = self.read_u32()? as usize;
        visitor.visit_map(SequenceHelper::new(self, element_count))
    }

    #[inline]
    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(SequenceHelper::new(self, fields.len()))
    }

    /// Enum discriminants are encoded as u32.
    #[inline]
    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.align(4)?;
        visitor.visit_enum(EnumerationHelper::<BO>::new(self))
    }

    #[inline]
    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_u32(visitor)
    }

    #[inline]
    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_any(visitor)
    }

    #[inline]
    fn is_human_readable(&self) -> bool {
        false
    }
}

// ----------------------------------------------------------

struct EnumerationHelper<'a, 'de, BO> {
    de: &'a mut CdrDeserializer<'de, BO>,
}

impl<'a, 'de, BO> EnumerationHelper<'a, 'de, BO>
where
    BO: ByteOrder,
{
    #[inline]
    fn new(de: &'a mut CdrDeserializer<'de, BO>) -> Self {
        EnumerationHelper::<BO> { de }
    }
}

impl<'de, BO> EnumAccess<'de> for EnumerationHelper<'_, 'de, BO>
where
    BO: ByteOrder,
{
    type Error = Error;
    type Variant = Self;

    #[inline]
    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        // preceding deserialize_enum aligned to 4
        let tag = self.de.read_u32()?;
        let val: Result<_> = seed.deserialize(tag.into_deserializer());
        Ok((val?, self))
    }
}

impl<'de, BO> VariantAccess<'de> for EnumerationHelper<'_, 'de, BO>
where
    BO: ByteOrder,
{
    type Error = Error;

    #[inline]
    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.de)
    }

    #[inline]
    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self.de, len, visitor)
    }

    #[inline]
    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self.de, fields.len(), visitor)
    }
}

// ----------------------------------------------------------

struct SequenceHelper<'a, 'de, BO> {
    de: &'a mut CdrDeserializer<'de, BO>,
    element_counter: usize,
    expected_count: usize,
}

impl<'a, 'de, BO> SequenceHelper<'a, 'de, BO> {
    #[inline]
    fn new(de: &'a mut CdrDeserializer<'de, BO>, expected_count: usize) -> Self {
        SequenceHelper {
            de,
            element_counter: 0,
            expected_count,
        }
    }
}

impl<'de, BO> SeqAccess<'de> for SequenceHelper<'_, 'de, BO>
where
    BO: ByteOrder,
{
    type Error = Error;

    #[inline]
    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.element_counter == self.expected_count {
            Ok(None)
        } else {
            self.element_counter += 1;
            seed.deserialize(&mut *self.de).map(Some)
        }
    }
}

impl<'de, BO> MapAccess<'de> for SequenceHelper<'_, 'de, BO>
where
    BO: ByteOrder,
{
    type Error = Error;

    #[inline]
    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        if self.element_counter == self.expected_count {
            Ok(None)
        } else {
            self.element_counter += 1;
            seed.deserialize(&mut *self.de).map(Some)
        }
    }

    #[inline]
    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        seed.deserialize(&mut *self.de)
    }
}
