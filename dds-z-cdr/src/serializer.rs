//! CDR serializer writing directly into a caller-supplied buffer.

use std::marker::PhantomData;

use byteorder::ByteOrder;
use serde::{Serialize, ser};

use crate::buffer::CdrBuffer;
use crate::error::{Error, Result};
use crate::sizer::serialized_size;

/// Serializer producing an alignment-respecting CDR byte stream.
///
/// Alignment is tracked relative to the buffer length at construction
/// time, so a serializer created after an encapsulation header has been
/// written aligns the payload relative to the payload start, as XCDR
/// requires. Nested records continue the running position; alignment
/// never restarts at struct boundaries.
pub struct CdrSerializer<'a, BO, B: CdrBuffer = Vec<u8>> {
    buffer: &'a mut B,
    start_offset: usize,
    phantom: PhantomData<BO>,
}

impl<'a, BO: ByteOrder, B: CdrBuffer> CdrSerializer<'a, BO, B> {
    /// Create a serializer appending to `buffer`.
    pub fn new(buffer: &'a mut B) -> Self {
        let start_offset = buffer.len();
        Self {
            buffer,
            start_offset,
            phantom: PhantomData,
        }
    }

    #[inline(always)]
    fn position(&self) -> usize {
        self.buffer.len() - self.start_offset
    }

    /// Zero-fill up to the next multiple of `alignment`.
    #[inline(always)]
    fn add_padding(&mut self, alignment: usize) {
        let modulo = self.position() % alignment;
        if modulo != 0 {
            const ZEROS: [u8; 16] = [0; 16];
            self.buffer.extend_from_slice(&ZEROS[..alignment - modulo]);
        }
    }
}

/// Serialize into a fresh `Vec<u8>` sized exactly via the sizer.
pub fn to_vec<T, BO>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize,
    BO: ByteOrder,
{
    let mut buffer = Vec::with_capacity(serialized_size(value, 0)?);
    let mut serializer = CdrSerializer::<BO>::new(&mut buffer);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Serialize into an existing `Vec<u8>`, clearing it first.
///
/// Capacity grows with 4KB granularity, so a long-lived buffer settles
/// quickly for repeated payloads of similar size.
pub fn to_vec_reuse<T, BO>(value: &T, buffer: &mut Vec<u8>) -> Result<()>
where
    T: Serialize,
    BO: ByteOrder,
{
    buffer.clear();
    buffer.reserve_4k(std::mem::size_of_val(value) * 2);

    let mut serializer = CdrSerializer::<BO>::new(buffer);
    value.serialize(&mut serializer)
}

/// Serialize into any [`CdrBuffer`], clearing it first.
pub fn to_buffer<T, BO, B>(value: &T, buffer: &mut B) -> Result<()>
where
    T: Serialize,
    BO: ByteOrder,
    B: CdrBuffer,
{
    buffer.clear();
    let mut serializer = CdrSerializer::<BO, B>::new(buffer);
    value.serialize(&mut serializer)
}

/// Aligned fixed-width primitive: pad, encode with `BO`, append.
macro_rules! primitive {
    ($method:ident, $ty:ty, $write:ident, $width:expr) => {
        #[inline]
        fn $method(self, v: $ty) -> Result<()> {
            self.add_padding($width);
            let mut raw = [0u8; $width];
            BO::$write(&mut raw, v);
            self.buffer.extend_from_slice(&raw);
            Ok(())
        }
    };
}

impl<BO, B> ser::Serializer for &mut CdrSerializer<'_, BO, B>
where
    BO: ByteOrder,
    B: CdrBuffer,
{
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
    fn serialize_bool(self, v: bool) -> Result<()> {
        self.buffer.push(v as u8);
        Ok(())
    }

    #[inline]
    fn serialize_u8(self, v: u8) -> Result<()> {
        self.buffer.push(v);
        Ok(())
    }

    #[inline]
    fn serialize_i8(self, v: i8) -> Result<()> {
        self.buffer.push(v as u8);
        Ok(())
    }

    primitive!(serialize_u16, u16, write_u16, 2);
    primitive!(serialize_i16, i16, write_i16, 2);
    primitive!(serialize_u32, u32, write_u32, 4);
    primitive!(serialize_i32, i32, write_i32, 4);
    primitive!(serialize_u64, u64, write_u64, 8);
    primitive!(serialize_i64, i64, write_i64, 8);
    primitive!(serialize_u128, u128, write_u128, 16);
    primitive!(serialize_i128, i128, write_i128, 16);
    primitive!(serialize_f32, f32, write_f32, 4);
    primitive!(serialize_f64, f64, write_f64, 8);

    /// A char goes on the wire as its 32-bit codepoint.
    #[inline]
    fn serialize_char(self, v: char) -> Result<()> {
        self.serialize_u32(v as u32)
    }

    /// Strings carry a u32 byte count that includes the NUL terminator.
    #[inline]
    fn serialize_str(self, v: &str) -> Result<()> {
        self.serialize_u32(v.len() as u32 + 1)?;
        self.buffer.extend_from_slice(v.as_bytes());
        self.buffer.push(0);
        Ok(())
    }

    #[inline]
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.serialize_u32(v.len() as u32)?;
        self.buffer.extend_from_slice(v);
        Ok(())
    }

    #[inline]
    fn serialize_none(self) -> Result<()> {
        self.serialize_u32(0)
    }

    #[inline]
    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.serialize_u32(1)?;
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
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        self.serialize_u32(variant_index)
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
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.serialize_u32(variant_index)?;
        value.serialize(self)
    }

    /// Sequences carry a u32 element count; the length must be known
    /// up front.
    #[inline]
    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let count = len.ok_or(Error::UnknownLength)?;
        self.serialize_u32(count as u32)?;
        Ok(self)
    }

    /// Fixed-size arrays put no count on the wire.
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
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.serialize_u32(variant_index)?;
        Ok(self)
    }

    #[inline]
    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        let count = len.ok_or(Error::UnknownLength)?;
        self.serialize_u32(count as u32)?;
        Ok(self)
    }

    #[inline]
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }

    #[inline]
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.serialize_u32(variant_index)?;
        Ok(self)
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

/// Compound element traits all just recurse into the serializer.
macro_rules! compound {
    ($trait_:ident :: $method:ident (value)) => {
        impl<BO: ByteOrder, B: CdrBuffer> ser::$trait_ for &mut CdrSerializer<'_, BO, B> {
            type Ok = ();
            type Error = Error;

            #[inline]
            fn $method<T>(&mut self, value: &T) -> Result<()>
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
    };
    ($trait_:ident :: $method:ident (key, value)) => {
        impl<BO: ByteOrder, B: CdrBuffer> ser::$trait_ for &mut CdrSerializer<'_, BO, B> {
            type Ok = ();
            type Error = Error;

            #[inline]
            fn $method<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
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
    };
}

compound!(SerializeSeq::serialize_element(value));
compound!(SerializeTuple::serialize_element(value));
compound!(SerializeTupleStruct::serialize_field(value));
compound!(SerializeTupleVariant::serialize_field(value));
compound!(SerializeStruct::serialize_field(key, value));
compound!(SerializeStructVariant::serialize_field(key, value));

impl<BO: ByteOrder, B: CdrBuffer> ser::SerializeMap for &mut CdrSerializer<'_, BO, B> {
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
