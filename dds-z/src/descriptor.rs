//! Native descriptor construction.
//!
//! Builds the raw `dds_topic_descriptor` memory block the messaging engine
//! expects, from an extracted [`DescriptorData`], writing each field at its
//! [`AbiOffsets`] position. All referenced allocations (type name, opcode
//! program, type-identity blobs, key table) are owned by the
//! [`NativeDescriptor`] and stay valid exactly as long as it does.

use std::ffi::CString;

use dds_z_codegen::extractor::{DescriptorData, KeyDescriptor};
use tracing::warn;

use crate::abi::{AbiError, AbiOffsets};

const PTR: usize = size_of::<usize>();

/// Owned native-layout descriptor block.
///
/// The underscore fields are never read back from Rust; they keep the
/// allocations the block points into alive.
pub struct NativeDescriptor {
    block: Box<[u8]>,
    _type_name: Option<CString>,
    _meta: Option<CString>,
    _ops: Option<Box<[u32]>>,
    _type_info: Option<Box<[u8]>>,
    _type_map: Option<Box<[u8]>>,
    _keys: Option<KeyTable>,
}

impl NativeDescriptor {
    /// Build a native descriptor block from extracted data.
    ///
    /// The offset table is validated first; marshalling must not touch
    /// native memory through a table built for a different ABI.
    pub fn new(data: &DescriptorData, offsets: &AbiOffsets) -> Result<Self, AbiError> {
        offsets.validate()?;

        let type_name = owned_c_string(&data.type_name, "type name");
        let meta = owned_c_string(&data.meta, "meta");
        let ops = (!data.ops.is_empty()).then(|| data.ops.clone().into_boxed_slice());
        let type_info =
            (!data.type_info_cdr.is_empty()).then(|| data.type_info_cdr.clone().into_boxed_slice());
        let type_map =
            (!data.type_map_cdr.is_empty()).then(|| data.type_map_cdr.clone().into_boxed_slice());
        let keys = KeyTable::new(&data.keys);

        let mut block = vec![0u8; offsets.descriptor_size].into_boxed_slice();
        write_u32(&mut block, offsets.size, data.size);
        write_u32(&mut block, offsets.align, data.align);
        write_u32(&mut block, offsets.flagset, data.flagset);
        write_u32(&mut block, offsets.nkeys, data.nkeys);
        write_ptr(&mut block, offsets.typename, c_string_addr(&type_name));
        write_ptr(
            &mut block,
            offsets.keys,
            keys.as_ref().map_or(0, KeyTable::addr),
        );
        write_u32(&mut block, offsets.nops, data.nops);
        write_ptr(&mut block, offsets.ops, slice_addr(ops.as_deref()));
        write_ptr(&mut block, offsets.meta, c_string_addr(&meta));
        write_ptr(&mut block, offsets.type_info_data, slice_addr(type_info.as_deref()));
        write_u32(&mut block, offsets.type_info_size, data.type_info_cdr.len() as u32);
        write_ptr(&mut block, offsets.type_map_data, slice_addr(type_map.as_deref()));
        write_u32(&mut block, offsets.type_map_size, data.type_map_cdr.len() as u32);

        Ok(Self {
            block,
            _type_name: type_name,
            _meta: meta,
            _ops: ops,
            _type_info: type_info,
            _type_map: type_map,
            _keys: keys,
        })
    }

    /// Pointer to the descriptor block, valid for `self`'s lifetime.
    pub fn as_ptr(&self) -> *const u8 {
        self.block.as_ptr()
    }

    /// Descriptor block size in bytes.
    pub fn len(&self) -> usize {
        self.block.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    #[cfg(test)]
    fn block(&self) -> &[u8] {
        &self.block
    }
}

/// Native key table: one `{ char* name, uint32 ops_offset, uint32 index }`
/// entry per key, laid out contiguously.
struct KeyTable {
    block: Box<[u8]>,
    _names: Vec<CString>,
}

impl KeyTable {
    const ENTRY_SIZE: usize = PTR + 8;

    fn new(keys: &[KeyDescriptor]) -> Option<Self> {
        if keys.is_empty() {
            return None;
        }
        let names: Vec<CString> = keys
            .iter()
            .map(|k| owned_c_string(&k.name, "key name").unwrap_or_default())
            .collect();

        let mut block = vec![0u8; keys.len() * Self::ENTRY_SIZE].into_boxed_slice();
        for (i, key) in keys.iter().enumerate() {
            let base = i * Self::ENTRY_SIZE;
            write_ptr(&mut block, base, names[i].as_ptr() as usize);
            write_u32(&mut block, base + PTR, key.ops_offset);
            write_u32(&mut block, base + PTR + 4, key.index);
        }
        Some(Self {
            block,
            _names: names,
        })
    }

    fn addr(&self) -> usize {
        self.block.as_ptr() as usize
    }
}

fn owned_c_string(value: &str, what: &str) -> Option<CString> {
    if value.is_empty() {
        return None;
    }
    match CString::new(value) {
        Ok(s) => Some(s),
        Err(_) => {
            warn!(what, "string contains interior NUL, writing null pointer");
            None
        }
    }
}

fn c_string_addr(value: &Option<CString>) -> usize {
    value.as_ref().map_or(0, |s| s.as_ptr() as usize)
}

fn slice_addr<T>(value: Option<&[T]>) -> usize {
    value.map_or(0, |s| s.as_ptr() as usize)
}

fn write_u32(block: &mut [u8], offset: usize, value: u32) {
    block[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

fn write_ptr(block: &mut [u8], offset: usize, addr: usize) {
    block[offset..offset + PTR].copy_from_slice(&addr.to_ne_bytes());
}
