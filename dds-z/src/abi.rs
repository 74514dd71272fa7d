//! ABI offset table for the native topic descriptor struct.
//!
//! Code that writes a `dds_topic_descriptor` into raw memory addresses its
//! fields through this table rather than a mirrored struct definition, so
//! one binary can state exactly which layout it was built for. Offsets
//! generated for one ABI must never be used against memory laid out under
//! another, hence the size sanity check before any field is trusted.

use std::ops::RangeInclusive;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("descriptor size {size} outside expected platform range {}..={}", .expected.start(), .expected.end())]
    DescriptorSizeOutOfRange {
        size: usize,
        expected: RangeInclusive<usize>,
    },

    #[error("field {name} at offset {offset} (width {width}) exceeds descriptor size {descriptor_size}")]
    FieldOutOfBounds {
        name: &'static str,
        offset: usize,
        width: usize,
        descriptor_size: usize,
    },

    #[error("fields {first} and {second} overlap")]
    FieldOverlap {
        first: &'static str,
        second: &'static str,
    },
}

/// Byte offsets of every field of the native descriptor struct, plus the
/// struct's total size, for one build target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiOffsets {
    pub descriptor_size: usize,
    pub size: usize,
    pub align: usize,
    pub flagset: usize,
    pub nkeys: usize,
    pub typename: usize,
    pub keys: usize,
    pub nops: usize,
    pub ops: usize,
    pub meta: usize,
    pub type_info_data: usize,
    pub type_info_size: usize,
    pub type_map_data: usize,
    pub type_map_size: usize,
}

const PTR: usize = size_of::<usize>();

impl AbiOffsets {
    /// Layout of `dds_topic_descriptor` on LP64 targets.
    #[cfg(target_pointer_width = "64")]
    pub const HOST: AbiOffsets = AbiOffsets {
        descriptor_size: 88,
        size: 0,
        align: 4,
        flagset: 8,
        nkeys: 12,
        typename: 16,
        keys: 24,
        nops: 32,
        ops: 40,
        meta: 48,
        type_info_data: 56,
        type_info_size: 64,
        type_map_data: 72,
        type_map_size: 80,
    };

    /// Layout of `dds_topic_descriptor` on ILP32 targets.
    #[cfg(target_pointer_width = "32")]
    pub const HOST: AbiOffsets = AbiOffsets {
        descriptor_size: 52,
        size: 0,
        align: 4,
        flagset: 8,
        nkeys: 12,
        typename: 16,
        keys: 20,
        nops: 24,
        ops: 28,
        meta: 32,
        type_info_data: 36,
        type_info_size: 40,
        type_map_data: 44,
        type_map_size: 48,
    };

    /// Plausible descriptor sizes for the current pointer width.
    #[cfg(target_pointer_width = "64")]
    pub const DESCRIPTOR_SIZE_RANGE: RangeInclusive<usize> = 80..=120;
    #[cfg(target_pointer_width = "32")]
    pub const DESCRIPTOR_SIZE_RANGE: RangeInclusive<usize> = 44..=72;

    fn fields(&self) -> [(&'static str, usize, usize); 13] {
        [
            ("size", self.size, 4),
            ("align", self.align, 4),
            ("flagset", self.flagset, 4),
            ("nkeys", self.nkeys, 4),
            ("typename", self.typename, PTR),
            ("keys", self.keys, PTR),
            ("nops", self.nops, 4),
            ("ops", self.ops, PTR),
            ("meta", self.meta, PTR),
            ("type_info_data", self.type_info_data, PTR),
            ("type_info_size", self.type_info_size, 4),
            ("type_map_data", self.type_map_data, PTR),
            ("type_map_size", self.type_map_size, 4),
        ]
    }

    /// Check the table against the platform-expected bounds.
    ///
    /// Failure is fatal for any caller about to write native memory;
    /// a wrong table silently corrupts whatever sits past the real
    /// struct end.
    pub fn validate(&self) -> Result<(), AbiError> {
        if !Self::DESCRIPTOR_SIZE_RANGE.contains(&self.descriptor_size) {
            return Err(AbiError::DescriptorSizeOutOfRange {
                size: self.descriptor_size,
                expected: Self::DESCRIPTOR_SIZE_RANGE,
            });
        }

        let mut fields = self.fields();
        for (name, offset, width) in fields {
            if offset + width > self.descriptor_size {
                return Err(AbiError::FieldOutOfBounds {
                    name,
                    offset,
                    width,
                    descriptor_size: self.descriptor_size,
                });
            }
        }

        fields.sort_by_key(|(_, offset, _)| *offset);
        for pair in fields.windows(2) {
            let (first, first_off, first_width) = pair[0];
            let (second, second_off, _) = pair[1];
            if first_off + first_width > second_off {
                return Err(AbiError::FieldOverlap { first, second });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_table_is_valid() {
        AbiOffsets::HOST.validate().unwrap();
    }

    #[test]
    fn host_size_within_platform_range() {
        assert!(AbiOffsets::DESCRIPTOR_SIZE_RANGE.contains(&AbiOffsets::HOST.descriptor_size));
    }

    #[test]
    fn undersized_descriptor_rejected() {
        let mut table = AbiOffsets::HOST.clone();
        table.descriptor_size = 16;
        assert!(matches!(
            table.validate(),
            Err(AbiError::DescriptorSizeOutOfRange { size: 16, .. })
        ));
    }

    #[test]
    fn field_past_end_rejected() {
        let mut table = AbiOffsets::HOST.clone();
        table.type_map_size = table.descriptor_size - 2;
        assert!(matches!(
            table.validate(),
            Err(AbiError::FieldOutOfBounds { name: "type_map_size", .. })
        ));
    }

    #[test]
    fn overlapping_fields_rejected() {
        let mut table = AbiOffsets::HOST.clone();
        table.align = table.size + 2;
        assert!(matches!(table.validate(), Err(AbiError::FieldOverlap { .. })));
    }
}
