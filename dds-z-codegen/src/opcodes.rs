//! Opcode constants for the native serialization program.
//!
//! An opcode program is a flat array of 32-bit words executed sequentially
//! by the native runtime to walk a struct during (de)serialization. Each
//! instruction word packs an operation in bits 24..32, a type code in
//! bits 16..23, and flag bits in the low byte.

pub const DDS_OP_RTS: u32 = 0x00 << 24;
pub const DDS_OP_ADR: u32 = 0x01 << 24;
pub const DDS_OP_JSR: u32 = 0x02 << 24;
pub const DDS_OP_JEQ: u32 = 0x03 << 24;
pub const DDS_OP_DLC: u32 = 0x04 << 24;
pub const DDS_OP_PLC: u32 = 0x05 << 24;
pub const DDS_OP_PLM: u32 = 0x06 << 24;
pub const DDS_OP_KOF: u32 = 0x07 << 24;
pub const DDS_OP_JEQ4: u32 = 0x08 << 24;

pub const DDS_OP_TYPE_1BY: u32 = 0x01 << 16;
pub const DDS_OP_TYPE_2BY: u32 = 0x02 << 16;
pub const DDS_OP_TYPE_4BY: u32 = 0x03 << 16;
pub const DDS_OP_TYPE_8BY: u32 = 0x04 << 16;
pub const DDS_OP_TYPE_STR: u32 = 0x05 << 16;
pub const DDS_OP_TYPE_BST: u32 = 0x06 << 16;
pub const DDS_OP_TYPE_SEQ: u32 = 0x07 << 16;
pub const DDS_OP_TYPE_ARR: u32 = 0x08 << 16;
pub const DDS_OP_TYPE_UNI: u32 = 0x09 << 16;
pub const DDS_OP_TYPE_STU: u32 = 0x0A << 16;
pub const DDS_OP_TYPE_BSQ: u32 = 0x0B << 16;
pub const DDS_OP_TYPE_ENU: u32 = 0x0C << 16;
pub const DDS_OP_TYPE_EXT: u32 = 0x0D << 16;
pub const DDS_OP_TYPE_BLN: u32 = 0x0E << 16;
pub const DDS_OP_TYPE_BMK: u32 = 0x0F << 16;

pub const DDS_OP_FLAG_KEY: u32 = 0x01;
pub const DDS_OP_FLAG_DEF: u32 = 0x02;
pub const DDS_OP_FLAG_SGN: u32 = 0x04;
pub const DDS_OP_FLAG_FP: u32 = 0x08;
pub const DDS_OP_FLAG_EXT: u32 = 0x10;
pub const DDS_OP_FLAG_OPT: u32 = 0x20;
pub const DDS_OP_FLAG_MU: u32 = 0x40;

pub const DDS_OP_MASK: u32 = 0xff00_0000;
pub const DDS_OP_TYPE_MASK: u32 = 0x007f_0000;

/// Operation part of an instruction word.
#[inline]
pub fn op(word: u32) -> u32 {
    word & DDS_OP_MASK
}

/// Type code part of an instruction word.
#[inline]
pub fn op_type(word: u32) -> u32 {
    word & DDS_OP_TYPE_MASK
}

/// Resolve a single `DDS_OP_*` mnemonic to its instruction word value.
///
/// Generated sources usually spell instruction words as hex literals, but
/// hand-written descriptors may use the symbolic names.
pub fn resolve_mnemonic(name: &str) -> Option<u32> {
    let value = match name {
        "DDS_OP_RTS" => DDS_OP_RTS,
        "DDS_OP_ADR" => DDS_OP_ADR,
        "DDS_OP_JSR" => DDS_OP_JSR,
        "DDS_OP_JEQ" => DDS_OP_JEQ,
        "DDS_OP_DLC" => DDS_OP_DLC,
        "DDS_OP_PLC" => DDS_OP_PLC,
        "DDS_OP_PLM" => DDS_OP_PLM,
        "DDS_OP_KOF" => DDS_OP_KOF,
        "DDS_OP_JEQ4" => DDS_OP_JEQ4,
        "DDS_OP_TYPE_1BY" => DDS_OP_TYPE_1BY,
        "DDS_OP_TYPE_2BY" => DDS_OP_TYPE_2BY,
        "DDS_OP_TYPE_4BY" => DDS_OP_TYPE_4BY,
        "DDS_OP_TYPE_8BY" => DDS_OP_TYPE_8BY,
        "DDS_OP_TYPE_STR" => DDS_OP_TYPE_STR,
        "DDS_OP_TYPE_BST" => DDS_OP_TYPE_BST,
        "DDS_OP_TYPE_SEQ" => DDS_OP_TYPE_SEQ,
        "DDS_OP_TYPE_ARR" => DDS_OP_TYPE_ARR,
        "DDS_OP_TYPE_UNI" => DDS_OP_TYPE_UNI,
        "DDS_OP_TYPE_STU" => DDS_OP_TYPE_STU,
        "DDS_OP_TYPE_BSQ" => DDS_OP_TYPE_BSQ,
        "DDS_OP_TYPE_ENU" => DDS_OP_TYPE_ENU,
        "DDS_OP_TYPE_EXT" => DDS_OP_TYPE_EXT,
        "DDS_OP_TYPE_BLN" => DDS_OP_TYPE_BLN,
        "DDS_OP_TYPE_BMK" => DDS_OP_TYPE_BMK,
        "DDS_OP_FLAG_KEY" => DDS_OP_FLAG_KEY,
        "DDS_OP_FLAG_DEF" => DDS_OP_FLAG_DEF,
        "DDS_OP_FLAG_SGN" => DDS_OP_FLAG_SGN,
        "DDS_OP_FLAG_FP" => DDS_OP_FLAG_FP,
        "DDS_OP_FLAG_EXT" => DDS_OP_FLAG_EXT,
        "DDS_OP_FLAG_OPT" => DDS_OP_FLAG_OPT,
        "DDS_OP_FLAG_MU" => DDS_OP_FLAG_MU,
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_word_decomposition() {
        let word = DDS_OP_ADR | DDS_OP_TYPE_4BY | DDS_OP_FLAG_KEY | DDS_OP_FLAG_SGN;
        assert_eq!(op(word), DDS_OP_ADR);
        assert_eq!(op_type(word), DDS_OP_TYPE_4BY);
        assert_eq!(word & 0xff, DDS_OP_FLAG_KEY | DDS_OP_FLAG_SGN);
    }

    #[test]
    fn mnemonic_resolution() {
        assert_eq!(resolve_mnemonic("DDS_OP_ADR"), Some(0x0100_0000));
        assert_eq!(resolve_mnemonic("DDS_OP_TYPE_STR"), Some(0x0005_0000));
        assert_eq!(resolve_mnemonic("DDS_OP_NOPE"), None);
    }
}
