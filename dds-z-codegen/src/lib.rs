pub mod bytedump;
pub mod extractor;
pub mod opcodes;

pub use bytedump::{ByteDiff, compare, save_bin, save_hex, to_hex_string};
pub use extractor::{DescriptorData, KeyDescriptor, extract_from_idlc_output, extract_from_source};
