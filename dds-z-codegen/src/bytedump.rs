//! Byte-level comparison and dump helpers for wire conformance checks.
//!
//! Cross-implementation testing captures the native encoder's output and
//! compares it against ours. A length mismatch is always reported before
//! any byte comparison; equal-length streams report the first index at
//! which they diverge.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of comparing two byte streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteDiff {
    Equal,
    LengthMismatch { left: usize, right: usize },
    Mismatch { index: usize, left: u8, right: u8 },
}

impl ByteDiff {
    pub fn is_equal(self) -> bool {
        matches!(self, ByteDiff::Equal)
    }
}

impl fmt::Display for ByteDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteDiff::Equal => write!(f, "equal"),
            ByteDiff::LengthMismatch { left, right } => {
                write!(f, "length mismatch: {left} bytes vs {right} bytes")
            }
            ByteDiff::Mismatch { index, left, right } => {
                write!(f, "byte mismatch at index {index}: {left:02x} vs {right:02x}")
            }
        }
    }
}

/// Compare two byte streams.
pub fn compare(left: &[u8], right: &[u8]) -> ByteDiff {
    if left.len() != right.len() {
        return ByteDiff::LengthMismatch {
            left: left.len(),
            right: right.len(),
        };
    }
    for (index, (l, r)) in left.iter().zip(right).enumerate() {
        if l != r {
            return ByteDiff::Mismatch {
                index,
                left: *l,
                right: *r,
            };
        }
    }
    ByteDiff::Equal
}

/// Lowercase space-separated hex rendering of a byte stream.
pub fn to_hex_string(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for byte in data {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn dump_path(dir: &Path, topic_name: &str, seed: u32, suffix: &str, ext: &str) -> PathBuf {
    let clean = topic_name.replace("::", "_").replace(':', "_");
    dir.join(format!("{clean}_{seed}_{suffix}.{ext}"))
}

/// Save a hex rendering of `data` under `dir`, returning the written path.
///
/// Scope separators in the topic name are flattened to underscores so the
/// file name stays portable.
pub fn save_hex(
    dir: &Path,
    topic_name: &str,
    seed: u32,
    suffix: &str,
    data: &[u8],
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dump_path(dir, topic_name, seed, suffix, "hex");
    fs::write(&path, to_hex_string(data))?;
    Ok(path)
}

/// Save raw bytes under `dir`, returning the written path.
pub fn save_bin(
    dir: &Path,
    topic_name: &str,
    seed: u32,
    suffix: &str,
    data: &[u8],
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dump_path(dir, topic_name, seed, suffix, "bin");
    fs::write(&path, data)?;
    Ok(path)
}
