//! Descriptor extraction from idlc-generated C sources.
//!
//! The IDL compiler emits, per topic type, a `<Type>_ops` instruction word
//! array, a `dds_topic_descriptor` struct literal, optional `<Type>_keys`
//! key tables, and `TYPE_INFO_CDR_*` / `TYPE_MAP_CDR_*` macro byte blobs.
//! This module recovers those as a [`DescriptorData`] by plain text
//! scanning: no compilation, no macro expansion, no validation of the
//! opcode program itself.
//!
//! Every field is extracted independently and degrades to its zero/empty
//! value when the source does not carry it as a literal (idlc writes
//! `.m_size = sizeof (T)`, for instance). Callers that only need the
//! opcode program still get it even when other fields are unresolved.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::opcodes;

/// One entry of a `<Type>_keys` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// Member name as spelled in the IDL.
    pub name: String,
    /// Offset into the opcode program where the key's instructions start.
    pub ops_offset: u32,
    /// Key order index used by the instance hashing algorithm.
    pub index: u32,
}

/// Parsed form of one generated descriptor artifact.
///
/// Fields the source did not carry as literals hold their zero/empty
/// value; extraction itself never fails once the file has been read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescriptorData {
    pub type_name: String,
    pub size: u32,
    pub align: u32,
    pub flagset: u32,
    pub nkeys: u32,
    pub nops: u32,
    pub ops: Vec<u32>,
    pub type_info_cdr: Vec<u8>,
    pub type_map_cdr: Vec<u8>,
    pub keys: Vec<KeyDescriptor>,
    pub meta: String,
}

/// Extract a descriptor from an idlc-generated C file.
///
/// `include_dir`, when given, resolves quoted `#include` directives so
/// descriptors split across the generated .c/.h pair are still seen.
/// Unresolvable includes are dropped; they never carry descriptor data
/// that matters here.
pub fn extract_from_idlc_output(
    c_file: &Path,
    include_dir: Option<&Path>,
) -> Result<DescriptorData> {
    let source = fs::read_to_string(c_file)
        .with_context(|| format!("failed to read generated source {}", c_file.display()))?;
    let source = inline_includes(&source, include_dir);
    Ok(extract_from_source(&source))
}

/// Extract a descriptor from in-memory generated source text.
pub fn extract_from_source(source: &str) -> DescriptorData {
    let mut data = DescriptorData::default();

    match find_initializer(source, "_ops") {
        Some(body) => data.ops = parse_u32_list(body),
        None => debug!("no _ops array literal found"),
    }

    match find_initializer(source, "_desc") {
        Some(body) => {
            data.type_name = parse_string_field(body, "m_typename").unwrap_or_else(|| {
                debug!("descriptor has no literal .m_typename");
                String::new()
            });
            data.size = numeric_field_or_zero(body, "m_size");
            data.align = numeric_field_or_zero(body, "m_align");
            data.flagset = numeric_field_or_zero(body, "m_flagset");
            data.nkeys = numeric_field_or_zero(body, "m_nkeys");
            data.nops = numeric_field_or_zero(body, "m_nops");
            data.meta = parse_string_field(body, "m_meta").unwrap_or_default();
        }
        None => debug!("no _desc struct literal found"),
    }

    match find_initializer(source, "_keys") {
        Some(body) => data.keys = parse_key_table(body),
        None => {}
    }

    data.type_info_cdr = macro_byte_list(source, "TYPE_INFO_CDR_");
    data.type_map_cdr = macro_byte_list(source, "TYPE_MAP_CDR_");

    data
}

/// Splice the contents of quoted includes into the source, one level deep.
fn inline_includes(source: &str, include_dir: Option<&Path>) -> String {
    let Some(dir) = include_dir else {
        return source.to_string();
    };

    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("#include") {
            let rest = rest.trim_start();
            if let Some(name) = rest.strip_prefix('"').and_then(|r| r.split('"').next()) {
                let candidate = dir.join(name);
                match fs::read_to_string(&candidate) {
                    Ok(included) => {
                        out.push_str(&included);
                        out.push('\n');
                    }
                    Err(_) => debug!(include = name, "skipping unresolvable include"),
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Locate `<ident><suffix> [dims] = { ... }` and return the brace body.
///
/// Struct members like `.m_ops = Name_ops,` share the suffix but are not
/// followed by a brace-enclosed initializer, so they are skipped.
fn find_initializer<'a>(source: &'a str, suffix: &str) -> Option<&'a str> {
    let bytes = source.as_bytes();
    let mut search_from = 0;
    while let Some(rel) = source[search_from..].find(suffix) {
        let at = search_from + rel;
        let after = at + suffix.len();
        search_from = after;

        // Must end the identifier here
        if bytes.get(after).is_some_and(|b| is_ident_byte(*b)) {
            continue;
        }

        let mut pos = skip_whitespace(source, after);
        // Optional array dimension, e.g. `[]` or `[3]`
        if bytes.get(pos) == Some(&b'[') {
            match source[pos..].find(']') {
                Some(close) => pos = skip_whitespace(source, pos + close + 1),
                None => continue,
            }
        }
        if bytes.get(pos) != Some(&b'=') {
            continue;
        }
        pos = skip_whitespace(source, pos + 1);
        if bytes.get(pos) != Some(&b'{') {
            continue;
        }
        if let Some(body) = brace_body(source, pos) {
            return Some(body);
        }
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_whitespace(source: &str, mut pos: usize) -> usize {
    let bytes = source.as_bytes();
    while bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
        pos += 1;
    }
    pos
}

/// Return the text between the brace at `open` and its matching close.
///
/// Tracks nested braces and skips string literals so a `{` or `}` inside
/// a quoted type name cannot unbalance the scan.
fn brace_body(source: &str, open: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    debug_assert_eq!(bytes.get(open), Some(&b'{'));

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open + 1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a comma-separated list of 32-bit instruction words.
///
/// Entries may be hex or decimal literals, optionally with C integer
/// suffixes, or `DDS_OP_*` mnemonics combined with `|`. Source order is
/// preserved exactly; unparseable entries are dropped with a debug note.
fn parse_u32_list(body: &str) -> Vec<u32> {
    body.split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .filter_map(|tok| {
            let parsed = parse_word(tok);
            if parsed.is_none() {
                debug!(token = tok, "skipping unparseable ops entry");
            }
            parsed
        })
        .collect()
}

/// Parse one instruction word token, resolving mnemonics and `|` combos.
fn parse_word(token: &str) -> Option<u32> {
    let token = token.trim().trim_matches(|c| c == '(' || c == ')').trim();
    if let Some((left, right)) = token.split_once('|') {
        return Some(parse_word(left)? | parse_word(right)?);
    }
    if let Some(value) = opcodes::resolve_mnemonic(token) {
        return Some(value);
    }
    let digits = token.trim_end_matches(|c| matches!(c, 'u' | 'U' | 'l' | 'L'));
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };
    Some(value as u32)
}

/// Value text of a `.name = value` designated initializer within `body`.
fn field_value<'a>(body: &'a str, field: &str) -> Option<&'a str> {
    let bytes = body.as_bytes();
    let mut search_from = 0;
    while let Some(rel) = body[search_from..].find(field) {
        let at = search_from + rel;
        let after = at + field.len();
        search_from = after;

        if at == 0 || bytes[at - 1] != b'.' {
            continue;
        }
        if bytes.get(after).is_some_and(|b| is_ident_byte(*b)) {
            continue;
        }
        let pos = skip_whitespace(body, after);
        if bytes.get(pos) != Some(&b'=') {
            continue;
        }
        let start = skip_whitespace(body, pos + 1);
        let end = value_end(body, start);
        return Some(body[start..end].trim());
    }
    None
}

/// End of an initializer value: the next comma outside strings/braces.
fn value_end(body: &str, start: usize) -> usize {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'(' => depth += 1,
            b'}' | b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => return i,
            _ => {}
        }
    }
    body.len()
}

fn parse_string_field(body: &str, field: &str) -> Option<String> {
    let value = field_value(body, field)?;
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    Some(inner.to_string())
}

/// Numeric field, degrading to 0 when absent or not a literal
/// (idlc writes `.m_size = sizeof (T)`).
fn numeric_field_or_zero(body: &str, field: &str) -> u32 {
    match field_value(body, field).and_then(parse_word) {
        Some(value) => value,
        None => {
            debug!(field, "descriptor field is not a literal, using 0");
            0
        }
    }
}

/// Parse a `<Type>_keys` table body: `{ "name", ops_offset, index }, ...`
fn parse_key_table(body: &str) -> Vec<KeyDescriptor> {
    let mut keys = Vec::new();
    let bytes = body.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => {
                let Some(entry) = brace_body(body, pos) else {
                    break;
                };
                pos += entry.len() + 2;
                let mut parts = entry.split(',').map(str::trim);
                let name = parts
                    .next()
                    .and_then(|p| Some(p.strip_prefix('"')?.strip_suffix('"')?.to_string()));
                let ops_offset = parts.next().and_then(parse_word);
                let index = parts.next().and_then(parse_word);
                match (name, ops_offset, index) {
                    (Some(name), Some(ops_offset), Some(index)) => keys.push(KeyDescriptor {
                        name,
                        ops_offset,
                        index,
                    }),
                    _ => debug!(entry, "skipping malformed key table entry"),
                }
            }
            _ => pos += 1,
        }
    }
    keys
}

/// Byte list of a `#define <prefix><Type> (unsigned char []){ ... }` macro.
fn macro_byte_list(source: &str, prefix: &str) -> Vec<u8> {
    let Some(at) = source.find(prefix) else {
        return Vec::new();
    };
    // Macro bodies are single lines, possibly with backslash continuations
    let rest = &source[at..];
    let mut definition = String::new();
    for line in rest.lines() {
        if let Some(stripped) = line.strip_suffix('\\') {
            definition.push_str(stripped);
        } else {
            definition.push_str(line);
            break;
        }
    }

    let Some(open) = definition.find('{') else {
        debug!(prefix, "macro carries no byte list");
        return Vec::new();
    };
    let Some(body) = brace_body(&definition, open) else {
        debug!(prefix, "macro byte list is unterminated");
        return Vec::new();
    };
    body.split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .filter_map(|tok| {
            if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
                u8::from_str_radix(hex, 16).ok()
            } else {
                tok.parse::<u8>().ok()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_word_literals_and_mnemonics() {
        assert_eq!(parse_word("0x01100001"), Some(0x01100001));
        assert_eq!(parse_word("4u"), Some(4));
        assert_eq!(parse_word("7"), Some(7));
        assert_eq!(
            parse_word("DDS_OP_ADR | DDS_OP_TYPE_4BY | DDS_OP_FLAG_KEY"),
            Some(0x0103_0001)
        );
        assert_eq!(parse_word("sizeof (int)"), None);
    }

    #[test]
    fn brace_body_ignores_braces_in_strings() {
        let src = r#"{ "open { brace", 1 }"#;
        assert_eq!(brace_body(src, 0), Some(r#" "open { brace", 1 "#));
    }

    #[test]
    fn field_value_finds_designated_initializer() {
        let body = r#" .m_size = sizeof (int), .m_align = 4u, .m_typename = "A::B", "#;
        assert_eq!(field_value(body, "m_align"), Some("4u"));
        assert_eq!(field_value(body, "m_size"), Some("sizeof (int)"));
        assert_eq!(parse_string_field(body, "m_typename").as_deref(), Some("A::B"));
        // m_align must not match as a suffix of another field
        assert_eq!(field_value(body, "align"), None);
    }

    #[test]
    fn key_table_parsing() {
        let body = r#" { "id", 2, 0 }, { "group", 5, 1 } "#;
        let keys = parse_key_table(body);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].name, "id");
        assert_eq!(keys[0].ops_offset, 2);
        assert_eq!(keys[1].index, 1);
    }
}
