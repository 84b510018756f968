//! Content-stream text matching
//!
//! Byte-level helpers used by text removal, plus the word tokenizer behind
//! page inspection. Removal works on raw (decoded) stream bytes and never
//! parses operators; word extraction parses operators with lopdf.

use lazy_static::lazy_static;
use lopdf::content::Content;
use lopdf::Object;
use regex::bytes::Regex;

lazy_static! {
    /// A text run: `BT`, then the shortest stretch of any bytes, then `ET`
    static ref TEXT_RUN_PATTERN: Regex = Regex::new(r"(?s-u)BT.*?ET").unwrap();
}

/// Remove each target from the buffer until none occurs
///
/// Targets are first applied one after another, in order, each cleared to
/// its own fixpoint. Removing a later target can expose an earlier one
/// (`"xacby"` minus `"ab"` then `"c"` leaves `"xaby"`), so a final pass
/// over all targets at once clears whatever the ordered sweep left behind.
/// Empty targets are ignored.
pub fn strip_all<S: AsRef<str>>(content: &[u8], targets: &[S]) -> Vec<u8> {
    let needles: Vec<&[u8]> = targets
        .iter()
        .map(|target| target.as_ref().as_bytes())
        .filter(|needle| !needle.is_empty())
        .collect();

    let mut current = content.to_vec();
    for &needle in &needles {
        current = strip_nested(&current, &[needle]);
    }
    if needles.len() > 1 {
        current = strip_nested(&current, &needles);
    }
    current
}

/// Single left-to-right pass that removes a needle as soon as it completes
///
/// The output is kept free of needles at every step, so a removal that joins
/// the bytes around it into a new occurrence is caught when its last byte is
/// pushed. Linear in the input for a fixed set of needles.
fn strip_nested(content: &[u8], needles: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    for &byte in content {
        out.push(byte);
        if let Some(needle) = needles.iter().find(|needle| out.ends_with(needle)) {
            out.truncate(out.len() - needle.len());
        }
    }
    out
}

/// Remove every `BT ... ET` region including its delimiters
pub fn strip_text_runs(content: &[u8]) -> Vec<u8> {
    TEXT_RUN_PATTERN.replace_all(content, &b""[..]).into_owned()
}

/// Whether the UTF-8 bytes of `needle` occur anywhere in `haystack`
pub fn contains(haystack: &[u8], needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    match Regex::new(&regex::escape(needle)) {
        Ok(pattern) => pattern.is_match(haystack),
        Err(_) => haystack.windows(needle.len()).any(|w| w == needle.as_bytes()),
    }
}

/// Kerning adjustment (thousandths of text space) treated as a word gap
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Word-level tokens shown by text operators inside `BT ... ET` runs
///
/// Line moves and run boundaries split words; large negative `TJ` kerning is
/// read as a space. Returns an empty list when the content cannot be decoded.
pub fn extract_words(content: &[u8]) -> Vec<String> {
    let content = match Content::decode(content) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Skipping undecodable content stream: {}", e);
            return Vec::new();
        }
    };

    let mut text = String::new();
    let mut in_text = false;

    for operation in &content.operations {
        match operation.operator.as_str() {
            "BT" => in_text = true,
            "ET" => {
                in_text = false;
                text.push(' ');
            }
            _ if !in_text => {}
            "Td" | "TD" | "T*" | "Tm" => text.push(' '),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operation.operands.first() {
                    text.push_str(&decode_pdf_string(bytes));
                }
            }
            "'" | "\"" => {
                text.push(' ');
                if let Some(Object::String(bytes, _)) = operation.operands.last() {
                    text.push_str(&decode_pdf_string(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operation.operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                            Object::Integer(n) if (*n as f32) < TJ_SPACE_THRESHOLD => {
                                text.push(' ')
                            }
                            Object::Real(n) if *n < TJ_SPACE_THRESHOLD => text.push(' '),
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
    }

    text.split_whitespace().map(str::to_string).collect()
}

/// Decode a PDF string operand: UTF-16BE with BOM, else UTF-8, else Latin-1
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
