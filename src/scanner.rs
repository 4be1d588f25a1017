//! Brute-force scan for `N G obj` headers.
//!
//! Diagnostic helper that ignores the cross-reference table entirely. It
//! is useful for comparing what the table claims against what is actually
//! in the file, and as the starting point of a repair strategy.

use crate::lexer::{is_regular, skip_ws};
use lazy_static::lazy_static;
use serde::Serialize;

lazy_static! {
    /// Regex for finding "N G obj" patterns in PDF files
    static ref RE_OBJ_PATTERN: regex::bytes::Regex = regex::bytes::Regex::new(r"(\d+)\s+(\d+)\s+obj\b").unwrap();
}

/// One object header found by [`scan_object_headers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectHeader {
    pub object_num: u32,
    pub generation_num: u32,
    /// Offset of the first digit of the object number
    pub offset: u64,
}

fn parse_u32(digits: &[u8]) -> Option<u32> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Find every plausible object header in `data`, in file order.
///
/// A match counts only if it starts on a token boundary and the next token
/// after `obj` can begin an object.
pub fn scan_object_headers(data: &[u8]) -> Vec<ObjectHeader> {
    let mut headers = Vec::new();

    for capture in RE_OBJ_PATTERN.captures_iter(data) {
        let (Some(full), Some(num), Some(generation)) = (capture.get(0), capture.get(1), capture.get(2)) else {
            continue;
        };

        if full.start() > 0 && is_regular(data[full.start() - 1]) {
            continue;
        }

        let (Some(object_num), Some(generation_num)) = (parse_u32(num.as_bytes()), parse_u32(generation.as_bytes())) else {
            log::warn!("Object header at offset {} does not fit u32", full.start());
            continue;
        };

        // Valid object should start with a delimiter, a keyword or a number
        let next = skip_ws(&data[full.end()..]).first().copied();
        let is_valid_object_start = matches!(
            next,
            Some(b'<' | b'[' | b'(' | b'/' | b't' | b'f' | b'n' | b'-' | b'+' | b'.' | b'0'..=b'9')
        );
        if !is_valid_object_start {
            log::debug!("Skipping header at {} not followed by an object", full.start());
            continue;
        }

        headers.push(ObjectHeader {
            object_num,
            generation_num,
            offset: full.start() as u64,
        });
    }

    log::debug!("Scan found {} object headers", headers.len());
    headers
}
