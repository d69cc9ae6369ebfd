//! Text decoding for instrument exports.
//!
//! Exports arrive as UTF-8, UTF-16 (usually with a byte-order mark) or some
//! legacy single-byte code page. Decoding walks an ordered chain of
//! strategies and keeps the first one that accepts the bytes.

use std::fmt;

use crate::error::ReadError;

/// A single decode strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// Byte-order mark aware, little endian when no mark is present.
    Utf16,
    /// Every byte maps to the code point of the same value; never fails.
    Latin1,
}

/// Primary, wide, then permissive fallback.
pub const DEFAULT_CHAIN: &[TextEncoding] =
    &[TextEncoding::Utf8, TextEncoding::Utf16, TextEncoding::Latin1];

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Utf16 => write!(f, "utf-16"),
            TextEncoding::Latin1 => write!(f, "latin-1"),
        }
    }
}

impl TextEncoding {
    /// Attempt this strategy alone.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            TextEncoding::Utf16 => decode_utf16(bytes),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let (body, big_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        _ => (bytes, false),
    };
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

/// Decode `bytes` with the first strategy in `chain` that succeeds.
pub fn decode_text(bytes: &[u8], chain: &[TextEncoding]) -> Result<(String, TextEncoding), ReadError> {
    for &encoding in chain {
        if let Some(text) = encoding.decode(bytes) {
            log::debug!("decoded {} bytes as {encoding}", bytes.len());
            return Ok((text, encoding));
        }
    }
    let tried = chain
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(ReadError::Decode { tried })
}
