//! MIME encoding utilities.
//!
//! One-shot Base64 and Quoted-Printable helpers plus RFC 2047 encoded-word
//! generation for header values. Streaming encoders live in
//! [`crate::transfer`].

use crate::error::Result;
use crate::transfer::QuotedPrintableWriter;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Longest encoded-word allowed by RFC 2047.
const MAX_ENCODED_WORD_LEN: usize = 75;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data.trim()).map_err(Into::into)
}

/// Encodes bytes using Quoted-Printable encoding (RFC 2045).
///
/// Produces the same output as streaming the data through a
/// [`QuotedPrintableWriter`].
///
/// ```
/// use mailpost_mime::encoding::encode_quoted_printable;
///
/// assert_eq!(encode_quoted_printable("café = 1".as_bytes()), "caf=C3=A9 =3D 1");
/// ```
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    let mut out = Vec::with_capacity(data.len() * 3 / 2);
    let mut writer = QuotedPrintableWriter::new(&mut out);
    // Writing into a Vec cannot fail.
    let _ = std::io::Write::write_all(&mut writer, data);
    let _ = writer.finish();
    drop(writer);
    String::from_utf8_lossy(&out).into_owned()
}

/// Returns true if a header value contains characters that cannot appear
/// literally in a header.
fn needs_encoding(text: &str) -> bool {
    text.bytes().any(|b| (b < b' ' || b > b'~') && b != b'\t')
}

/// Splits text into chunks whose encoded size stays within `limit`, never
/// splitting a character.
fn chunk_by<F>(text: &str, limit: usize, encoded_len: F) -> Vec<&str>
where
    F: Fn(char) -> usize,
{
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut size = 0;

    for (idx, ch) in text.char_indices() {
        let len = encoded_len(ch);
        if size + len > limit && idx > start {
            chunks.push(&text[start..idx]);
            start = idx;
            size = 0;
        }
        size += len;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Encodes a header value using RFC 2047 "B" encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Text that needs no encoding is
/// returned unchanged. Long text is split into several encoded-words
/// separated by a space.
///
/// # Arguments
///
/// * `text` - Text to encode
/// * `charset` - Character set (e.g., "utf-8")
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if !needs_encoding(text) {
        return text.to_string();
    }

    let overhead = charset.len() + "=?".len() + "?B?".len() + "?=".len();
    let max_bytes = (MAX_ENCODED_WORD_LEN.saturating_sub(overhead) / 4 * 3).max(4);

    chunk_by(text, max_bytes, char::len_utf8)
        .into_iter()
        .map(|chunk| format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Encodes a header value using RFC 2047 "Q" encoding.
///
/// Spaces become `_`; printable ASCII other than `=`, `?` and `_` is kept;
/// every other byte is written as `=XX`. Text that needs no encoding is
/// returned unchanged.
#[must_use]
pub fn encode_rfc2047_q(text: &str, charset: &str) -> String {
    if !needs_encoding(text) {
        return text.to_string();
    }

    let overhead = charset.len() + "=?".len() + "?Q?".len() + "?=".len();
    let limit = MAX_ENCODED_WORD_LEN.saturating_sub(overhead).max(12);

    let q_len = |ch: char| -> usize {
        let mut buf = [0u8; 4];
        ch.encode_utf8(&mut buf)
            .bytes()
            .map(|b| if is_q_literal(b) || b == b' ' { 1 } else { 3 })
            .sum()
    };

    chunk_by(text, limit, q_len)
        .into_iter()
        .map(|chunk| {
            let mut word = format!("=?{charset}?Q?");
            for b in chunk.bytes() {
                if b == b' ' {
                    word.push('_');
                } else if is_q_literal(b) {
                    word.push(char::from(b));
                } else {
                    let _ = write!(word, "={b:02X}");
                }
            }
            word.push_str("?=");
            word
        })
        .collect::<Vec<_>>()
        .join(" ")
}

const fn is_q_literal(b: u8) -> bool {
    matches!(b, b'!'..=b'~') && b != b'=' && b != b'?' && b != b'_'
}
