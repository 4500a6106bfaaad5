//! MIME content type handling and inference.

use std::fmt;

/// Number of leading bytes examined when sniffing content.
const SNIFF_LEN: usize = 512;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters in insertion order (e.g., charset=utf-8, boundary=xxx).
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("boundary"))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        for (key, value) in &self.parameters {
            write!(f, "; {}", parameter(key, value))?;
        }

        Ok(())
    }
}

/// Formats a `key=value` header parameter, quoting the value when it
/// contains whitespace or tspecials.
pub(crate) fn parameter(key: &str, value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c));
    if needs_quotes {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{key}=\"{escaped}\"")
    } else {
        format!("{key}={value}")
    }
}

/// Looks up a content type from a file name's extension.
///
/// Text types carry an explicit utf-8 charset.
#[must_use]
pub fn from_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    let mime = mime_guess::from_ext(ext).first()?;
    if mime.type_() == mime_guess::mime::TEXT && mime.get_param("charset").is_none() {
        Some(format!("{}; charset=utf-8", mime.essence_str()))
    } else {
        Some(mime.essence_str().to_string())
    }
}

/// Tags that mark content as HTML when they open the document.
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

fn is_html(data: &[u8]) -> bool {
    HTML_TAGS.iter().any(|tag| {
        data.len() > tag.len()
            && data[..tag.len()].eq_ignore_ascii_case(tag)
            && matches!(data[tag.len()], b' ' | b'>')
    })
}

const fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

/// True for UTF-8 without binary control bytes. A character cut off at the
/// end of the window still counts as text.
fn is_text(data: &[u8]) -> bool {
    !data.iter().any(|&b| is_binary_byte(b))
        && std::str::from_utf8(data).map_or_else(|e| e.error_len().is_none(), |_| true)
}

/// Guesses a content type from the first bytes of `data`.
///
/// HTML and XML markup are recognized first, then anything that reads as
/// UTF-8 text is `text/plain`. Only content that is not text is matched
/// against binary signatures, so text that happens to open with a short
/// magic number (`BM`, `ID3`) stays text. Returns `None` for unrecognized
/// binary content.
#[must_use]
pub fn sniff(data: &[u8]) -> Option<&'static str> {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let text_start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    let trimmed = &data[text_start..];

    if is_html(trimmed) {
        return Some("text/html; charset=utf-8");
    }
    if trimmed.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }
    if is_text(data) {
        return Some("text/plain; charset=utf-8");
    }

    infer::get(data)
        .map(|kind| kind.mime_type())
        .filter(|mime| *mime != "application/octet-stream")
}
