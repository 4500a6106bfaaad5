//! Message structure and part storage.

use crate::content_type::{from_extension, parameter, sniff};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::transfer::TransferEncoding;
use std::fmt;
use tracing::{debug, warn};

/// Which body slot a body part occupies.
///
/// `Html` and `Text` bodies can coexist so that clients without HTML support
/// still get a readable version. `Auto` holds a single body whose type is
/// detected from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BodyKind {
    /// Content type detected from the data.
    #[default]
    Auto,
    /// HTML body.
    Html,
    /// Plain text body.
    Text,
}

/// Key of a message part.
///
/// Body parts live in their own namespace, so no attachment file name can
/// collide with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartName {
    /// One of the body slots.
    Body(BodyKind),
    /// An attachment, by base file name.
    Attachment(String),
}

impl PartName {
    /// Returns true for body parts.
    #[must_use]
    pub const fn is_body(&self) -> bool {
        matches!(self, Self::Body(_))
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body(BodyKind::Auto) => f.write_str("body"),
            Self::Body(BodyKind::Html) => f.write_str("body (html)"),
            Self::Body(BodyKind::Text) => f.write_str("body (text)"),
            Self::Attachment(name) => f.write_str(name),
        }
    }
}

/// Reduces an attachment name to its final path component.
///
/// Empty names, bare separators, `.`, and anything containing a `..`
/// component are rejected.
fn base_name(name: &str) -> Result<&str> {
    const SEPARATORS: [char; 2] = ['/', '\\'];

    let trimmed = name.trim_end_matches(SEPARATORS);
    let base = trimmed.rsplit(SEPARATORS).next().unwrap_or(trimmed);

    if base.is_empty() || base == "." || trimmed.split(SEPARATORS).any(|c| c == "..") {
        warn!(name, "Rejected part name");
        return Err(Error::InvalidPartName(name.to_string()));
    }
    Ok(base)
}

/// Formats the default `Content-Disposition` for an attachment.
fn disposition(filename: &str) -> String {
    format!("attachment; {}", parameter("filename", filename))
}

/// A named unit of message content: headers plus raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    headers: Headers,
    data: Vec<u8>,
}

impl Part {
    #[cfg(test)]
    pub(crate) const fn with_headers(headers: Headers, data: Vec<u8>) -> Self {
        Self { headers, data }
    }

    /// Part headers (Content-Type, Content-Transfer-Encoding, ...).
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Raw, unencoded payload.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Resolved content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }

    /// Transfer encoding the part is written with.
    #[must_use]
    pub fn transfer_encoding(&self) -> Option<TransferEncoding> {
        self.headers
            .get("Content-Transfer-Encoding")
            .and_then(TransferEncoding::parse)
    }
}

/// An email message under construction: top-level headers plus named parts.
///
/// Parts are kept in insertion order; re-attaching a name replaces the part
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Top-level message headers.
    pub headers: Headers,
    parts: Vec<(PartName, Part)>,
}

impl Message {
    /// Creates a message with the given top-level headers and no parts.
    #[must_use]
    pub const fn new(headers: Headers) -> Self {
        Self {
            headers,
            parts: Vec::new(),
        }
    }

    /// Attaches a file.
    ///
    /// Passing empty `data` removes a previously attached part with the same
    /// name instead. The name is reduced to its base file name. Header values
    /// in `headers` take precedence over inferred ones; an unsupported
    /// `Content-Transfer-Encoding` is replaced by the inferred default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPartName`] for path-like names.
    pub fn attach(
        &mut self,
        name: &str,
        data: impl Into<Vec<u8>>,
        headers: Option<Headers>,
    ) -> Result<()> {
        self.attach_file(name, data.into(), headers, false)
    }

    /// Like [`attach`](Self::attach), but an explicit unsupported
    /// `Content-Transfer-Encoding` is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPartName`] for path-like names and
    /// [`Error::UnsupportedTransferEncoding`] for encodings other than
    /// quoted-printable and base64.
    pub fn attach_strict(
        &mut self,
        name: &str,
        data: impl Into<Vec<u8>>,
        headers: Option<Headers>,
    ) -> Result<()> {
        self.attach_file(name, data.into(), headers, true)
    }

    fn attach_file(
        &mut self,
        name: &str,
        data: Vec<u8>,
        headers: Option<Headers>,
        strict: bool,
    ) -> Result<()> {
        if data.is_empty() {
            if let Ok(base) = base_name(name) {
                self.remove(&PartName::Attachment(base.to_string()));
            }
            return Ok(());
        }
        let base = base_name(name)?;
        self.insert(PartName::Attachment(base.to_string()), data, headers, strict)
    }

    /// Sets a message body.
    ///
    /// Passing empty `data` removes the body of that kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBodyContentType`] if the content is not
    /// text.
    pub fn set_body(
        &mut self,
        data: impl Into<Vec<u8>>,
        kind: BodyKind,
        headers: Option<Headers>,
    ) -> Result<()> {
        let data = data.into();
        let name = PartName::Body(kind);
        if data.is_empty() {
            self.remove(&name);
            return Ok(());
        }
        self.insert(name, data, headers, false)
    }

    fn insert(
        &mut self,
        name: PartName,
        data: Vec<u8>,
        headers: Option<Headers>,
        strict: bool,
    ) -> Result<()> {
        let mut headers = headers.unwrap_or_default();

        let content_type = match headers.get("Content-Type").filter(|ct| !ct.is_empty()) {
            Some(explicit) => Some(explicit.to_string()),
            None => {
                let inferred = infer_content_type(&name, &data);
                if let Some(ct) = &inferred {
                    headers.set("Content-Type", ct.clone());
                }
                inferred
            }
        };

        let requested = headers
            .get("Content-Transfer-Encoding")
            .filter(|enc| !enc.is_empty())
            .map(str::to_string);
        let encoding = match requested.as_deref().map(TransferEncoding::parse) {
            Some(Some(encoding)) => encoding,
            Some(None) if strict => {
                return Err(Error::UnsupportedTransferEncoding(
                    requested.unwrap_or_default(),
                ));
            }
            _ => {
                let encoding = TransferEncoding::for_content_type(content_type.as_deref());
                // An explicit valid encoding lets any content through as a body.
                if name.is_body() && encoding == TransferEncoding::Base64 {
                    let content_type = content_type.unwrap_or_default();
                    warn!(part = %name, content_type, "Rejected non-text body");
                    return Err(Error::UnsupportedBodyContentType(content_type));
                }
                encoding
            }
        };
        headers.set("Content-Transfer-Encoding", encoding.as_str());

        if let PartName::Attachment(filename) = &name
            && !headers.contains("Content-Disposition")
        {
            headers.set("Content-Disposition", disposition(filename));
        }

        debug!(
            part = %name,
            content_type = content_type.as_deref().unwrap_or(""),
            %encoding,
            size = data.len(),
            "Attached part"
        );

        let part = Part { headers, data };
        match self.parts.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = part,
            None => self.parts.push((name, part)),
        }
        Ok(())
    }

    /// Returns true if an attachment with that name exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        base_name(name).is_ok_and(|base| self.has_part(&PartName::Attachment(base.to_string())))
    }

    /// Returns true if the part exists.
    #[must_use]
    pub fn has_part(&self, name: &PartName) -> bool {
        self.part(name).is_some()
    }

    /// Returns the part stored under `name`.
    #[must_use]
    pub fn part(&self, name: &PartName) -> Option<&Part> {
        self.parts
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, part)| part)
    }

    /// Removes a part. Removing a missing part is a no-op.
    pub fn remove(&mut self, name: &PartName) {
        let before = self.parts.len();
        self.parts.retain(|(existing, _)| existing != name);
        if self.parts.len() != before {
            debug!(part = %name, "Removed part");
        }
    }

    /// Iterates over parts in insertion order.
    pub fn parts(&self) -> impl Iterator<Item = (&PartName, &Part)> {
        self.parts.iter().map(|(name, part)| (name, part))
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if the message has no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Infers a content type from the part's name and content.
fn infer_content_type(name: &PartName, data: &[u8]) -> Option<String> {
    let sniffed = sniff(data);
    let is_text = sniffed.is_some_and(|ct| ct.starts_with("text"));

    match name {
        PartName::Attachment(filename) => {
            from_extension(filename).or_else(|| sniffed.map(str::to_string))
        }
        PartName::Body(BodyKind::Html) if is_text => Some("text/html".to_string()),
        PartName::Body(BodyKind::Text) if is_text => {
            Some("text/plain; charset=utf-8".to_string())
        }
        PartName::Body(_) => sniffed.map(str::to_string),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PNG: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR\x00\x00\x00\x01";

    #[test]
    fn test_attach_infers_from_extension() {
        let mut msg = Message::default();
        msg.attach("report.pdf", b"%PDF-1.4".to_vec(), None).unwrap();

        let part = msg.part(&PartName::Attachment("report.pdf".into())).unwrap();
        assert_eq!(part.content_type(), Some("application/pdf"));
        assert_eq!(part.transfer_encoding(), Some(TransferEncoding::Base64));
        assert_eq!(
            part.headers().get("Content-Disposition"),
            Some("attachment; filename=report.pdf")
        );
        assert_eq!(part.data(), b"%PDF-1.4");
    }

    #[test]
    fn test_attach_text_file_uses_quoted_printable() {
        let mut msg = Message::default();
        msg.attach("TheNameOfTheFile.txt", "some text", None).unwrap();

        let part = msg.part(&PartName::Attachment("TheNameOfTheFile.txt".into())).unwrap();
        assert_eq!(part.content_type(), Some("text/plain; charset=utf-8"));
        assert_eq!(part.transfer_encoding(), Some(TransferEncoding::QuotedPrintable));
    }

    #[test]
    fn test_attach_sniffs_without_extension() {
        let mut msg = Message::default();
        msg.attach("image", PNG, None).unwrap();
        let part = msg.part(&PartName::Attachment("image".into())).unwrap();
        assert_eq!(part.content_type(), Some("image/png"));
        assert_eq!(part.transfer_encoding(), Some(TransferEncoding::Base64));
    }

    #[test]
    fn test_attach_unknown_binary_has_no_content_type() {
        let mut msg = Message::default();
        msg.attach("blob", vec![0u8, 1, 2, 3], None).unwrap();
        let part = msg.part(&PartName::Attachment("blob".into())).unwrap();
        assert_eq!(part.content_type(), None);
        assert_eq!(part.transfer_encoding(), Some(TransferEncoding::Base64));
    }

    #[test]
    fn test_attach_explicit_headers_win() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/csv");
        headers.set("Content-Transfer-Encoding", "base64");
        headers.set("Content-Disposition", "inline");

        let mut msg = Message::default();
        msg.attach("data.bin", "a,b\n1,2", Some(headers)).unwrap();

        let part = msg.part(&PartName::Attachment("data.bin".into())).unwrap();
        assert_eq!(part.content_type(), Some("text/csv"));
        assert_eq!(part.transfer_encoding(), Some(TransferEncoding::Base64));
        assert_eq!(part.headers().get("Content-Disposition"), Some("inline"));
    }

    #[test]
    fn test_attach_invalid_encoding_replaced() {
        let mut headers = Headers::new();
        headers.set("Content-Transfer-Encoding", "7bit");

        let mut msg = Message::default();
        msg.attach("notes.txt", "hello", Some(headers)).unwrap();

        let part = msg.part(&PartName::Attachment("notes.txt".into())).unwrap();
        assert_eq!(
            part.headers().get("Content-Transfer-Encoding"),
            Some("quoted-printable")
        );
    }

    #[test]
    fn test_attach_strict_rejects_invalid_encoding() {
        let mut headers = Headers::new();
        headers.set("Content-Transfer-Encoding", "7bit");

        let mut msg = Message::default();
        let err = msg.attach_strict("notes.txt", "hello", Some(headers)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedTransferEncoding(ref enc) if enc == "7bit"));
        assert!(!msg.has("notes.txt"));
    }

    #[test]
    fn test_attach_strips_directories() {
        let mut msg = Message::default();
        msg.attach("/tmp/uploads/photo.png", PNG, None).unwrap();
        assert!(msg.has("photo.png"));
        assert!(msg.has("/tmp/uploads/photo.png"));
        assert!(msg.has_part(&PartName::Attachment("photo.png".into())));
    }

    #[test]
    fn test_attach_rejects_path_names() {
        let mut msg = Message::default();
        for name in ["../evil", ".", "..", "/", "", "a/../../b", "dir\\..\\x"] {
            let err = msg.attach(name, "x", None).unwrap_err();
            assert!(matches!(err, Error::InvalidPartName(_)), "{name:?} accepted");
        }
        assert!(msg.is_empty());
    }

    #[test]
    fn test_attach_empty_deletes() {
        let mut msg = Message::default();
        msg.attach("a.txt", "x", None).unwrap();
        assert!(msg.has("a.txt"));

        msg.attach("a.txt", Vec::new(), None).unwrap();
        assert!(!msg.has("a.txt"));

        // Deleting something that never existed is fine.
        msg.attach("missing.txt", Vec::new(), None).unwrap();
        msg.attach("../evil", Vec::new(), None).unwrap();
    }

    #[test]
    fn test_attach_overwrites_in_place() {
        let mut msg = Message::default();
        msg.attach("a.txt", "first", None).unwrap();
        msg.attach("b.txt", "second", None).unwrap();
        msg.attach("a.txt", "replaced", None).unwrap();

        let names: Vec<_> = msg.parts().map(|(name, _)| name.to_string()).collect();
        assert_eq!(names, ["a.txt", "b.txt"]);
        assert_eq!(
            msg.part(&PartName::Attachment("a.txt".into())).unwrap().data(),
            b"replaced"
        );
    }

    #[test]
    fn test_attachment_named_like_body_is_separate() {
        let mut msg = Message::default();
        msg.set_body("hello", BodyKind::Auto, None).unwrap();
        msg.attach("body", "file", None).unwrap();
        assert_eq!(msg.len(), 2);
        assert!(msg.has("body"));
    }

    #[test]
    fn test_set_body_auto_text() {
        let mut msg = Message::default();
        msg.set_body("hello", BodyKind::Auto, None).unwrap();

        let part = msg.part(&PartName::Body(BodyKind::Auto)).unwrap();
        assert_eq!(part.content_type(), Some("text/plain; charset=utf-8"));
        assert_eq!(part.transfer_encoding(), Some(TransferEncoding::QuotedPrintable));
        assert!(part.headers().get("Content-Disposition").is_none());
    }

    #[test]
    fn test_set_body_auto_detects_html() {
        let mut msg = Message::default();
        msg.set_body(
            "<html><body><p>This is a paragraph</p></body></html>",
            BodyKind::Auto,
            None,
        )
        .unwrap();
        let part = msg.part(&PartName::Body(BodyKind::Auto)).unwrap();
        assert_eq!(part.content_type(), Some("text/html; charset=utf-8"));
    }

    #[test]
    fn test_set_body_html_and_text_coexist() {
        let mut msg = Message::default();
        msg.set_body("<p>Hi</p>", BodyKind::Html, None).unwrap();
        msg.set_body("Hi", BodyKind::Text, None).unwrap();

        assert_eq!(msg.len(), 2);
        assert_eq!(
            msg.part(&PartName::Body(BodyKind::Html)).unwrap().content_type(),
            Some("text/html")
        );
        assert_eq!(
            msg.part(&PartName::Body(BodyKind::Text)).unwrap().content_type(),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn test_set_body_auto_replaces() {
        let mut msg = Message::default();
        msg.set_body("one", BodyKind::Auto, None).unwrap();
        msg.set_body("two", BodyKind::Auto, None).unwrap();
        assert_eq!(msg.len(), 1);
        assert_eq!(msg.part(&PartName::Body(BodyKind::Auto)).unwrap().data(), b"two");
    }

    #[test]
    fn test_set_body_rejects_binary() {
        let mut msg = Message::default();
        let err = msg.set_body(PNG, BodyKind::Html, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBodyContentType(ref ct) if ct == "image/png"));

        let err = msg.set_body(vec![0u8, 1, 2], BodyKind::Auto, None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBodyContentType(_)));
        assert!(msg.is_empty());
    }

    #[test]
    fn test_set_body_rejects_explicit_binary_type() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/octet-stream");
        let mut msg = Message::default();
        let err = msg.set_body("hello", BodyKind::Text, Some(headers)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBodyContentType(_)));
    }

    #[test]
    fn test_set_body_explicit_encoding_allows_non_text_type() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/json");
        headers.set("Content-Transfer-Encoding", "quoted-printable");

        let mut msg = Message::default();
        msg.set_body("{\"a\":1}", BodyKind::Auto, Some(headers)).unwrap();

        let part = msg.part(&PartName::Body(BodyKind::Auto)).unwrap();
        assert_eq!(part.content_type(), Some("application/json"));
        assert_eq!(part.transfer_encoding(), Some(TransferEncoding::QuotedPrintable));
    }

    #[test]
    fn test_set_body_html_text_resembling_signature() {
        let mut msg = Message::default();
        msg.set_body("BMW launches a <b>new</b> model", BodyKind::Html, None).unwrap();
        msg.set_body("ID3 tags explained", BodyKind::Text, None).unwrap();

        assert_eq!(
            msg.part(&PartName::Body(BodyKind::Html)).unwrap().content_type(),
            Some("text/html")
        );
        assert_eq!(
            msg.part(&PartName::Body(BodyKind::Text)).unwrap().content_type(),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn test_set_body_empty_removes() {
        let mut msg = Message::default();
        msg.set_body("hello", BodyKind::Text, None).unwrap();
        msg.set_body(Vec::new(), BodyKind::Text, None).unwrap();
        assert!(!msg.has_part(&PartName::Body(BodyKind::Text)));
    }

    #[test]
    fn test_disposition_quotes_when_needed() {
        assert_eq!(disposition("a.txt"), "attachment; filename=a.txt");
        assert_eq!(disposition("my file.txt"), "attachment; filename=\"my file.txt\"");
    }

    proptest! {
        #[test]
        fn prop_attach_then_delete(
            name in "[A-Za-z0-9_-][A-Za-z0-9 ._-]{0,30}",
            data in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            let mut msg = Message::default();
            msg.attach(&name, data, None).unwrap();
            prop_assert!(msg.has(&name));

            msg.attach(&name, Vec::new(), None).unwrap();
            prop_assert!(!msg.has(&name));
            prop_assert!(msg.is_empty());
        }
    }
}
