//! Content-Transfer-Encoding writers.
//!
//! Both encoders wrap an [`io::Write`] and must be finished once the part's
//! bytes are written, so padding and trailing escapes land before the next
//! boundary. Dropping an unfinished encoder finalizes it on a best-effort
//! basis, which covers early returns and error paths.

use crate::error::{Error, Result};
use base64::engine::general_purpose::{GeneralPurpose, STANDARD};
use base64::write::EncoderWriter;
use std::fmt;
use std::io::{self, Write};

/// Maximum encoded line length (RFC 2045).
const MAX_LINE_LEN: usize = 76;

/// Transfer encodings a part can be written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferEncoding {
    /// Quoted-Printable encoding, used for text.
    QuotedPrintable,
    /// Base64 encoding, used for everything else.
    Base64,
}

impl TransferEncoding {
    /// Parses a `Content-Transfer-Encoding` value.
    ///
    /// Returns `None` for any encoding other than quoted-printable or base64.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quoted-printable" => Some(Self::QuotedPrintable),
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }

    /// Default encoding for a content type: quoted-printable for `text`
    /// types, base64 otherwise.
    #[must_use]
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        if content_type.is_some_and(|ct| ct.starts_with("text")) {
            Self::QuotedPrintable
        } else {
            Self::Base64
        }
    }

    /// Returns the header token for this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encodes `data` with `encoding` into `w` and finishes the encoder.
///
/// # Errors
///
/// Returns [`Error::EncodingWrite`] if the underlying writer fails.
pub fn write_encoded<W: Write>(encoding: TransferEncoding, w: W, data: &[u8]) -> Result<()> {
    let wrap = |e| Error::encoding_write(encoding.as_str(), e);
    match encoding {
        TransferEncoding::QuotedPrintable => {
            let mut enc = QuotedPrintableWriter::new(w);
            enc.write_all(data).map_err(wrap)?;
            enc.finish().map_err(wrap)
        }
        TransferEncoding::Base64 => {
            let mut enc = Base64Writer::new(w);
            enc.write_all(data).map_err(wrap)?;
            enc.finish().map_err(wrap)
        }
    }
}

/// Streaming Quoted-Printable encoder (RFC 2045).
///
/// `\r\n` pairs in the input are written as hard line breaks; every other
/// control byte, `=`, and bytes above 0x7E are escaped as `=XX`. Whitespace
/// that would end a line is escaped so decoders cannot strip it. Lines never
/// exceed 76 characters including the `=` of a soft break. A final `\r\n`
/// is escaped because decoders drop a trailing hard break.
pub struct QuotedPrintableWriter<W: Write> {
    inner: W,
    line_len: usize,
    pending_ws: Option<u8>,
    pending_cr: bool,
    pending_break: bool,
    finished: bool,
}

impl<W: Write> QuotedPrintableWriter<W> {
    /// Creates an encoder writing into `inner`.
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            line_len: 0,
            pending_ws: None,
            pending_cr: false,
            pending_break: false,
            finished: false,
        }
    }

    fn emit(&mut self, token: &[u8]) -> io::Result<()> {
        if self.line_len + token.len() > MAX_LINE_LEN - 1 {
            self.inner.write_all(b"=\r\n")?;
            self.line_len = 0;
        }
        self.inner.write_all(token)?;
        self.line_len += token.len();
        Ok(())
    }

    fn emit_escaped(&mut self, b: u8) -> io::Result<()> {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        self.emit(&[b'=', HEX[usize::from(b >> 4)], HEX[usize::from(b & 0x0F)]])
    }

    fn flush_ws(&mut self, line_end: bool) -> io::Result<()> {
        match self.pending_ws.take() {
            Some(ws) if line_end => self.emit_escaped(ws),
            Some(ws) => self.emit(&[ws]),
            None => Ok(()),
        }
    }

    fn encode_byte(&mut self, b: u8) -> io::Result<()> {
        if self.pending_break {
            self.inner.write_all(b"\r\n")?;
            self.line_len = 0;
            self.pending_break = false;
        }

        if self.pending_cr {
            self.pending_cr = false;
            if b == b'\n' {
                self.flush_ws(true)?;
                self.pending_break = true;
                return Ok(());
            }
            self.flush_ws(false)?;
            self.emit_escaped(b'\r')?;
        }

        match b {
            b'\r' => self.pending_cr = true,
            b' ' | b'\t' => {
                self.flush_ws(false)?;
                self.pending_ws = Some(b);
            }
            b'!'..=b'<' | b'>'..=b'~' => {
                self.flush_ws(false)?;
                self.emit(&[b])?;
            }
            _ => {
                self.flush_ws(false)?;
                self.emit_escaped(b)?;
            }
        }
        Ok(())
    }

    /// Writes any held-back bytes and flushes the underlying writer.
    ///
    /// Calling `finish` more than once is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        if self.pending_break {
            self.pending_break = false;
            self.emit_escaped(b'\r')?;
            self.emit_escaped(b'\n')?;
        } else if self.pending_cr {
            self.pending_cr = false;
            self.flush_ws(false)?;
            self.emit_escaped(b'\r')?;
        } else {
            self.flush_ws(true)?;
        }
        self.finished = true;
        self.inner.flush()
    }
}

impl<W: Write> Write for QuotedPrintableWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.finished {
            return Err(io::Error::other("quoted-printable encoder already finished"));
        }
        for &b in buf {
            self.encode_byte(b)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Drop for QuotedPrintableWriter<W> {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            let _ = self.finish();
        }
    }
}

/// Breaks the output into CRLF-terminated lines of [`MAX_LINE_LEN`].
///
/// A line break is only written before further data, so the output never
/// ends with one.
struct LineWrap<W: Write> {
    inner: W,
    column: usize,
}

impl<W: Write> Write for LineWrap<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while !rest.is_empty() {
            if self.column == MAX_LINE_LEN {
                self.inner.write_all(b"\r\n")?;
                self.column = 0;
            }
            let take = rest.len().min(MAX_LINE_LEN - self.column);
            self.inner.write_all(&rest[..take])?;
            self.column += take;
            rest = &rest[take..];
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Streaming Base64 encoder with 76-column lines.
///
/// Dropping the writer without calling [`finish`](Self::finish) still writes
/// the final padded group.
pub struct Base64Writer<W: Write> {
    inner: EncoderWriter<'static, GeneralPurpose, LineWrap<W>>,
    finished: bool,
}

impl<W: Write> Base64Writer<W> {
    /// Creates an encoder writing into `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner: EncoderWriter::new(LineWrap { inner, column: 0 }, &STANDARD),
            finished: false,
        }
    }

    /// Writes the final group with padding and flushes the underlying writer.
    ///
    /// Calling `finish` more than once is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        let mut wrap = self.inner.finish()?;
        self.finished = true;
        wrap.flush()
    }
}

impl<W: Write> Write for Base64Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.finished {
            return Err(io::Error::other("base64 encoder already finished"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.inner.flush()
    }
}
