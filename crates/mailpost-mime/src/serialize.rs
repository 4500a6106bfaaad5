//! Message serialization.
//!
//! A message holding only one body part is written as a single-part document
//! with the part's headers merged into the top-level block. Anything else
//! becomes `multipart/mixed`, with parts written in insertion order.

use crate::content_type::ContentType;
use crate::error::{Error, Result};
use crate::fold::write_headers;
use crate::header::Headers;
use crate::message::{Message, Part};
use crate::transfer::{TransferEncoding, write_encoded};
use std::fmt::Write as _;
use std::io::{self, Write};
use tracing::{debug, trace};

/// Number of random bytes in a generated boundary (hex encoded).
const BOUNDARY_BYTES: usize = 30;

/// Writes messages as RFC 5322 documents.
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    boundary: Option<String>,
}

impl Serializer {
    /// Creates a serializer that generates a random boundary per message.
    #[must_use]
    pub const fn new() -> Self {
        Self { boundary: None }
    }

    /// Uses a fixed multipart boundary, for reproducible output.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Writes `message` to `w` and returns the number of bytes written.
    ///
    /// Output written before a failure is not rolled back; discard it on
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyMessage`] if the message has no parts,
    /// [`Error::UnsupportedTransferEncoding`] if a part carries an encoding
    /// that cannot be written, and an I/O error if the writer fails.
    pub fn write<W: Write>(&self, message: &Message, w: W) -> Result<u64> {
        if message.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let mut out = Counting { inner: w, count: 0 };
        let mut headers = Headers::new();
        if message.headers.contains("MIME-Version") {
            headers.extend_from(&message.headers);
        } else {
            // An empty MIME-Version is replaced, not kept alongside the default.
            let mut rest = message.headers.clone();
            rest.remove("MIME-Version");
            headers.set("MIME-Version", "1.0");
            headers.extend_from(&rest);
        }

        let mut parts = message.parts();
        match (parts.next(), parts.next()) {
            (Some((name, part)), None) if name.is_body() => {
                debug!(part = %name, "Writing single-part message");
                for (field, _) in part.headers().iter() {
                    headers.remove(field);
                }
                headers.extend_from(part.headers());
                write_headers(&mut out, &headers)?;
                write_part_body(&mut out, part)?;
            }
            _ => {
                let boundary = self.boundary.clone().unwrap_or_else(random_boundary);
                debug!(parts = message.len(), %boundary, "Writing multipart message");
                headers.set(
                    "Content-Type",
                    ContentType::multipart_mixed(boundary.as_str()).to_string(),
                );
                write_headers(&mut out, &headers)?;
                write_multipart(&mut out, message, &boundary)?;
            }
        }

        out.flush()?;
        debug!(bytes = out.count, "Serialized message");
        Ok(out.count)
    }

    /// Serializes `message` into a new buffer.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub fn to_bytes(&self, message: &Message) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(message, &mut buf)?;
        Ok(buf)
    }
}

impl Message {
    /// Writes the message with a random multipart boundary.
    ///
    /// # Errors
    ///
    /// See [`Serializer::write`].
    pub fn write_to<W: Write>(&self, w: W) -> Result<u64> {
        Serializer::new().write(self, w)
    }

    /// Serializes the message into a new buffer.
    ///
    /// # Errors
    ///
    /// See [`Serializer::write`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Serializer::new().to_bytes(self)
    }
}

fn write_multipart<W: Write>(out: &mut W, message: &Message, boundary: &str) -> Result<()> {
    let delimiter = |e| Error::encoding_write("multipart", e);

    for (i, (name, part)) in message.parts().enumerate() {
        let open = if i == 0 { "" } else { "\r\n" };
        write!(out, "{open}--{boundary}\r\n").map_err(delimiter)?;
        write_headers(out, part.headers()).map_err(delimiter)?;
        trace!(part = %name, "Writing part body");
        write_part_body(out, part)?;
    }
    write!(out, "\r\n--{boundary}--\r\n").map_err(delimiter)?;
    Ok(())
}

fn write_part_body<W: Write>(out: &mut W, part: &Part) -> Result<()> {
    let encoding = match part.headers().get("Content-Transfer-Encoding") {
        None => TransferEncoding::for_content_type(part.content_type()),
        Some(value) => TransferEncoding::parse(value)
            .ok_or_else(|| Error::UnsupportedTransferEncoding(value.to_string()))?,
    };
    write_encoded(encoding, out, part.data())
}

fn random_boundary() -> String {
    let bytes: [u8; BOUNDARY_BYTES] = rand::random();
    bytes.iter().fold(String::with_capacity(BOUNDARY_BYTES * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

/// Writer adapter that counts bytes passed through.
struct Counting<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for Counting<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
