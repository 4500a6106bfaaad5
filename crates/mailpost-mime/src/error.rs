//! Error types for message assembly and serialization.

use std::io;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Part name is path-like or otherwise unusable as an attachment name.
    #[error("Bad part name: {0:?}")]
    InvalidPartName(String),

    /// Non-text content was set as a message body.
    #[error("Unsupported body content type: {0:?}")]
    UnsupportedBodyContentType(String),

    /// Transfer encoding other than quoted-printable or base64.
    #[error("Unsupported transfer encoding: {0:?}")]
    UnsupportedTransferEncoding(String),

    /// Serialization attempted on a message without parts.
    #[error("Message has no parts")]
    EmptyMessage,

    /// Writing encoded part content failed.
    #[error("Failed to write {encoding} content: {source}")]
    EncodingWrite {
        /// Encoding that was being written (or `multipart` for part creation).
        encoding: String,
        /// Underlying stream error.
        #[source]
        source: io::Error,
    },

    /// I/O error while writing headers or boundaries.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}

impl Error {
    /// Creates an encoding write error.
    #[must_use]
    pub fn encoding_write(encoding: impl Into<String>, source: io::Error) -> Self {
        Self::EncodingWrite {
            encoding: encoding.into(),
            source,
        }
    }
}
