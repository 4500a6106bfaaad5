//! # mailpost-mime
//!
//! Assembly and serialization of RFC 5322 / MIME email messages.
//!
//! ## Features
//!
//! - **Part storage**: attachments and body variants keyed by name, with
//!   content-type and transfer-encoding inference
//! - **Serialization**: single-part or `multipart/mixed` output with
//!   RFC-compliant header folding
//! - **Encoding**: streaming Quoted-Printable and Base64 writers, RFC 2047
//!   encoded-words for header values
//! - **Composition**: an [`Email`] value covering the usual envelope fields
//!
//! ## Quick Start
//!
//! ### Building a message by hand
//!
//! ```
//! use mailpost_mime::{BodyKind, Headers, Message};
//!
//! let mut headers = Headers::new();
//! headers.set("To", "\"A\" <a@example.com>");
//! headers.set("Subject", "Hi");
//!
//! let mut message = Message::new(headers);
//! message.set_body("hello", BodyKind::Text, None)?;
//! message.attach("notes.txt", "some notes", None)?;
//!
//! let raw = message.to_bytes()?;
//! assert!(raw.starts_with(b"MIME-Version: 1.0\r\n"));
//! # Ok::<(), mailpost_mime::Error>(())
//! ```
//!
//! ### Composing an email
//!
//! ```
//! use mailpost_mime::{Address, Attachment, Email, Serializer};
//!
//! let mut email = Email::new(Address::with_name("Sender", "sender@example.com"));
//! email.to.push(Address::with_name("Recipient", "to@example.com"));
//! email.subject = "Quarterly report".into();
//! email.body = "<html><body><p>See attached.</p></body></html>".into();
//! email.attachments.push(Attachment::new("report.csv", "a,b\n1,2\n"));
//!
//! let raw = Serializer::new()
//!     .with_boundary("example-boundary")
//!     .to_bytes(&email.into_message()?)?;
//! # Ok::<(), mailpost_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod compose;
mod content_type;
mod error;
mod header;
mod message;
mod serialize;

pub mod encoding;
pub mod fold;
pub mod transfer;

pub use address::{Address, AddressList};
pub use compose::{Attachment, Email};
pub use content_type::{ContentType, from_extension, sniff};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{BodyKind, Message, Part, PartName};
pub use serialize::Serializer;
pub use transfer::TransferEncoding;
