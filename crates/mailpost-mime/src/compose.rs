//! High-level email composition.
//!
//! [`Email`] collects the usual envelope fields and turns them into a
//! [`Message`] ready for serialization.

use crate::address::{Address, AddressList};
use crate::encoding::{decode_base64, encode_rfc2047_q};
use crate::error::Result;
use crate::header::Headers;
use crate::message::{BodyKind, Message};
use chrono::{DateTime, FixedOffset, Utc};
use tracing::debug;

/// File content to attach to an [`Email`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name; only its final path component is used.
    pub filename: String,
    /// Raw file content.
    pub data: Vec<u8>,
    /// Optional explicit part headers.
    pub headers: Option<Headers>,
}

impl Attachment {
    /// Creates an attachment from raw bytes.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
            headers: None,
        }
    }

    /// Creates an attachment from standard base64 content.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Base64Decode`] if `encoded` is not valid base64.
    pub fn from_base64(filename: impl Into<String>, encoded: &str) -> Result<Self> {
        Ok(Self::new(filename, decode_base64(encoded)?))
    }

    /// Sets explicit part headers (e.g. `Content-Type`).
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// An email to compose.
#[derive(Debug, Clone, Default)]
pub struct Email {
    /// Sender; also used as `Reply-To`.
    pub from: Address,
    /// Primary recipients.
    pub to: AddressList,
    /// Carbon-copy recipients.
    pub cc: AddressList,
    /// Blind carbon-copy recipients.
    pub bcc: AddressList,
    /// Subject line, unencoded.
    pub subject: String,
    /// Body text or HTML; its type is detected from the content.
    pub body: String,
    /// Attachments, in order.
    pub attachments: Vec<Attachment>,
    /// `Message-Id` of the message being replied to.
    pub in_reply_to: Option<String>,
    /// `Message-Id`s of the conversation.
    pub references: Vec<String>,
    /// Extra headers, applied last.
    pub custom_headers: Vec<(String, String)>,
    /// Date to stamp; the current time when unset.
    pub date: Option<DateTime<FixedOffset>>,
}

impl Email {
    /// Creates an email from `from` with no recipients or content.
    #[must_use]
    pub fn new(from: Address) -> Self {
        Self {
            from,
            ..Self::default()
        }
    }

    /// Builds the MIME message.
    ///
    /// # Errors
    ///
    /// Returns an error if an attachment name is invalid or the body cannot
    /// be set.
    pub fn into_message(self) -> Result<Message> {
        let mut headers = Headers::new();

        headers.set("From", self.from.address.as_str());
        headers.set("Reply-To", self.from.address.as_str());

        if !self.to.is_empty() {
            headers.set("To", self.to.render(true));
        }
        // Some providers only accept the lowercase spelling.
        if !self.cc.is_empty() {
            headers.set("cc", self.cc.render(true));
        }
        if !self.bcc.is_empty() {
            headers.set("bcc", self.bcc.render(true));
        }

        if !self.subject.is_empty() {
            headers.set("Subject", encode_rfc2047_q(&self.subject, "utf-8"));
        }

        if let Some(in_reply_to) = self.in_reply_to.as_deref().filter(|id| !id.is_empty())
            && !self.references.is_empty()
        {
            headers.set("In-Reply-To", in_reply_to);
            for id in &self.references {
                headers.add("References", id.as_str());
            }
        }

        let date = self
            .date
            .unwrap_or_else(|| Utc::now().fixed_offset());
        headers.set("Date", date.to_rfc2822());

        for (name, value) in &self.custom_headers {
            headers.set(name.as_str(), value.as_str());
        }

        let mut message = Message::new(headers);
        for attachment in self.attachments {
            message.attach(&attachment.filename, attachment.data, attachment.headers)?;
        }
        if !self.body.is_empty() {
            message.set_body(self.body, BodyKind::Auto, None)?;
        }

        debug!(
            recipients = self.to.len() + self.cc.len() + self.bcc.len(),
            parts = message.len(),
            "Composed email"
        );
        Ok(message)
    }
}
