//! Submission seam between message assembly and a mail provider.

use crate::error::Result;
use crate::token::AccessToken;
use mailpost_mime::Message;
use std::future::Future;
use tracing::debug;

/// Delivers a serialized RFC 5322 message.
pub trait Submitter {
    /// Submits `raw` on behalf of the token's owner.
    ///
    /// Resolves to the `Message-Id` the provider assigned, or an empty string
    /// if it did not report one.
    fn submit(&self, raw: &[u8], token: &AccessToken)
    -> impl Future<Output = Result<String>> + Send;
}

/// Serializes `message` and submits it.
///
/// A message that fails to serialize is never submitted.
///
/// # Errors
///
/// Returns [`crate::Error::Mime`] if serialization fails, otherwise whatever
/// the submitter reports.
pub async fn send<S: Submitter>(
    message: &Message,
    submitter: &S,
    token: &AccessToken,
) -> Result<String> {
    let raw = message.to_bytes()?;
    debug!(bytes = raw.len(), "Serialized message for submission");
    submitter.submit(&raw, token).await
}
