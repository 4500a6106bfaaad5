//! Gmail REST API client.

use crate::error::{Error, Result};
use crate::submit::Submitter;
use crate::token::AccessToken;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

/// Gmail API client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailConfig {
    /// API root, ending in `/`.
    pub base_url: String,
    /// Mailbox to send as; `me` is the token's owner.
    pub user_id: String,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gmail.googleapis.com/gmail/v1/".to_string(),
            user_id: "me".to_string(),
            user_agent: concat!("mailpost/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Body of `users.messages.send`.
#[derive(Debug, Serialize)]
struct SendRequest {
    raw: String,
}

/// Reply of `users.messages.send`.
#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// Reply of `users.messages.get` with `format=metadata`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessageMetadata {
    payload: Option<Payload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Payload {
    headers: Vec<HeaderEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HeaderEntry {
    name: String,
    value: String,
}

impl MessageMetadata {
    /// Returns the `Message-Id` header value, or `""` if absent.
    fn message_id(&self) -> &str {
        self.payload
            .as_ref()
            .and_then(|payload| {
                payload
                    .headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case("Message-Id"))
            })
            .map_or("", |h| h.value.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extracts the provider's error message from a reply body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|response| response.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Submits messages through the Gmail REST API.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    base_url: Url,
    user_id: String,
}

impl GmailClient {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute HTTP(S) URL, the
    /// user id is empty, or the HTTP client cannot be built.
    pub fn new(config: GmailConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "base URL must be http(s): {}",
                config.base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        if config.user_id.is_empty() {
            return Err(Error::InvalidConfig("user id is empty".to_string()));
        }

        let http = Client::builder().user_agent(config.user_agent).build()?;
        Ok(Self {
            http,
            base_url,
            user_id: config.user_id,
        })
    }

    /// Builds `<base>/users/<user>/<segments...>`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidConfig("base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .push("users")
            .push(&self.user_id)
            .extend(segments);
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = api_error_message(&body);
            warn!(status = status.as_u16(), %message, "Gmail API request failed");
            return Err(Error::api(status.as_u16(), message));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends a raw RFC 5322 message and returns the id Gmail assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Gmail rejects the message.
    pub async fn send_raw(&self, raw: &[u8], token: &AccessToken) -> Result<String> {
        let url = self.endpoint(&["messages", "send"])?;
        debug!(%url, bytes = raw.len(), "Sending message");

        let response = self
            .http
            .post(url)
            .bearer_auth(token.secret())
            .json(&SendRequest {
                raw: URL_SAFE_NO_PAD.encode(raw),
            })
            .send()
            .await?;

        let sent: SentMessage = Self::read_json(response).await?;
        info!(id = %sent.id, "Message sent");
        Ok(sent.id)
    }

    /// Fetches the `Message-Id` header of a stored message.
    ///
    /// Returns an empty string if Gmail reports no such header.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Gmail rejects it.
    pub async fn message_id(&self, id: &str, token: &AccessToken) -> Result<String> {
        let mut url = self.endpoint(&["messages", id])?;
        url.query_pairs_mut()
            .append_pair("format", "metadata")
            .append_pair("metadataHeaders", "Message-Id");
        debug!(%url, "Fetching message metadata");

        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await?;

        let metadata: MessageMetadata = Self::read_json(response).await?;
        Ok(metadata.message_id().to_string())
    }
}

impl Submitter for GmailClient {
    async fn submit(&self, raw: &[u8], token: &AccessToken) -> Result<String> {
        let id = self.send_raw(raw, token).await?;
        self.message_id(&id, token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GmailConfig::default();
        assert_eq!(config.base_url, "https://gmail.googleapis.com/gmail/v1/");
        assert_eq!(config.user_id, "me");
        assert!(config.user_agent.starts_with("mailpost/"));
    }

    #[test]
    fn test_config_partial_json() {
        let config: GmailConfig =
            serde_json::from_str(r#"{"user_id": "someone@example.com"}"#).unwrap();
        assert_eq!(config.user_id, "someone@example.com");
        assert_eq!(config.base_url, GmailConfig::default().base_url);
    }

    #[test]
    fn test_client_rejects_bad_config() {
        let bad_url = GmailConfig {
            base_url: "not a url".into(),
            ..GmailConfig::default()
        };
        assert!(matches!(GmailClient::new(bad_url), Err(Error::Url(_))));

        let bad_scheme = GmailConfig {
            base_url: "ftp://example.com/".into(),
            ..GmailConfig::default()
        };
        assert!(matches!(GmailClient::new(bad_scheme), Err(Error::InvalidConfig(_))));

        let no_user = GmailConfig {
            user_id: String::new(),
            ..GmailConfig::default()
        };
        assert!(matches!(GmailClient::new(no_user), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_endpoint() {
        let client = GmailClient::new(GmailConfig::default()).unwrap();
        assert_eq!(
            client.endpoint(&["messages", "send"]).unwrap().as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/send"
        );
    }

    #[test]
    fn test_endpoint_adds_missing_slash() {
        let client = GmailClient::new(GmailConfig {
            base_url: "http://localhost:8080/api".into(),
            user_id: "a b@example.com".into(),
            ..GmailConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint(&["messages", "x"]).unwrap().as_str(),
            "http://localhost:8080/api/users/a%20b@example.com/messages/x"
        );
    }

    #[test]
    fn test_message_id_lookup() {
        let metadata: MessageMetadata = serde_json::from_str(
            r#"{"id":"1","payload":{"headers":[
                {"name":"Subject","value":"Hi"},
                {"name":"Message-ID","value":"<abc@mail.gmail.com>"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(metadata.message_id(), "<abc@mail.gmail.com>");

        let empty: MessageMetadata = serde_json::from_str(r#"{"id":"1"}"#).unwrap();
        assert_eq!(empty.message_id(), "");
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":401,"message":"Invalid Credentials","status":"UNAUTHENTICATED"}}"#;
        assert_eq!(api_error_message(body), "Invalid Credentials");
        assert_eq!(api_error_message(" upstream timeout \n"), "upstream timeout");
    }

    #[test]
    fn test_send_request_encoding() {
        let body = serde_json::to_string(&SendRequest {
            raw: URL_SAFE_NO_PAD.encode(b"\xFB\xFF"),
        })
        .unwrap();
        assert_eq!(body, r#"{"raw":"-_8"}"#);
    }
}
