//! # mailpost-gmail
//!
//! Submits [`mailpost_mime`] messages through the Gmail REST API.
//!
//! Token acquisition is out of scope: callers bring a valid OAuth2 access
//! token with a Gmail send scope.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailpost_gmail::{AccessToken, GmailClient, GmailConfig, send};
//! use mailpost_mime::{Address, Email};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut email = Email::new(Address::with_name("Sender", "sender@example.com"));
//! email.to.push(Address::new("to@example.com"));
//! email.subject = "Hello".into();
//! email.body = "Hi there".into();
//!
//! let client = GmailClient::new(GmailConfig::default())?;
//! let token = AccessToken::new("ya29....");
//! let message_id = send(&email.into_message()?, &client, &token).await?;
//! println!("Message-Id: {message_id}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod gmail;
mod submit;
mod token;

pub use error::{Error, Result};
pub use gmail::{GmailClient, GmailConfig};
pub use submit::{Submitter, send};
pub use token::AccessToken;
