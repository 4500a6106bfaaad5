//! Composes an email with an attachment and sends it through Gmail.
//!
//! ```sh
//! GMAIL_ACCESS_TOKEN=ya29... MAIL_FROM=me@gmail.com MAIL_TO=you@example.com \
//!     cargo run -p mailpost-gmail --example send_gmail
//! ```
//!
//! Set `MAIL_DRY_RUN=1` to print the serialized message instead of sending.

use mailpost_gmail::{AccessToken, GmailClient, GmailConfig, send};
use mailpost_mime::{Address, Attachment, Email};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailpost_mime=debug,mailpost_gmail=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut email = Email::new(Address::with_name(
        "Sender",
        env_or("MAIL_FROM", "sender@example.com"),
    ));
    email.to.push(Address::with_name(
        "To recipient",
        env_or("MAIL_TO", "to@example.com"),
    ));
    if let Ok(cc) = std::env::var("MAIL_CC") {
        email.cc.push(Address::with_name("Cc recipient", cc));
    }
    email.subject = "The subject of the email".to_string();
    email.body = "<html><body><p>This is a paragraph</p></body></html>".to_string();
    email
        .attachments
        .push(Attachment::from_base64("TheNameOfTheFile.txt", "SGVsbG8gZnJvbSBtYWlscG9zdCE=")?);
    email
        .custom_headers
        .push(("X-Custom-Header".to_string(), "header value".to_string()));

    let message = email.into_message()?;

    if std::env::var_os("MAIL_DRY_RUN").is_some() {
        let raw = message.to_bytes()?;
        println!("{}", String::from_utf8_lossy(&raw));
        return Ok(());
    }

    let token = AccessToken::new(std::env::var("GMAIL_ACCESS_TOKEN")?);
    let client = GmailClient::new(GmailConfig::default())?;

    info!("Sending message");
    let message_id = send(&message, &client, &token).await?;
    println!("Message-Id: {message_id}");
    Ok(())
}
