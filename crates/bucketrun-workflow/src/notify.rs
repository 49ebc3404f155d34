//! Notification hand-off at the end of a workflow run.
//!
//! A [`Notifier`] receives one string payload and owns its delivery; the
//! workflow never looks at the result.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_ses::error::{BuildError, DisplayErrorContext};
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use tracing::{info, warn};

/// Default subject line for e-mailed payloads.
pub const DEFAULT_SUBJECT: &str = "bucketrun workflow report";

/// One-way consumer of the workflow's final payload.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hand `content` off for delivery. Delivery failures are the
    /// implementation's concern.
    async fn notify(&self, content: String);
}

/// Notifier that records the hand-off in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, content: String) {
        info!(bytes = content.len(), content = %content, "notification handed off");
    }
}

/// Notifier that e-mails the payload as plain text through Amazon SES.
#[derive(Debug, Clone)]
pub struct SesNotifier {
    client: aws_sdk_ses::Client,
    from: String,
    to: Vec<String>,
    subject: String,
}

impl SesNotifier {
    /// Send from `from` to every address in `to`.
    pub fn new(client: aws_sdk_ses::Client, from: impl Into<String>, to: Vec<String>) -> Self {
        Self {
            client,
            from: from.into(),
            to,
            subject: DEFAULT_SUBJECT.to_owned(),
        }
    }

    /// Override the subject line.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    async fn send(&self, content: String) -> anyhow::Result<()> {
        let message = plain_text_message(&self.subject, content)?;
        let destination = Destination::builder()
            .set_to_addresses(Some(self.to.clone()))
            .build();

        self.client
            .send_email()
            .source(&self.from)
            .destination(destination)
            .message(message)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(&e)))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SesNotifier {
    async fn notify(&self, content: String) {
        match self.send(content).await {
            Ok(()) => info!(from = %self.from, to = ?self.to, "notification e-mail sent"),
            Err(e) => warn!(from = %self.from, to = ?self.to, error = %e, "unable to send notification e-mail"),
        }
    }
}

/// Build a UTF-8 plain-text message.
fn plain_text_message(subject: &str, content: String) -> Result<Message, BuildError> {
    let subject = Content::builder().data(subject).charset("UTF-8").build()?;
    let text = Content::builder().data(content).charset("UTF-8").build()?;
    Ok(Message::builder()
        .subject(subject)
        .body(Body::builder().text(text).build())
        .build())
}

/// Read the notification payload, falling back to an empty string.
pub async fn load_payload(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unable to read notification payload");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn test_should_load_payload_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"see you there").expect("write payload");

        assert_eq!(load_payload(file.path()).await, "see you there");
    }

    #[tokio::test]
    async fn test_should_fall_back_to_empty_payload() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert_eq!(load_payload(&dir.path().join("missing.txt")).await, "");
    }

    #[tokio::test]
    async fn test_should_accept_any_payload_in_log_notifier() {
        LogNotifier.notify(String::new()).await;
        LogNotifier.notify("payload".to_owned()).await;
    }

    #[test]
    fn test_should_build_plain_text_message() {
        let message =
            plain_text_message("RSVP", "see you there".to_owned()).expect("message builds");

        assert_eq!(message.subject().map(Content::data), Some("RSVP"));
        assert_eq!(
            message.body().and_then(Body::text).map(Content::data),
            Some("see you there")
        );
        assert_eq!(
            message.body().and_then(Body::text).and_then(Content::charset),
            Some("UTF-8")
        );
    }

    #[test]
    fn test_should_build_message_for_empty_payload() {
        let message = plain_text_message(DEFAULT_SUBJECT, String::new()).expect("message builds");
        assert_eq!(
            message.body().and_then(Body::text).map(Content::data),
            Some("")
        );
    }

    #[test]
    fn test_should_override_subject() {
        let config = aws_sdk_ses::Config::builder()
            .behavior_version(aws_sdk_ses::config::BehaviorVersion::latest())
            .region(aws_sdk_ses::config::Region::new("us-west-1"))
            .build();
        let notifier = SesNotifier::new(
            aws_sdk_ses::Client::from_conf(config),
            "hosts@example.com",
            vec!["guest@example.com".to_owned()],
        );
        assert_eq!(notifier.subject, DEFAULT_SUBJECT);
        assert_eq!(notifier.with_subject("RSVP").subject, "RSVP");
    }
}
