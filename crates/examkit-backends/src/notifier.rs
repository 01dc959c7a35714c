//! HTTP mail-gateway notifier.
//!
//! Posts one JSON message per recipient to a mail-gateway endpoint. The
//! attachment travels base64-encoded. Status codes map onto the engine's
//! retry classification: 401 is permanent, 429/5xx/timeouts are
//! transient upstream failures.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use tracing::instrument;

use examkit_core::error::AllocationError;
use examkit_core::traits::{AssignmentMessage, Notifier};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Notifier that delivers assignment messages through an HTTP mail
/// gateway.
pub struct HttpNotifier {
    endpoint: String,
    api_key: String,
    from_name: String,
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(endpoint: &str, api_key: &str, from_name: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from_name: from_name.to_string(),
            client,
        }
    }
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    from_name: &'a str,
    to: &'a str,
    to_name: &'a str,
    subject: &'a str,
    body: &'a str,
    attachments: Vec<OutboundAttachment<'a>>,
}

#[derive(Serialize)]
struct OutboundAttachment<'a> {
    filename: &'a str,
    content_type: &'a str,
    content: String,
}

#[async_trait]
impl Notifier for HttpNotifier {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: &AssignmentMessage) -> Result<(), AllocationError> {
        let body = OutboundMessage {
            from_name: &self.from_name,
            to: &message.to,
            to_name: &message.student_name,
            subject: &message.subject,
            body: &message.body,
            attachments: vec![OutboundAttachment {
                filename: &message.attachment_name,
                content_type: &message.attachment_content_type,
                content: base64::engine::general_purpose::STANDARD.encode(&message.attachment),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AllocationError::upstream(
                        "send",
                        format!("request timed out after {DEFAULT_TIMEOUT_SECS}s"),
                    )
                } else {
                    AllocationError::upstream("send", e)
                }
            })?;

        let status = response.status().as_u16();
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(AllocationError::AuthenticationFailed(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(AllocationError::upstream(
                "send",
                format!("mail gateway returned HTTP {status}: {body}"),
            ));
        }

        tracing::debug!(status, "message accepted by mail gateway");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> AssignmentMessage {
        AssignmentMessage {
            to: "ada@example.edu".into(),
            student_name: "Ada Lovelace".into(),
            subject: "CS101: Problem Set 1".into(),
            body: "Dear Ada,".into(),
            attachment_name: "CS101_Problem Set 1_Ada Lovelace.html".into(),
            attachment: b"<html></html>".to_vec(),
            attachment_content_type: "text/html".into(),
        }
    }

    #[tokio::test]
    async fn successful_send() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "to": "ada@example.edu",
                "subject": "CS101: Problem Set 1",
            })))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(&server.uri(), "test-key", "Prof. Babbage");
        notifier.send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn authentication_failure_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(&server.uri(), "bad-key", "Prof. Babbage");
        let err = notifier.send(&message()).await.unwrap_err();
        assert!(err.is_permanent());
        assert!(err.to_string().contains("authentication"));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let notifier = HttpNotifier::new(&server.uri(), "test-key", "Prof. Babbage");
        let err = notifier.send(&message()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("503"));
    }
}
