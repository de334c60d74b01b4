use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::services::email_templates::MailContext;
use crate::services::smtp_mailer::{MailError, Mailer};

const RESEND_API_BASE: &str = "https://api.resend.com";

/// Sends through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendMailer {
    api_key: String,
    from: String,
    base_url: String,
    http: Client,
    context: MailContext,
}

impl ResendMailer {
    pub fn from_env(http: &Client, context: MailContext) -> Result<Self, MailError> {
        let api_key = std::env::var("RESEND_API_KEY")
            .map_err(|_| MailError::EnvVarMissing("RESEND_API_KEY".into()))?;
        let from = std::env::var("EMAIL_FROM")
            .map_err(|_| MailError::EnvVarMissing("EMAIL_FROM".into()))?;

        Ok(Self::new(http, &api_key, &from, RESEND_API_BASE, context))
    }

    pub fn new(
        http: &Client,
        api_key: &str,
        from: &str,
        base_url: &str,
        context: MailContext,
    ) -> Self {
        Self {
            api_key: api_key.to_string(),
            from: from.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: http.clone(),
            context,
        }
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let payload = json!({
            "from": self.from,
            "to": [to],
            "subject": subject,
            "html": html,
        });

        let resp = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::SendError(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_default();
        let detail = format!("Resend send failed: {} {}", status, text);
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(MailError::SendError(detail))
        } else {
            Err(MailError::Rejected(detail))
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    fn context(&self) -> &MailContext {
        &self.context
    }

    async fn send_email_generic(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), MailError> {
        self.send(to, subject, html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn mailer(server: &MockServer) -> ResendMailer {
        ResendMailer::new(
            &Client::new(),
            "re_test_key",
            "Directory <noreply@example.com>",
            &server.base_url(),
            MailContext::default(),
        )
    }

    #[tokio::test]
    async fn posts_html_email_with_bearer_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/emails")
                    .header("authorization", "Bearer re_test_key")
                    .json_body_partial(
                        r#"{"to":["aoife@example.com"],"subject":"Verify your email address"}"#,
                    );
                then.status(200).json_body(json!({ "id": "msg_1" }));
            })
            .await;

        mailer(&server)
            .send_verification_email("aoife@example.com", "Aoife", "tok")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/emails");
                then.status(503).body("unavailable");
            })
            .await;

        let err = mailer(&server)
            .send_email_generic("a@b.ie", "s", "<p>x</p>")
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn validation_errors_are_permanent() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/emails");
                then.status(422)
                    .json_body(json!({ "name": "validation_error", "message": "Invalid `to` field" }));
            })
            .await;

        let err = mailer(&server)
            .send_email_generic("bad", "s", "<p>x</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Rejected(_)));
    }
}
