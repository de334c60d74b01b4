use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

use crate::services::email_templates::MailContext;
use crate::services::smtp_mailer::{MailError, Mailer, SmtpMailer, SmtpSettings};

use super::resend_mailer::ResendMailer;

#[derive(Clone)]
enum AppSender {
    Smtp(Arc<SmtpMailer>),
    Resend(Arc<ResendMailer>),
}

/// Chooses the transport from `EMAIL_PROVIDER` (`smtp` by default).
#[derive(Clone)]
pub struct PluggableMailer {
    app_sender: AppSender,
}

impl PluggableMailer {
    pub fn from_env(http: &Client, context: MailContext) -> Result<Self, MailError> {
        let provider = std::env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "smtp".into());
        let provider = provider.to_ascii_lowercase();

        match provider.as_str() {
            "smtp" => {
                let settings = SmtpSettings::from_env()?;
                let smtp = Arc::new(SmtpMailer::new(&settings, context)?);
                Ok(Self {
                    app_sender: AppSender::Smtp(smtp),
                })
            }
            "resend" => {
                let resend = Arc::new(ResendMailer::from_env(http, context)?);
                Ok(Self {
                    app_sender: AppSender::Resend(resend),
                })
            }
            other => Err(MailError::Other(format!(
                "Unsupported EMAIL_PROVIDER: {} (expected 'smtp' or 'resend')",
                other
            ))),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match &self.app_sender {
            AppSender::Smtp(_) => "smtp",
            AppSender::Resend(_) => "resend",
        }
    }
}

#[async_trait]
impl Mailer for PluggableMailer {
    fn context(&self) -> &MailContext {
        match &self.app_sender {
            AppSender::Smtp(smtp) => smtp.context(),
            AppSender::Resend(resend) => resend.context(),
        }
    }

    async fn send_email_generic(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), MailError> {
        match &self.app_sender {
            AppSender::Smtp(smtp) => smtp.send_email_generic(to, subject, html).await,
            AppSender::Resend(resend) => resend.send_email_generic(to, subject, html).await,
        }
    }
}
