use async_trait::async_trait;
use lettre::{
    address::AddressError,
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::services::email_templates::MailContext;
use crate::services::smtp_mailer::Mailer;

use super::MailError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub tls_disabled: bool,
}

impl SmtpSettings {
    pub fn from_env() -> Result<Self, MailError> {
        let var = |key: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
        };

        let host = var("SMTP_HOST").ok_or_else(|| MailError::EnvVarMissing("SMTP_HOST".into()))?;
        let port = match var("SMTP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| MailError::Other(format!("SMTP_PORT: {}", e)))?,
            None => 587,
        };
        // Prefer a generic EMAIL_FROM; fall back to SMTP_FROM
        let from = var("EMAIL_FROM")
            .or_else(|| var("SMTP_FROM"))
            .ok_or_else(|| MailError::EnvVarMissing("EMAIL_FROM or SMTP_FROM".into()))?;
        let tls_disabled = var("SMTP_TLS_DISABLED")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(SmtpSettings {
            host,
            port,
            username: var("SMTP_USERNAME"),
            password: var("SMTP_PASSWORD"),
            from,
            tls_disabled,
        })
    }
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    sender: Mailbox,
    context: MailContext,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings, context: MailContext) -> Result<Self, MailError> {
        let sender: Mailbox = settings.from.parse()?;
        let transport = build_transport(settings)?;

        Ok(Self {
            transport: Arc::new(transport),
            sender,
            context,
        })
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.sender.clone())
            .to(to
                .parse()
                .map_err(|e: AddressError| MailError::InvalidEmailAddress(e.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| e.into())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn context(&self) -> &MailContext {
        &self.context
    }

    async fn send_email_generic(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), MailError> {
        self.send_email(to, subject, html).await
    }
}

fn build_transport(settings: &SmtpSettings) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
    if settings.tls_disabled {
        return Ok(
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .port(settings.port)
                .build(),
        );
    }

    let tls = TlsParameters::new(settings.host.clone())?;
    let mut builder = if settings.port == 465 {
        AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
            .port(settings.port)
            .tls(Tls::Wrapper(tls))
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .tls(Tls::Required(tls))
    };

    if let (Some(username), Some(password)) =
        (settings.username.as_ref(), settings.password.as_ref())
    {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    Ok(builder.build())
}
