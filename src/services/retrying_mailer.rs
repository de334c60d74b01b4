use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::services::email_templates::MailContext;
use crate::services::smtp_mailer::{MailError, Mailer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: the wait after attempt `n` is `base_delay * n`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Retries transient failures of the wrapped mailer. Permanent failures and
/// the last transient failure are returned to the caller.
pub struct RetryingMailer {
    inner: Arc<dyn Mailer>,
    policy: RetryPolicy,
}

impl RetryingMailer {
    pub fn new(inner: Arc<dyn Mailer>, policy: RetryPolicy) -> Self {
        RetryingMailer { inner, policy }
    }
}

#[async_trait]
impl Mailer for RetryingMailer {
    fn context(&self) -> &MailContext {
        self.inner.context()
    }

    async fn send_email_generic(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), MailError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.inner.send_email_generic(to, subject, html).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    warn!(attempt, %subject, error = %err, "email send failed; retrying");
                    sleep(self.policy.delay_after(attempt)).await;
                }
                Err(err) => {
                    error!(attempt, %subject, error = %err, "email send failed");
                    return Err(err);
                }
            }
        }
    }
}
