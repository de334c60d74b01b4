pub mod account_tokens;
pub mod email_templates;
pub mod oauth;
pub mod pluggable_mailer;
pub mod registration;
pub mod resend_mailer;
pub mod retrying_mailer;
pub mod smtp_mailer;
