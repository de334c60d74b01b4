use time::Duration;

/// What mailers need to turn a token into a clickable link.
#[derive(Debug, Clone)]
pub struct MailContext {
    pub app_url: String,
    pub reset_ttl: Duration,
}

impl MailContext {
    pub fn new(app_url: &str, reset_ttl: Duration) -> Self {
        MailContext {
            app_url: app_url.trim_end_matches('/').to_string(),
            reset_ttl,
        }
    }

    pub fn verification_url(&self, token: &str) -> String {
        format!(
            "{}/verify-email?token={}",
            self.app_url,
            urlencoding::encode(token)
        )
    }

    pub fn reset_url(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.app_url,
            urlencoding::encode(token)
        )
    }
}

impl Default for MailContext {
    fn default() -> Self {
        MailContext::new("http://localhost:3001", Duration::hours(1))
    }
}

pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(preview: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head><meta charset="utf-8"><title>{preview}</title></head>
  <body style="background-color:#ffffff;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;">
    <div style="margin:0 auto;padding:20px 0 48px;max-width:560px;font-size:16px;line-height:26px;">
{body}
    </div>
  </body>
</html>"#
    )
}

fn button(url: &str, label: &str) -> String {
    format!(
        r#"      <p style="padding:27px 0;"><a href="{url}" style="background-color:#A4C639;border-radius:4px;color:#fff;padding:12px 20px;text-decoration:none;display:block;text-align:center;">{label}</a></p>
      <p>Or copy and paste this URL into your browser:</p>
      <p><a href="{url}" style="color:#A4C639;text-decoration:underline;">{url}</a></p>"#
    )
}

pub fn verification_email(name: &str, url: &str) -> RenderedEmail {
    let url = escape_html(url);
    let body = format!(
        r#"      <p>Hi {name},</p>
      <p>Thank you for registering. Please verify your email address by clicking the button below:</p>
{button}
      <hr style="border-color:#cccccc;margin:20px 0;">
      <p style="color:#8898aa;font-size:12px;">If you did not create an account, you can safely ignore this email.</p>"#,
        name = escape_html(name),
        button = button(&url, "Verify Email"),
    );

    RenderedEmail {
        subject: "Verify your email address".to_string(),
        html: layout("Verify your email address", &body),
    }
}

pub fn reset_email(name: &str, url: &str, ttl: Duration) -> RenderedEmail {
    let url = escape_html(url);
    let body = format!(
        r#"      <p>Hi {name},</p>
      <p>We received a request to reset your password. Click the button below to choose a new one:</p>
{button}
      <hr style="border-color:#cccccc;margin:20px 0;">
      <p style="color:#8898aa;font-size:12px;">This link will expire in {expiry}. If you did not request a password reset, you can safely ignore this email.</p>"#,
        name = escape_html(name),
        button = button(&url, "Reset Password"),
        expiry = describe_duration(ttl),
    );

    RenderedEmail {
        subject: "Reset your password".to_string(),
        html: layout("Reset your password", &body),
    }
}

fn describe_duration(ttl: Duration) -> String {
    let minutes = ttl.whole_minutes();
    if minutes > 0 && minutes % 60 == 0 {
        let hours = minutes / 60;
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{hours} hours")
        }
    } else if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}
