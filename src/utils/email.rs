use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::instrument;

use schoolhub_config::EmailConfig;
use schoolhub_core::{AppError, DomainError};

/// SMTP mail capability. With `SMTP_ENABLED=false` messages are logged and
/// dropped instead of sent.
#[derive(Debug, Clone)]
pub struct Mailer {
    config: EmailConfig,
}

impl Mailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.config.frontend_url.trim_end_matches('/'),
            token
        )
    }

    /// Sends an HTML message. Any delivery failure becomes
    /// [`DomainError::EmailDeliveryFailed`]; the cause is only logged.
    #[instrument(skip(self, html_body))]
    pub async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::info!(to, subject, "Mail delivery disabled, skipping send");
            return Ok(());
        }

        let message = self.build_message(to, subject, html_body).map_err(|e| {
            tracing::error!(error = %e, "Failed to build email");
            DomainError::EmailDeliveryFailed
        })?;
        let mailer = self.transport().map_err(|e| {
            tracing::error!(error = %e, "Failed to create SMTP transport");
            DomainError::EmailDeliveryFailed
        })?;

        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Email task panicked");
                DomainError::EmailDeliveryFailed
            })?
            .map_err(|e| {
                tracing::error!(error = %e, "SMTP send failed");
                DomainError::EmailDeliveryFailed
            })?;

        Ok(())
    }

    fn build_message(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<Message> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let message = Message::builder()
            .from(from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(strip_tags(html_body)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;
        Ok(message)
    }

    fn transport(&self) -> anyhow::Result<SmtpTransport> {
        if self.config.smtp_username.is_empty() {
            return Ok(SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build());
        }

        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );
        Ok(SmtpTransport::relay(&self.config.smtp_host)?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build())
    }
}

/// Crude plain-text fallback for the HTML templates below.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escapes text interpolated into the HTML templates.
fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <div style="max-width: 600px; margin: 0 auto; background: #ffffff; border-radius: 8px; overflow: hidden;">
        <div style="background-color: #0F766E; padding: 24px; text-align: center;">
            <h1 style="margin: 0; color: #ffffff; font-size: 26px;">SchoolHub</h1>
        </div>
        <div style="padding: 32px; color: #333333; font-size: 15px; line-height: 1.6;">
{body}
        </div>
        <div style="background-color: #f8f8f8; padding: 16px; text-align: center; color: #888888; font-size: 12px;">
            <p>This is an automated message from SchoolHub. Please do not reply.</p>
        </div>
    </div>
</body>
</html>"#
    )
}

pub fn password_reset_template(name: &str, reset_link: &str) -> String {
    let name = escape_html(name);
    let reset_link = escape_html(reset_link);
    layout(
        "Password Reset Request",
        &format!(
            r#"            <p>Hi {name},</p>
            <p>We received a request to reset your password. Use the link below to choose a new one:</p>
            <p style="text-align: center;"><a href="{reset_link}" style="display: inline-block; padding: 12px 28px; background-color: #0F766E; color: #ffffff; text-decoration: none; border-radius: 6px;">Reset Password</a></p>
            <p>Or copy this address into your browser:</p>
            <p style="word-break: break-all;">{reset_link}</p>
            <p>The link expires in 1 hour. If you did not ask for a reset you can ignore this email.</p>"#
        ),
    )
}

pub fn password_changed_template(name: &str) -> String {
    let name = escape_html(name);
    layout(
        "Password Changed",
        &format!(
            r#"            <p>Hi {name},</p>
            <p>Your SchoolHub password was just changed.</p>
            <p>If you did not make this change, contact your school administrator immediately.</p>"#
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool) -> EmailConfig {
        EmailConfig {
            enabled,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@schoolhub.test".to_string(),
            from_name: "SchoolHub".to_string(),
            frontend_url: "http://localhost:5173/".to_string(),
        }
    }

    #[test]
    fn test_reset_link() {
        let mailer = Mailer::new(config(false));
        assert_eq!(
            mailer.reset_link("abc123"),
            "http://localhost:5173/reset-password?token=abc123"
        );
    }

    #[test]
    fn test_reset_template_contains_link_and_name() {
        let html = password_reset_template("Ada", "http://x/reset-password?token=t");
        assert!(html.contains("Hi Ada"));
        assert!(html.contains("http://x/reset-password?token=t"));
        assert!(html.contains("1 hour"));
    }

    #[test]
    fn test_templates_escape_names() {
        let name = r#"<img src=x onerror="alert(1)">"#;
        for html in [
            password_reset_template(name, "http://x/reset-password?token=t"),
            password_changed_template(name),
        ] {
            assert!(!html.contains("<img"));
            assert!(html.contains("Hi &lt;img src=x onerror=&quot;alert(1)&quot;&gt;"));
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("Tom & 'Jerry'"), "Tom &amp; &#x27;Jerry&#x27;");
        assert_eq!(escape_html("Ada"), "Ada");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hi <b>Ada</b></p>\n<p>Bye</p>"), "Hi Ada\nBye");
    }

    #[tokio::test]
    async fn test_disabled_mailer_skips_send() {
        let mailer = Mailer::new(config(false));
        assert!(mailer.send("a@b.test", "Subject", "<p>x</p>").await.is_ok());
    }

    #[test]
    fn test_invalid_recipient_fails_to_build() {
        let mailer = Mailer::new(config(true));
        assert!(mailer.build_message("not an email", "s", "<p>x</p>").is_err());
    }
}
