use crate::config::email::EmailConfig;
use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
}

impl EmailService {
    /// Build from environment variables. Without SMTP settings every send is
    /// skipped and reported as success.
    pub fn from_env() -> Self {
        let Some(cfg) = EmailConfig::from_env() else {
            return Self::disabled();
        };

        let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map(|builder| builder.port(cfg.smtp_port).credentials(creds).build());

        match transport {
            Ok(t) => Self {
                transport: Some(t),
                from_address: Some(cfg.from_address),
            },
            Err(e) => {
                tracing::warn!("Failed to build SMTP transport: {e}");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_address: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn send_verification_code(
        &self,
        to: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<()> {
        let body = render_verification_email(code, ttl_minutes);
        self.send_html(to, "Your Burrow verification code", body)
            .await
    }

    async fn send_html(&self, to: &str, subject: &str, body: String) -> Result<()> {
        let (Some(transport), Some(from_address)) = (&self.transport, &self.from_address) else {
            tracing::debug!("SMTP not configured, skipping email to {to}");
            return Ok(());
        };

        let from_mailbox: Mailbox =
            from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    anyhow::anyhow!("Invalid from address '{}': {}", from_address, e)
                })?;
        let to_mailbox: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            anyhow::anyhow!("Invalid to address '{}': {}", to, e)
        })?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)?;

        transport.send(email).await?;
        tracing::info!("Email sent to {to}: {subject}");
        Ok(())
    }
}

fn render_verification_email(code: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; background: #f6f6f6; padding: 24px;">
    <div style="max-width: 480px; margin: 0 auto; background: #ffffff; border-radius: 8px; padding: 32px;">
      <h2 style="margin-top: 0;">Verify your email</h2>
      <p>Enter this code to finish creating your Burrow account:</p>
      <p style="font-size: 32px; font-weight: bold; letter-spacing: 8px; text-align: center;">{code}</p>
      <p>This code expires in {ttl_minutes} minutes.</p>
      <p style="color: #888888; font-size: 12px;">If you did not request this code, you can ignore this email.</p>
    </div>
  </body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_email_contains_code_and_expiry() {
        let html = render_verification_email("123456", 10);
        assert!(html.contains("123456"));
        assert!(html.contains("10 minutes"));
    }

    #[tokio::test]
    async fn unconfigured_send_is_skipped() {
        let service = EmailService::disabled();
        assert!(!service.is_configured());
        service
            .send_verification_code("a@school.edu", "123456", 10)
            .await
            .unwrap();
    }
}
