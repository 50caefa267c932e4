use async_trait::async_trait;
use serde_json::json;

use crate::config::MailConfig;
use crate::errors::{AppError, AppResult};

/// Envoi d'emails transactionnels
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()>;
}

/// Envoi via une API HTTP transactionnelle (format Brevo: header `api-key`)
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(client: reqwest::Client, config: &MailConfig, api_key: String) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            sender: config.sender.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&json!({
                "sender": { "email": self.sender },
                "to": [{ "email": to }],
                "subject": subject,
                "htmlContent": html_body,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Email API returned {}: {}", status, body)));
        }

        tracing::info!(to, subject, "Email sent");
        Ok(())
    }
}

/// Utilisé sans MAIL_API_KEY: l'email est seulement loggé
pub struct LogMailer {
    pub sender: String,
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        tracing::warn!(
            from = %self.sender,
            to,
            subject,
            body_len = html_body.len(),
            "MAIL_API_KEY not set, email not delivered"
        );
        Ok(())
    }
}

pub const OTP_SUBJECT: &str = "Your OTP for Password Reset";

/// Corps HTML de l'email de reset password
pub fn otp_email_body(code: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Password Reset OTP</title>
</head>
<body style="font-family: 'Segoe UI', Tahoma, sans-serif; background: #EFF6FF; padding: 40px 20px;">
  <div style="max-width: 600px; margin: 0 auto; background: #ffffff; border-radius: 20px; overflow: hidden;">
    <div style="background: linear-gradient(135deg, #6366F1 0%, #3B82F6 50%, #14B8A6 100%); padding: 40px; text-align: center;">
      <h1 style="color: #ffffff; font-size: 28px;">Password Reset Request</h1>
      <p style="color: rgba(255, 255, 255, 0.9);">Secure verification code for your account</p>
    </div>
    <div style="padding: 40px;">
      <p style="color: #6B7280;">We received a request to reset your password. Use the verification code below to proceed.</p>
      <div style="border: 2px dashed #14B8A6; border-radius: 16px; padding: 30px; margin: 30px 0; text-align: center;">
        <div style="font-size: 13px; color: #0D9488; text-transform: uppercase;">Your Verification Code</div>
        <div style="font-size: 42px; font-weight: 800; color: #4F46E5; letter-spacing: 8px; font-family: 'Courier New', monospace;">{code}</div>
        <div style="font-size: 13px; color: #0D9488;">Expires in {ttl_minutes} minutes</div>
      </div>
      <p style="color: #4F46E5; font-size: 14px;">If you didn't request this password reset, please ignore this email or contact our support team.</p>
    </div>
  </div>
</body>
</html>"#
    )
}
