//! One-time-passcode delivery: SMTP relay, or log-only when no relay is configured.

use std::sync::Arc;
use std::time::Duration;

use lettre::message::{MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{MailConfig, SmtpConfig};
use crate::domain::repository::OtpNotifier;
use crate::domain::types::OtpMessage;
use crate::error::NotifyError;

pub const OTP_SUBJECT: &str = "ASESystem - Your OTP Code";

/// Notifier chosen at startup from [`MailConfig`].
#[derive(Clone)]
pub enum Notifier {
    Smtp(Arc<SmtpNotifier>),
    Log(LogNotifier),
}

impl Notifier {
    pub fn from_config(config: &MailConfig) -> Result<Self, NotifyError> {
        match config.smtp {
            Some(ref smtp) => Ok(Self::Smtp(Arc::new(SmtpNotifier::new(
                smtp,
                &config.from_address,
                &config.from_name,
                Duration::from_secs(config.timeout_secs),
            )?))),
            None => Ok(Self::Log(LogNotifier)),
        }
    }
}

impl OtpNotifier for Notifier {
    async fn send_otp(&self, message: &OtpMessage) -> Result<(), NotifyError> {
        match self {
            Self::Smtp(smtp) => smtp.send_otp(message).await,
            Self::Log(log) => log.send_otp(message).await,
        }
    }
}

// ── SMTP ──────────────────────────────────────────────────────────────────────

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    pub fn new(
        config: &SmtpConfig,
        from_address: &str,
        from_name: &str,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let mut builder = if config.use_tls {
            let tls = TlsParameters::new(config.host.clone())
                .map_err(|e| NotifyError::Build(format!("TLS configuration error: {e}")))?;
            // 465 is implicit TLS; anything else negotiates STARTTLS.
            if config.port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                    .map_err(|e| NotifyError::Build(format!("SMTP relay error: {e}")))?
                    .port(config.port)
                    .tls(Tls::Wrapper(tls))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| NotifyError::Build(format!("SMTP relay error: {e}")))?
                    .port(config.port)
                    .tls(Tls::Required(tls))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.timeout(Some(timeout)).build(),
            from: format!("{from_name} <{from_address}>"),
        })
    }
}

impl OtpNotifier for SmtpNotifier {
    async fn send_otp(&self, message: &OtpMessage) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| NotifyError::InvalidAddress(format!("from: {e}")))?,
            )
            .to(message
                .to_email
                .parse()
                .map_err(|e| NotifyError::InvalidAddress(format!("to: {e}")))?)
            .subject(OTP_SUBJECT)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(render_text(message)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(render_html(message)),
                    ),
            )
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;
        tracing::info!(to = %message.to_email, "otp email sent");
        Ok(())
    }
}

// ── Log only ──────────────────────────────────────────────────────────────────

/// Development notifier: writes the code to the service log instead of mailing it.
#[derive(Clone, Copy, Default)]
pub struct LogNotifier;

impl OtpNotifier for LogNotifier {
    async fn send_otp(&self, message: &OtpMessage) -> Result<(), NotifyError> {
        tracing::warn!(
            to = %message.to_email,
            code = %message.code,
            "no SMTP relay configured; otp logged instead of mailed"
        );
        Ok(())
    }
}

// ── Templates ─────────────────────────────────────────────────────────────────

pub fn render_text(message: &OtpMessage) -> String {
    format!(
        "Hello {name},

We have generated a One-Time Password (OTP) for your ASESystem account.

Your OTP code is: {code}

This code is valid for {minutes} minutes only.
Do not share this code with anyone.

Best regards,
ASESystem Team",
        name = message.to_name,
        code = message.code,
        minutes = message.valid_minutes,
    )
}

pub fn render_html(message: &OtpMessage) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; background-color: #f4f6f9; padding: 20px;">
  <div style="max-width: 600px; margin: 0 auto; background: #ffffff; border-radius: 8px; padding: 30px;">
    <h2 style="color: #2563eb; text-align: center;">ASESystem</h2>
    <p style="font-size: 16px; color: #333;">Hello <b>{name}</b>,</p>
    <p style="font-size: 16px; color: #333;">Here is your One-Time Password (OTP) for account verification:</p>
    <div style="text-align: center; margin: 30px 0;">
      <span style="display: inline-block; font-size: 24px; font-weight: bold; color: #2563eb; background: #e0f2fe; padding: 12px 24px; border-radius: 6px; letter-spacing: 4px;">{code}</span>
    </div>
    <p style="font-size: 15px; color: #555;">This code is valid for <b>{minutes} minutes</b>. Please do not share it with anyone.</p>
    <p style="margin-top: 30px; font-size: 14px; color: #777;">Best regards,<br><b>ASESystem Team</b></p>
  </div>
</div>"#,
        name = escape_html(&message.to_name),
        code = message.code,
        minutes = message.valid_minutes,
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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
