//! Email service.
//!
//! Sends transactional mail over SMTP when configured. Without configuration
//! the service is a logged no-op, so environments without an SMTP relay run
//! unchanged.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tienda_common::{AppError, AppResult, EmailConfig};

/// An outgoing email.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
}

impl EmailMessage {
    /// Welcome mail sent after signup.
    #[must_use]
    pub fn welcome(to: &str, firstname: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Bienvenido a la tienda".to_string(),
            html_body: format!(
                "<h1>Hola {firstname}!</h1><p>Tu cuenta ha sido creada. Gracias por registrarte.</p>"
            ),
        }
    }

    /// Password reset mail carrying the single-use token.
    #[must_use]
    pub fn password_reset(to: &str, firstname: &str, token: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Restablece tu contraseña".to_string(),
            html_body: format!(
                "<h1>Hola {firstname}!</h1><p>Usa este código para restablecer tu contraseña (caduca en 30 minutos): <b>{token}</b></p>"
            ),
        }
    }
}

/// Email service backed by an async SMTP transport.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl EmailService {
    /// Create an email service. `None` config disables sending.
    pub fn new(config: Option<&EmailConfig>) -> AppResult<Self> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid email.from address: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport: Some(transport),
            from: Some(from),
        })
    }

    /// Create a disabled email service (all sends are logged no-ops).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            transport: None,
            from: None,
        }
    }

    /// Whether sending is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send a message, waiting for the SMTP exchange.
    pub async fn send(&self, message: EmailMessage) -> AppResult<()> {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            tracing::debug!(to = %message.to, subject = %message.subject, "Email disabled, skipping send");
            return Ok(());
        };

        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid recipient address: {e}")))?;

        let email = Message::builder()
            .from(from.clone())
            .to(to)
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body)
            .map_err(|e| AppError::Email(format!("Failed to build message: {e}")))?;

        transport
            .send(email)
            .await
            .map_err(|e| AppError::Email(format!("SMTP send failed: {e}")))?;

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }

    /// Send a message in the background. Failures are logged, never surfaced.
    pub fn send_fire_and_forget(&self, message: EmailMessage) {
        let service = self.clone();
        tokio::spawn(async move {
            let to = message.to.clone();
            if let Err(e) = service.send(message).await {
                tracing::warn!(to = %to, error = %e, "Background email failed");
            }
        });
    }
}
