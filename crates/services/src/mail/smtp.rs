use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use socium_config::MailSettings;
use tracing::debug;

use super::{MailError, MailMessage, Mailer};

/// Delivers digests through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Builds the transport from `mail.smtp_*`. Returns `None` when no host is
    /// configured. No connection is opened until the first send.
    pub fn from_settings(settings: &MailSettings) -> Result<Option<Self>, MailError> {
        let Some(host) = settings.smtp_host.as_deref() else {
            return Ok(None);
        };

        let mut builder = if settings.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::Delivery(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        builder = builder.port(settings.smtp_port);

        if let (Some(username), Some(password)) = (&settings.smtp_username, &settings.smtp_password)
        {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Some(Self {
            transport: builder.build(),
        }))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let to = message.to.clone();
        let email = build_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        debug!(%to, "Digest delivered over SMTP");
        Ok(())
    }
}

fn build_message(message: MailMessage) -> Result<Message, MailError> {
    let from = message
        .from
        .parse()
        .map_err(|e| MailError::Delivery(format!("Invalid sender {}: {e}", message.from)))?;
    let to = message
        .to
        .parse()
        .map_err(|e| MailError::Delivery(format!("Invalid recipient {}: {e}", message.to)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(message.body)
        .map_err(|e| MailError::Delivery(e.to_string()))
}
