//! SMTP delivery of report artifacts

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use libfigrep_core::{EmailConfig, FigrepError, SmtpSecurity};
use tracing::info;

use crate::context::Artifact;

fn mailbox(field: &str, value: &str) -> Result<Mailbox, FigrepError> {
    value
        .parse()
        .map_err(|e| FigrepError::InvalidConfig(format!("email.{} {:?} is not an address: {}", field, value, e)))
}

/// Compose the mail: plain-text body plus the artifact as attachment
pub fn build_message(email: &EmailConfig, artifact: &Artifact) -> Result<Message, FigrepError> {
    let mut builder = Message::builder()
        .from(mailbox("from", &email.from)?)
        .subject(email.subject.clone());
    for to in &email.to {
        builder = builder.to(mailbox("to", to)?);
    }

    let content_type = ContentType::parse(artifact.format.mime_type())
        .map_err(|e| FigrepError::Internal(format!("content type: {}", e)))?;
    let attachment = Attachment::new(email.attachment_name(artifact.format)).body(artifact.bytes.clone(), content_type);

    builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(email.body.clone()))
                .singlepart(attachment),
        )
        .map_err(|e| FigrepError::Delivery(e.to_string()))
}

fn transport(email: &EmailConfig) -> Result<SmtpTransport, FigrepError> {
    let builder = match email.security {
        SmtpSecurity::Tls => {
            SmtpTransport::relay(&email.smtp_host).map_err(|e| FigrepError::Delivery(e.to_string()))?
        }
        SmtpSecurity::Starttls => {
            SmtpTransport::starttls_relay(&email.smtp_host).map_err(|e| FigrepError::Delivery(e.to_string()))?
        }
        SmtpSecurity::None => SmtpTransport::builder_dangerous(&email.smtp_host),
    };

    let mut builder = builder.port(email.smtp_port);
    if let (Some(username), Some(password)) = (&email.username, &email.password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }
    Ok(builder.build())
}

/// Send the artifact to every configured recipient
pub fn send_report(email: &EmailConfig, artifact: &Artifact) -> Result<(), FigrepError> {
    let message = build_message(email, artifact)?;
    transport(email)?
        .send(&message)
        .map_err(|e| FigrepError::Delivery(e.to_string()))?;
    info!(
        host = %email.smtp_host,
        recipients = email.to.len(),
        bytes = artifact.bytes.len(),
        "report sent"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libfigrep_core::{ReportFormat, RunSummary};

    fn email() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            from: "Reports <reports@example.com>".to_string(),
            to: vec!["team@example.com".to_string(), "lead@example.com".to_string()],
            subject: "Weekly comments".to_string(),
            body: "Attached.".to_string(),
            ..EmailConfig::default()
        }
    }

    fn artifact() -> Artifact {
        Artifact {
            bytes: b"\xEF\xBB\xBFFile;Comment\n".to_vec(),
            format: ReportFormat::Csv,
            summary: RunSummary::default(),
        }
    }

    #[test]
    fn test_message_headers_and_attachment() {
        let message = build_message(&email(), &artifact()).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();

        assert!(raw.contains("Subject: Weekly comments"));
        assert!(raw.contains("team@example.com"));
        assert!(raw.contains("lead@example.com"));
        assert!(raw.contains("figma_comments.csv"));
        assert!(raw.contains("text/csv"));
    }

    #[test]
    fn test_attachment_name_override() {
        let mut config = email();
        config.attachment_name = Some("weekly.csv".to_string());
        let message = build_message(&config, &artifact()).unwrap();
        assert!(String::from_utf8_lossy(&message.formatted()).contains("weekly.csv"));
    }

    #[test]
    fn test_bad_recipient_is_config_error() {
        let mut config = email();
        config.to = vec!["not an address".to_string()];
        let err = build_message(&config, &artifact()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
