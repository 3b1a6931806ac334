pub mod templates;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::models::Submission;

pub struct SystemMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    parish_name: String,
}

impl SystemMailer {
    pub fn new(config: &SmtpConfig, parish_name: &str) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("System SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
            parish_name: parish_name.to_string(),
        })
    }

    pub async fn send_welcome(
        &self,
        to_email: &str,
        to_name: &str,
        base_url: &str,
    ) -> Result<(), String> {
        let html = templates::render_welcome(&self.parish_name, to_name, base_url);
        self.send(
            to_email,
            &format!("Your {} dashboard account", self.parish_name),
            &html,
        )
        .await
    }

    pub async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> Result<(), String> {
        let html = templates::render_password_reset(&self.parish_name, reset_url);
        self.send(
            to_email,
            &format!("Password reset - {}", self.parish_name),
            &html,
        )
        .await
    }

    /// Tell the parish office a new request is waiting for review.
    pub async fn send_submission_received(
        &self,
        office_email: &str,
        submission: &Submission,
        base_url: &str,
    ) -> Result<(), String> {
        let kind_label = submission
            .form_kind()
            .map(|k| k.label())
            .unwrap_or("Submission");
        let review_url = format!("{base_url}/admin/submissions/{}", submission.id);
        let html = templates::render_submission_received(
            &self.parish_name,
            kind_label,
            submission.contact_email(),
            &review_url,
        );
        self.send(office_email, &format!("New {kind_label} request"), &html)
            .await
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}
