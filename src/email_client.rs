use serde::Serialize;

use crate::error::{AppError, EmailError};
use crate::validators::is_valid_email;

/// Outbound email notifier used for password-reset mail.
///
/// Delivery is fire-and-forget from the caller's perspective: failures are
/// reported as errors to be logged, never retried inline.
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderEmail,
}

/// Validated sender address loaded from configuration.
#[derive(Clone)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(s: String) -> Result<Self, AppError> {
        let email = is_valid_email(&s)
            .map_err(|_| AppError::Email(EmailError::InvalidRecipient(s.clone())))?;
        Ok(Self(email))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Html")]
    html: String,
}

impl EmailClient {
    pub fn new(base_url: String, sender: SenderEmail, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
            sender,
        }
    }

    pub async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), AppError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.inner().to_string(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            html: html_content.to_string(),
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Email(EmailError::SendFailed(e.to_string())))?
            .error_for_status()
            .map_err(|e| AppError::Email(EmailError::SendFailed(e.to_string())))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_parse_valid_email() {
        assert!(SenderEmail::parse("noreply@skillbridge.io".to_string()).is_ok());
    }

    #[test]
    fn test_sender_parse_invalid_email() {
        assert!(SenderEmail::parse("not-an-address".to_string()).is_err());
    }
}
