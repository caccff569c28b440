//! Brevo (Sendinblue) transactional email provider
//!
//! Uses the REST API (`POST /v3/smtp/email`) with an `api-key` header.
//! The free tier works without domain verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::notify::{DeliveryOutcome, EmailMessage, EmailProvider};
use crate::types::ApiaryError;

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";
const SENDER_NAME: &str = "BeeMiner";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    sender: Party<'a>,
    to: Vec<Party<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

#[derive(Serialize)]
struct Party<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    message_id: String,
}

/// Brevo REST provider
pub struct BrevoProvider {
    client: reqwest::Client,
    api_key: String,
    sender_email: String,
}

impl BrevoProvider {
    pub fn new(api_key: String, sender_email: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            sender_email,
        }
    }
}

#[async_trait]
impl EmailProvider for BrevoProvider {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryOutcome, ApiaryError> {
        let request = SendRequest {
            sender: Party {
                name: Some(SENDER_NAME),
                email: &self.sender_email,
            },
            to: vec![Party {
                name: None,
                email: &message.to,
            }],
            subject: &message.subject,
            html_content: &message.html,
        };

        let response = self
            .client
            .post(BREVO_SEND_URL)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiaryError::Notify(format!("Brevo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiaryError::Notify(format!(
                "Brevo returned {}: {}",
                status, body
            )));
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| ApiaryError::Notify(format!("Brevo response parse failed: {}", e)))?;

        Ok(DeliveryOutcome::Sent {
            message_id: parsed.message_id,
        })
    }

    fn name(&self) -> &'static str {
        "brevo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_wire_shape() {
        let request = SendRequest {
            sender: Party {
                name: Some(SENDER_NAME),
                email: "noreply@beeminor.com",
            },
            to: vec![Party {
                name: None,
                email: "player@example.com",
            }],
            subject: "Mission claimed",
            html_content: "<p>hi</p>",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["sender"]["email"], "noreply@beeminor.com");
        assert_eq!(json["to"][0]["email"], "player@example.com");
        // Brevo expects camelCase htmlContent
        assert_eq!(json["htmlContent"], "<p>hi</p>");
        assert!(json["to"][0].get("name").is_none());
    }
}
