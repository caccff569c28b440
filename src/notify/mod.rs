//! Best-effort email notification
//!
//! One `EmailProvider` interface with the concrete provider selected by
//! configuration. Delivery is fire-and-forget: the [`Notifier`] spawns each
//! send on a detached task and logs the outcome, so a slow or failing
//! provider can never block or fail an economy transition.

pub mod brevo;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::Args;
use crate::notify::brevo::BrevoProvider;
use crate::types::ApiaryError;

/// An outgoing email
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Result of a delivery attempt
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    /// Accepted by the provider
    Sent { message_id: String },
    /// Dropped without an attempt (provider disabled)
    Skipped,
}

/// Pluggable delivery backend
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryOutcome, ApiaryError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Provider that drops every message, for instances without email configured
pub struct DisabledProvider;

#[async_trait]
impl EmailProvider for DisabledProvider {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryOutcome, ApiaryError> {
        debug!(to = %message.to, subject = %message.subject, "Email skipped (provider disabled)");
        Ok(DeliveryOutcome::Skipped)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Fire-and-forget notification facade
#[derive(Clone)]
pub struct Notifier {
    provider: Arc<dyn EmailProvider>,
    /// Ops address for mission-claim notifications, if configured
    ops_address: Option<String>,
}

impl Notifier {
    /// Build the notifier from configuration.
    ///
    /// `Args::validate` has already checked that the brevo provider has an
    /// API key, so a missing key here degrades to the disabled provider
    /// rather than failing startup.
    pub fn from_args(args: &Args) -> Self {
        let provider: Arc<dyn EmailProvider> = match args.email_provider.as_str() {
            "brevo" => match &args.brevo_api_key {
                Some(key) => Arc::new(BrevoProvider::new(key.clone(), args.email_from.clone())),
                None => Arc::new(DisabledProvider),
            },
            _ => Arc::new(DisabledProvider),
        };

        info!("Email provider: {}", provider.name());

        Self {
            provider,
            ops_address: args.notify_email.clone(),
        }
    }

    /// Send on a detached task; failures are logged and never propagated
    pub fn send_detached(&self, message: EmailMessage) {
        let provider = Arc::clone(&self.provider);
        tokio::spawn(async move {
            match provider.send(&message).await {
                Ok(DeliveryOutcome::Sent { message_id }) => {
                    info!(to = %message.to, message_id = %message_id, "Email sent");
                }
                Ok(DeliveryOutcome::Skipped) => {}
                Err(e) => {
                    warn!(to = %message.to, error = %e, "Email delivery failed (non-fatal)");
                }
            }
        });
    }

    /// Notify the ops address of a mission claim, if one is configured
    pub fn mission_claimed(&self, user_id: &str, mission_id: u32, flowers: i64, tickets: i64) {
        let Some(to) = self.ops_address.clone() else {
            return;
        };
        self.send_detached(EmailMessage {
            to,
            subject: format!("Mission {} claimed", mission_id),
            html: format!(
                "<p>User <b>{}</b> claimed mission {}: +{} flowers, +{} tickets.</p>",
                user_id, mission_id, flowers, tickets
            ),
        });
    }
}
