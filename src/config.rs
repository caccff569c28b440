//! Configuration for apiary
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Apiary - economy backend for the BeeMiner idle game
#[derive(Parser, Debug, Clone)]
#[command(name = "apiary")]
#[command(about = "Economy backend for the BeeMiner idle game")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "apiary")]
    pub mongodb_db: String,

    /// Enable development mode (in-memory store fallback, test-resource route)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Email provider: "brevo" or "disabled"
    #[arg(long, env = "EMAIL_PROVIDER", default_value = "disabled")]
    pub email_provider: String,

    /// Brevo API key (required when EMAIL_PROVIDER=brevo)
    #[arg(long, env = "BREVO_API_KEY")]
    pub brevo_api_key: Option<String>,

    /// Sender address for outgoing mail
    #[arg(long, env = "EMAIL_FROM", default_value = "noreply@beeminor.com")]
    pub email_from: String,

    /// Ops address that receives mission-claim notifications (optional)
    #[arg(long, env = "NOTIFY_EMAIL")]
    pub notify_email: Option<String>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.email_provider.as_str() {
            "brevo" => {
                if self.brevo_api_key.is_none() {
                    return Err("BREVO_API_KEY is required when EMAIL_PROVIDER=brevo".to_string());
                }
            }
            "disabled" => {}
            other => {
                return Err(format!(
                    "Unknown EMAIL_PROVIDER '{}' (expected 'brevo' or 'disabled')",
                    other
                ));
            }
        }

        Ok(())
    }
}
