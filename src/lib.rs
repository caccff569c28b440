//! Apiary - economy backend for the BeeMiner idle game
//!
//! Players accumulate honey, flowers, diamonds, tickets, and a secondary
//! coin by owning bees; apiary validates and applies every economic
//! transition against a per-user MongoDB document.
//!
//! ## Services
//!
//! - **Economy engine**: validated state transitions (buy bees, sell honey,
//!   unlock alveoles, spin the roulette, claim referral missions), one
//!   atomic read-modify-write per user with per-user serialization
//! - **HTTP API**: thin hyper layer mapping each transition to an endpoint
//! - **Notify**: best-effort email, pluggable provider, never coupled to a
//!   transition's success

pub mod config;
pub mod db;
pub mod economy;
pub mod notify;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ApiaryError, Result};
