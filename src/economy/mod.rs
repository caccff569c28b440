//! The economy engine and its supporting tables
//!
//! - [`state`]: closed bee-tier and alveole-level sets
//! - [`catalog`]: fixed cost, mission, and roulette tables
//! - [`store`]: the persistence seam (MongoDB or in-memory)
//! - [`engine`]: the validated transition operations

pub mod catalog;
pub mod engine;
pub mod state;
pub mod store;

pub use engine::{
    EconomyEngine, EconomyError, Rejection, RejectionClass, RejectionKind, ResourceDeltas,
    SaleReceipt, SpinOutcome,
};
pub use state::{AlveoleLevel, BeeTier};
pub use store::{EconomyStore, MemoryEconomyStore, MongoEconomyStore};
