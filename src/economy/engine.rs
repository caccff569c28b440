//! Economy transition engine
//!
//! One operation per transition kind. Every operation is a single
//! read-modify-write under a per-user lock: load the document, validate
//! preconditions, compute the new state, persist, return. Validation
//! failures are structured [`Rejection`]s; only storage failures surface as
//! [`EconomyError::Persistence`], which callers may retry since no partial
//! writes occur.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::db::schemas::EconomyDoc;
use crate::economy::catalog::{
    alveole_tier, bee_cost, mission, select_prize, total_weight, AlveoleTier, Mission, Prize,
    PrizeReward, HONEY_PER_UNIT, MIN_HONEY_SALE,
};
use crate::economy::state::{AlveoleLevel, BeeTier};
use crate::economy::store::EconomyStore;
use crate::types::ApiaryError;

/// Stable rejection kinds, one per way a transition can be refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    UserNotFound,
    UnknownTier,
    UnknownMission,
    InvalidAmount,
    InvalidLevel,
    InsufficientFunds,
    AlreadyUnlocked,
    AlreadyClaimed,
    RequirementNotMet,
    NoTicketsAvailable,
}

/// Coarse taxonomy class, used by the transport layer for status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionClass {
    NotFound,
    InvalidInput,
    UnknownEntity,
    PreconditionFailed,
}

impl RejectionKind {
    /// Stable wire code
    pub fn code(&self) -> &'static str {
        match self {
            RejectionKind::UserNotFound => "USER_NOT_FOUND",
            RejectionKind::UnknownTier => "UNKNOWN_TIER",
            RejectionKind::UnknownMission => "UNKNOWN_MISSION",
            RejectionKind::InvalidAmount => "INVALID_AMOUNT",
            RejectionKind::InvalidLevel => "INVALID_LEVEL",
            RejectionKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            RejectionKind::AlreadyUnlocked => "ALREADY_UNLOCKED",
            RejectionKind::AlreadyClaimed => "ALREADY_CLAIMED",
            RejectionKind::RequirementNotMet => "REQUIREMENT_NOT_MET",
            RejectionKind::NoTicketsAvailable => "NO_TICKETS_AVAILABLE",
        }
    }

    /// Taxonomy class this kind belongs to
    pub fn class(&self) -> RejectionClass {
        match self {
            RejectionKind::UserNotFound => RejectionClass::NotFound,
            RejectionKind::InvalidAmount | RejectionKind::InvalidLevel => {
                RejectionClass::InvalidInput
            }
            RejectionKind::UnknownTier | RejectionKind::UnknownMission => {
                RejectionClass::UnknownEntity
            }
            RejectionKind::InsufficientFunds
            | RejectionKind::AlreadyUnlocked
            | RejectionKind::AlreadyClaimed
            | RejectionKind::RequirementNotMet
            | RejectionKind::NoTicketsAvailable => RejectionClass::PreconditionFailed,
        }
    }
}

/// A refused transition: stable kind plus human-readable message
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Rejection {
    pub kind: RejectionKind,
    pub message: String,
}

impl Rejection {
    fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Engine operation error
#[derive(Debug, Error)]
pub enum EconomyError {
    /// The transition was refused; state is unchanged
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Storage failed; no partial write occurred, safe to retry
    #[error("Persistence error: {0}")]
    Persistence(#[from] ApiaryError),
}

/// Honey sale receipt, returned alongside the updated state
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    /// Converted units of 300 honey
    pub units: i64,
    pub diamonds: i64,
    pub flowers: i64,
    pub secondary_coin: i64,
}

/// Roulette spin outcome: which slot won and what it grants
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOutcome {
    /// Index of the winning slot in wheel order
    pub index: usize,
    pub prize: &'static Prize,
}

/// Additive grant for the dev-only test-resource route
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceDeltas {
    #[serde(default)]
    pub honey: i64,
    #[serde(default)]
    pub flowers: i64,
    #[serde(default)]
    pub tickets: i64,
    #[serde(default)]
    pub diamonds: i64,
    #[serde(default)]
    pub secondary_coin: i64,
}

/// The economy engine
///
/// Holds the store, a per-user lock registry, and the roulette random
/// source. Concurrent operations for distinct users proceed in parallel;
/// operations for the same user serialize across the load-validate-save
/// window.
pub struct EconomyEngine {
    store: Arc<dyn EconomyStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    rng: StdMutex<Box<dyn RngCore + Send>>,
}

impl EconomyEngine {
    /// Create an engine with an entropy-seeded random source
    pub fn new(store: Arc<dyn EconomyStore>) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    /// Create an engine with an injected random source (seeded in tests)
    pub fn with_rng(store: Arc<dyn EconomyStore>, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            store,
            locks: DashMap::new(),
            rng: StdMutex::new(Box::new(rng)),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load_required(&self, user_id: &str) -> Result<EconomyDoc, EconomyError> {
        match self.store.load(user_id).await? {
            Some(doc) => Ok(doc),
            None => Err(Rejection::new(
                RejectionKind::UserNotFound,
                format!("No economy state for user {}", user_id),
            )
            .into()),
        }
    }

    /// Load a user's state, creating the default document on first sight.
    ///
    /// This is the only lazily-creating path; mutation operations require
    /// an existing document.
    pub async fn get_or_create(&self, user_id: &str) -> Result<EconomyDoc, EconomyError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        if let Some(doc) = self.store.load(user_id).await? {
            return Ok(doc);
        }

        let doc = EconomyDoc::new(user_id);
        self.store.save(&doc).await?;
        info!(user = %user_id, "Created default economy state");
        Ok(doc)
    }

    /// Buy one bee of the given tier with flowers
    pub async fn purchase_bee(
        &self,
        user_id: &str,
        tier_id: &str,
    ) -> Result<EconomyDoc, EconomyError> {
        let tier = BeeTier::parse(tier_id).ok_or_else(|| {
            Rejection::new(
                RejectionKind::UnknownTier,
                format!("Invalid bee type '{}'", tier_id),
            )
        })?;
        let cost = bee_cost(tier);

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut doc = self.load_required(user_id).await?;

        if doc.flowers < cost {
            return Err(Rejection::new(
                RejectionKind::InsufficientFunds,
                format!("Not enough flowers. Need {}, have {}", cost, doc.flowers),
            )
            .into());
        }

        doc.flowers -= cost;
        *doc.bee_counts.entry(tier).or_insert(0) += 1;
        doc.record_transaction(
            "buy-bee",
            format!("-{} flowers, +1 {} bee", cost, tier.id()),
        );

        self.store.save(&doc).await?;
        debug!(user = %user_id, tier = tier.id(), cost, "Bee purchased");
        Ok(doc)
    }

    /// Sell honey for diamonds, flowers, and secondary coin.
    ///
    /// Every 300 honey converts to 1 diamond + 1 flower + 2 secondary coin.
    /// The full requested amount is deducted; honey above the last full
    /// multiple of 300 is not refunded.
    pub async fn sell_honey(
        &self,
        user_id: &str,
        amount: i64,
    ) -> Result<(EconomyDoc, SaleReceipt), EconomyError> {
        if amount <= 0 {
            return Err(Rejection::new(
                RejectionKind::InvalidAmount,
                "Amount must be greater than 0",
            )
            .into());
        }
        if amount < MIN_HONEY_SALE {
            return Err(Rejection::new(
                RejectionKind::InvalidAmount,
                format!("Minimum {} honey required to sell", MIN_HONEY_SALE),
            )
            .into());
        }

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut doc = self.load_required(user_id).await?;

        if doc.honey < amount {
            return Err(Rejection::new(
                RejectionKind::InsufficientFunds,
                format!(
                    "Not enough honey. Have {}, trying to sell {}",
                    doc.honey, amount
                ),
            )
            .into());
        }

        let units = amount / HONEY_PER_UNIT;
        let receipt = SaleReceipt {
            units,
            diamonds: units,
            flowers: units,
            secondary_coin: units * 2,
        };

        doc.honey -= amount;
        doc.diamonds += receipt.diamonds;
        doc.flowers += receipt.flowers;
        doc.secondary_coin += receipt.secondary_coin;
        doc.lifetime_diamonds_this_period += receipt.diamonds;
        doc.record_transaction(
            "sell-honey",
            format!(
                "-{} honey, +{} diamonds, +{} flowers, +{} coin",
                amount, receipt.diamonds, receipt.flowers, receipt.secondary_coin
            ),
        );

        self.store.save(&doc).await?;
        debug!(user = %user_id, amount, units, "Honey sold");
        Ok((doc, receipt))
    }

    /// Unlock an alveole storage tier with flowers
    pub async fn unlock_alveole(
        &self,
        user_id: &str,
        level: i64,
    ) -> Result<(EconomyDoc, AlveoleTier), EconomyError> {
        let level = AlveoleLevel::from_number(level).ok_or_else(|| {
            Rejection::new(
                RejectionKind::InvalidLevel,
                format!("Alveole level must be 1-6, got {}", level),
            )
        })?;
        let tier = alveole_tier(level);

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut doc = self.load_required(user_id).await?;

        if doc.is_unlocked(level) {
            return Err(Rejection::new(
                RejectionKind::AlreadyUnlocked,
                format!("Alveole level {} is already unlocked", level.number()),
            )
            .into());
        }
        if doc.flowers < tier.cost {
            return Err(Rejection::new(
                RejectionKind::InsufficientFunds,
                format!("Not enough flowers. Need {}, have {}", tier.cost, doc.flowers),
            )
            .into());
        }

        doc.flowers -= tier.cost;
        doc.unlocked_alveoles.insert(level, true);
        doc.record_transaction(
            "upgrade-alveole",
            format!("-{} flowers, alveole level {}", tier.cost, level.number()),
        );

        self.store.save(&doc).await?;
        debug!(user = %user_id, level = level.number(), cost = tier.cost, "Alveole unlocked");
        Ok((doc, tier))
    }

    /// Spend one ticket on a weighted-random wheel spin
    pub async fn spin_roulette(
        &self,
        user_id: &str,
    ) -> Result<(EconomyDoc, SpinOutcome), EconomyError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut doc = self.load_required(user_id).await?;

        if doc.tickets <= 0 {
            return Err(Rejection::new(
                RejectionKind::NoTicketsAvailable,
                "No roulette tickets available",
            )
            .into());
        }

        let roll = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.gen_range(0.0..total_weight() as f64)
        };
        let (index, prize) = select_prize(roll);

        doc.tickets -= 1;
        match prize.reward {
            PrizeReward::Flowers { amount } => {
                doc.flowers += amount;
            }
            PrizeReward::Bee { tier, count } => {
                *doc.bee_counts.entry(tier).or_insert(0) += count;
            }
        }
        doc.record_transaction("spin-roulette", format!("-1 ticket, won {}", prize.label));

        self.store.save(&doc).await?;
        debug!(user = %user_id, slot = index, prize = prize.label, "Roulette spun");
        Ok((doc, SpinOutcome { index, prize }))
    }

    /// Claim a one-time referral mission reward
    pub async fn claim_mission(
        &self,
        user_id: &str,
        mission_id: u32,
    ) -> Result<(EconomyDoc, &'static Mission), EconomyError> {
        let mission = mission(mission_id).ok_or_else(|| {
            Rejection::new(
                RejectionKind::UnknownMission,
                format!("Unknown mission {}", mission_id),
            )
        })?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut doc = self.load_required(user_id).await?;

        if doc.claimed_mission_ids.contains(&mission_id) {
            return Err(Rejection::new(
                RejectionKind::AlreadyClaimed,
                format!("Mission {} already claimed", mission_id),
            )
            .into());
        }
        if doc.invited_friends < mission.friends_required {
            return Err(Rejection::new(
                RejectionKind::RequirementNotMet,
                format!(
                    "Mission {} requires {} invited friends, have {}",
                    mission_id, mission.friends_required, doc.invited_friends
                ),
            )
            .into());
        }

        doc.claimed_mission_ids.push(mission_id);
        doc.flowers += mission.flowers_reward;
        doc.tickets += mission.tickets_reward;
        doc.record_transaction(
            "claim-mission",
            format!(
                "mission {}: +{} flowers, +{} tickets",
                mission_id, mission.flowers_reward, mission.tickets_reward
            ),
        );

        self.store.save(&doc).await?;
        debug!(user = %user_id, mission = mission_id, "Mission claimed");
        Ok((doc, mission))
    }

    /// Unconditional additive grant; only reachable in dev mode
    pub async fn grant_test_resources(
        &self,
        user_id: &str,
        deltas: ResourceDeltas,
    ) -> Result<EconomyDoc, EconomyError> {
        if deltas.honey < 0
            || deltas.flowers < 0
            || deltas.tickets < 0
            || deltas.diamonds < 0
            || deltas.secondary_coin < 0
        {
            return Err(Rejection::new(
                RejectionKind::InvalidAmount,
                "Test resource deltas must be non-negative",
            )
            .into());
        }

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut doc = self.load_required(user_id).await?;

        doc.honey += deltas.honey;
        doc.flowers += deltas.flowers;
        doc.tickets += deltas.tickets;
        doc.diamonds += deltas.diamonds;
        doc.secondary_coin += deltas.secondary_coin;
        doc.record_transaction(
            "add-test-resources",
            format!(
                "+{} honey, +{} flowers, +{} tickets, +{} diamonds, +{} coin",
                deltas.honey, deltas.flowers, deltas.tickets, deltas.diamonds,
                deltas.secondary_coin
            ),
        );

        self.store.save(&doc).await?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::catalog::PRIZE_TABLE;
    use crate::economy::store::MemoryEconomyStore;

    async fn engine_with_user(doc: EconomyDoc) -> (EconomyEngine, String) {
        let user_id = doc.user_id.clone();
        let store = MemoryEconomyStore::shared();
        store.save(&doc).await.unwrap();
        (
            EconomyEngine::with_rng(store, StdRng::seed_from_u64(7)),
            user_id,
        )
    }

    fn user_with_flowers(flowers: i64) -> EconomyDoc {
        let mut doc = EconomyDoc::new("player-1");
        doc.flowers = flowers;
        doc
    }

    fn rejection_kind(err: EconomyError) -> RejectionKind {
        match err {
            EconomyError::Rejected(r) => r.kind,
            EconomyError::Persistence(e) => panic!("unexpected persistence error: {}", e),
        }
    }

    #[tokio::test]
    async fn test_purchase_bee_arithmetic() {
        let (engine, user) = engine_with_user(user_with_flowers(10_000)).await;

        let doc = engine.purchase_bee(&user, "baby").await.unwrap();
        assert_eq!(doc.flowers, 8_000);
        assert_eq!(doc.bee_count(BeeTier::Baby), 1);

        // Second purchase stacks
        let doc = engine.purchase_bee(&user, "baby").await.unwrap();
        assert_eq!(doc.flowers, 6_000);
        assert_eq!(doc.bee_count(BeeTier::Baby), 2);
    }

    #[tokio::test]
    async fn test_purchase_bee_insufficient_funds_leaves_state() {
        let (engine, user) = engine_with_user(user_with_flowers(10_000)).await;

        engine.purchase_bee(&user, "baby").await.unwrap();

        // Queen costs 1,200,000 > 8,000 remaining
        let err = engine.purchase_bee(&user, "queen").await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::InsufficientFunds);

        let doc = engine.get_or_create(&user).await.unwrap();
        assert_eq!(doc.flowers, 8_000);
        assert_eq!(doc.bee_count(BeeTier::Queen), 0);
    }

    #[tokio::test]
    async fn test_purchase_bee_exact_funds() {
        let (engine, user) = engine_with_user(user_with_flowers(2_000)).await;

        let doc = engine.purchase_bee(&user, "baby").await.unwrap();
        assert_eq!(doc.flowers, 0);
        assert_eq!(doc.bee_count(BeeTier::Baby), 1);
    }

    #[tokio::test]
    async fn test_purchase_bee_unknown_tier() {
        let (engine, user) = engine_with_user(user_with_flowers(10_000)).await;

        let err = engine.purchase_bee(&user, "drone").await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::UnknownTier);
    }

    #[tokio::test]
    async fn test_purchase_bee_user_not_found() {
        let store = MemoryEconomyStore::shared();
        let engine = EconomyEngine::new(store);

        let err = engine.purchase_bee("ghost", "baby").await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::UserNotFound);
    }

    #[tokio::test]
    async fn test_sell_honey_conversion() {
        let mut doc = EconomyDoc::new("player-1");
        doc.honey = 1_000;
        doc.flowers = 10;
        let (engine, user) = engine_with_user(doc).await;

        // 950 honey: 3 full units, remainder 50 deducted without refund
        let (doc, receipt) = engine.sell_honey(&user, 950).await.unwrap();
        assert_eq!(receipt.units, 3);
        assert_eq!(doc.honey, 50);
        assert_eq!(doc.diamonds, 3);
        assert_eq!(doc.flowers, 13);
        assert_eq!(doc.secondary_coin, 6);
        assert_eq!(doc.lifetime_diamonds_this_period, 3);
    }

    #[tokio::test]
    async fn test_sell_honey_exact_multiple() {
        let mut doc = EconomyDoc::new("player-1");
        doc.honey = 600;
        let (engine, user) = engine_with_user(doc).await;

        let (doc, receipt) = engine.sell_honey(&user, 600).await.unwrap();
        assert_eq!(receipt.units, 2);
        assert_eq!(doc.honey, 0);
        assert_eq!(doc.secondary_coin, 4);
    }

    #[tokio::test]
    async fn test_sell_honey_below_minimum_rejected_regardless_of_balance() {
        let mut doc = EconomyDoc::new("player-1");
        doc.honey = 1_000_000;
        let (engine, user) = engine_with_user(doc).await;

        let err = engine.sell_honey(&user, 299).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::InvalidAmount);

        let err = engine.sell_honey(&user, 0).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::InvalidAmount);

        let err = engine.sell_honey(&user, -300).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::InvalidAmount);
    }

    #[tokio::test]
    async fn test_sell_honey_insufficient_balance() {
        let mut doc = EconomyDoc::new("player-1");
        doc.honey = 200;
        let (engine, user) = engine_with_user(doc).await;

        let err = engine.sell_honey(&user, 300).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::InsufficientFunds);

        let doc = engine.get_or_create(&user).await.unwrap();
        assert_eq!(doc.honey, 200);
    }

    #[tokio::test]
    async fn test_unlock_alveole_and_idempotent_rejection() {
        let (engine, user) = engine_with_user(user_with_flowers(500_000)).await;

        let (doc, tier) = engine.unlock_alveole(&user, 2).await.unwrap();
        assert_eq!(doc.flowers, 300_000);
        assert!(doc.is_unlocked(AlveoleLevel::L2));
        assert_eq!(tier.capacity, 3_000_000);

        // Second unlock attempt rejects and leaves state unchanged
        let err = engine.unlock_alveole(&user, 2).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::AlreadyUnlocked);

        let doc = engine.get_or_create(&user).await.unwrap();
        assert_eq!(doc.flowers, 300_000);
    }

    #[tokio::test]
    async fn test_unlock_alveole_level_one_default_unlocked() {
        let (engine, user) = engine_with_user(user_with_flowers(0)).await;

        // Level 1 is free but already unlocked by default
        let err = engine.unlock_alveole(&user, 1).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::AlreadyUnlocked);
    }

    #[tokio::test]
    async fn test_unlock_alveole_invalid_level() {
        let (engine, user) = engine_with_user(user_with_flowers(10_000_000)).await;

        for bad in [0, 7, -2] {
            let err = engine.unlock_alveole(&user, bad).await.unwrap_err();
            assert_eq!(rejection_kind(err), RejectionKind::InvalidLevel);
        }
    }

    #[tokio::test]
    async fn test_unlock_alveole_insufficient_funds() {
        let (engine, user) = engine_with_user(user_with_flowers(199_999)).await;

        let err = engine.unlock_alveole(&user, 2).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::InsufficientFunds);
    }

    #[tokio::test]
    async fn test_spin_decrements_tickets_and_applies_prize() {
        let mut doc = EconomyDoc::new("player-1");
        doc.tickets = 2;
        let (engine, user) = engine_with_user(doc).await;

        let (doc, outcome) = engine.spin_roulette(&user).await.unwrap();
        assert_eq!(doc.tickets, 1);

        // The won prize is reflected in the state
        match outcome.prize.reward {
            PrizeReward::Flowers { amount } => assert_eq!(doc.flowers, amount),
            PrizeReward::Bee { tier, count } => assert_eq!(doc.bee_count(tier), count),
        }

        engine.spin_roulette(&user).await.unwrap();
        let err = engine.spin_roulette(&user).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::NoTicketsAvailable);

        let doc = engine.get_or_create(&user).await.unwrap();
        assert_eq!(doc.tickets, 0);
    }

    #[tokio::test]
    async fn test_spin_distribution_converges_to_weights() {
        const SPINS: usize = 10_000;

        let mut doc = EconomyDoc::new("player-1");
        doc.tickets = SPINS as i64;
        let store = MemoryEconomyStore::shared();
        store.save(&doc).await.unwrap();
        let engine = EconomyEngine::with_rng(store, StdRng::seed_from_u64(42));

        let mut counts = [0usize; PRIZE_TABLE.len()];
        for _ in 0..SPINS {
            let (_, outcome) = engine.spin_roulette("player-1").await.unwrap();
            counts[outcome.index] += 1;
        }

        let total = total_weight() as f64;
        for (i, prize) in PRIZE_TABLE.iter().enumerate() {
            let expected = prize.weight as f64 / total;
            let observed = counts[i] as f64 / SPINS as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "slot {} ({}): observed {:.4}, expected {:.4}",
                i,
                prize.label,
                observed,
                expected
            );
        }
    }

    #[tokio::test]
    async fn test_claim_mission_single_use() {
        let mut doc = EconomyDoc::new("player-1");
        doc.invited_friends = 60;
        let (engine, user) = engine_with_user(doc).await;

        let (doc, mission) = engine.claim_mission(&user, 4).await.unwrap();
        assert_eq!(doc.flowers, 12_000);
        assert_eq!(doc.tickets, 1);
        assert_eq!(mission.friends_required, 50);
        assert_eq!(doc.claimed_mission_ids, vec![4]);

        let err = engine.claim_mission(&user, 4).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::AlreadyClaimed);

        let doc = engine.get_or_create(&user).await.unwrap();
        assert_eq!(doc.flowers, 12_000);
        assert_eq!(doc.tickets, 1);
        assert_eq!(doc.claimed_mission_ids, vec![4]);
    }

    #[tokio::test]
    async fn test_claim_mission_requirement_not_met() {
        let mut doc = EconomyDoc::new("player-1");
        doc.invited_friends = 2;
        let (engine, user) = engine_with_user(doc).await;

        // Mission 1 (1 friend) passes, mission 2 (3 friends) does not
        engine.claim_mission(&user, 1).await.unwrap();
        let err = engine.claim_mission(&user, 2).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::RequirementNotMet);
    }

    #[tokio::test]
    async fn test_claim_mission_unknown() {
        let (engine, user) = engine_with_user(EconomyDoc::new("player-1")).await;

        let err = engine.claim_mission(&user, 99).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::UnknownMission);
    }

    #[tokio::test]
    async fn test_grant_test_resources() {
        let (engine, user) = engine_with_user(EconomyDoc::new("player-1")).await;

        let deltas = ResourceDeltas {
            honey: 900,
            flowers: 100,
            tickets: 3,
            diamonds: 0,
            secondary_coin: 5,
        };
        let doc = engine.grant_test_resources(&user, deltas).await.unwrap();
        assert_eq!(doc.honey, 900);
        assert_eq!(doc.flowers, 100);
        assert_eq!(doc.tickets, 3);
        assert_eq!(doc.secondary_coin, 5);
    }

    #[tokio::test]
    async fn test_grant_rejects_negative_deltas() {
        let (engine, user) = engine_with_user(EconomyDoc::new("player-1")).await;

        let deltas = ResourceDeltas {
            honey: -1,
            ..Default::default()
        };
        let err = engine.grant_test_resources(&user, deltas).await.unwrap_err();
        assert_eq!(rejection_kind(err), RejectionKind::InvalidAmount);
    }

    #[tokio::test]
    async fn test_get_or_create_is_lazy_and_stable() {
        let store = MemoryEconomyStore::shared();
        let engine = EconomyEngine::new(store);

        let doc = engine.get_or_create("newcomer").await.unwrap();
        assert_eq!(doc.flowers, 0);
        assert!(doc.is_unlocked(AlveoleLevel::L1));

        // Second read returns the persisted document, not a fresh default
        let again = engine.get_or_create("newcomer").await.unwrap();
        assert_eq!(again.period_start, doc.period_start);
    }

    #[tokio::test]
    async fn test_concurrent_same_user_purchases_serialize() {
        let store = MemoryEconomyStore::shared();
        let mut doc = EconomyDoc::new("player-1");
        doc.flowers = 20_000;
        store.save(&doc).await.unwrap();

        let engine = Arc::new(EconomyEngine::new(store));

        // 10 purchases racing for 20,000 flowers at 2,000 each: all must
        // land, with no lost update
        let mut handles = Vec::new();
        for _ in 0..10 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                engine.purchase_bee("player-1", "baby").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let doc = engine.get_or_create("player-1").await.unwrap();
        assert_eq!(doc.flowers, 0);
        assert_eq!(doc.bee_count(BeeTier::Baby), 10);
    }

    #[test]
    fn test_rejection_classes() {
        assert_eq!(
            RejectionKind::UserNotFound.class(),
            RejectionClass::NotFound
        );
        assert_eq!(
            RejectionKind::InvalidAmount.class(),
            RejectionClass::InvalidInput
        );
        assert_eq!(
            RejectionKind::UnknownTier.class(),
            RejectionClass::UnknownEntity
        );
        assert_eq!(
            RejectionKind::NoTicketsAvailable.class(),
            RejectionClass::PreconditionFailed
        );
    }
}
