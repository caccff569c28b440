//! Economy document schema
//!
//! One document per player, holding every balance the economy engine is
//! allowed to touch. Mutated exclusively through the engine's transition
//! operations; never deleted.

use std::collections::BTreeMap;

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::economy::state::{AlveoleLevel, BeeTier};

/// Collection name for economy state
pub const ECONOMY_COLLECTION: &str = "economy_states";

/// Newest transactions kept on the document
pub const TRANSACTION_LOG_CAP: usize = 50;

/// One entry in the per-user transaction trail
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TransactionEntry {
    /// Transition kind ("buy-bee", "sell-honey", ...)
    pub kind: String,
    /// Human-readable detail of the amounts moved
    pub detail: String,
    /// When the transition was applied
    pub at: DateTime,
}

/// Economy document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct EconomyDoc {
    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Opaque player identifier
    pub user_id: String,

    /// Honey balance; decreases only via sell
    #[serde(default)]
    pub honey: i64,

    /// Flower balance; spent on bees and alveoles
    #[serde(default)]
    pub flowers: i64,

    /// Diamond balance; earned only via honey sale
    #[serde(default)]
    pub diamonds: i64,

    /// Roulette tickets; earned via missions, consumed by spins
    #[serde(default)]
    pub tickets: i64,

    /// Secondary coin balance; earned only via honey sale
    #[serde(default)]
    pub secondary_coin: i64,

    /// Owned bees per tier; counts only increase
    #[serde(default)]
    pub bee_counts: BTreeMap<BeeTier, i64>,

    /// Alveole unlock flags; once true, never reverts
    #[serde(default)]
    pub unlocked_alveoles: BTreeMap<AlveoleLevel, bool>,

    /// Mission ids already claimed; append-only
    #[serde(default)]
    pub claimed_mission_ids: Vec<u32>,

    /// Referral count; written by the referral system, read-only here
    #[serde(default)]
    pub invited_friends: i64,

    /// Diamonds earned since the current period started; reset externally
    #[serde(default)]
    pub lifetime_diamonds_this_period: i64,

    /// Start of the current accounting period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<DateTime>,

    /// Set on every mutation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime>,

    /// Newest-last audit trail, capped at [`TRANSACTION_LOG_CAP`]
    #[serde(default)]
    pub transactions: Vec<TransactionEntry>,
}

impl EconomyDoc {
    /// Create the default document for an unseen user.
    ///
    /// All balances zero, no bees, level 1 alveole unlocked (implicitly
    /// free), no missions claimed, period starting now.
    pub fn new(user_id: &str) -> Self {
        let mut unlocked_alveoles = BTreeMap::new();
        unlocked_alveoles.insert(AlveoleLevel::L1, true);

        Self {
            metadata: Metadata::new(),
            user_id: user_id.to_string(),
            honey: 0,
            flowers: 0,
            diamonds: 0,
            tickets: 0,
            secondary_coin: 0,
            bee_counts: BTreeMap::new(),
            unlocked_alveoles,
            claimed_mission_ids: Vec::new(),
            invited_friends: 0,
            lifetime_diamonds_this_period: 0,
            period_start: Some(DateTime::now()),
            last_updated: Some(DateTime::now()),
            transactions: Vec::new(),
        }
    }

    /// Count of owned bees for a tier
    pub fn bee_count(&self, tier: BeeTier) -> i64 {
        self.bee_counts.get(&tier).copied().unwrap_or(0)
    }

    /// Whether an alveole level is unlocked
    pub fn is_unlocked(&self, level: AlveoleLevel) -> bool {
        self.unlocked_alveoles.get(&level).copied().unwrap_or(false)
    }

    /// Stamp the mutation time and append to the capped transaction trail
    pub fn record_transaction(&mut self, kind: &str, detail: String) {
        let now = DateTime::now();
        self.last_updated = Some(now);
        self.transactions.push(TransactionEntry {
            kind: kind.to_string(),
            detail,
            at: now,
        });
        if self.transactions.len() > TRANSACTION_LOG_CAP {
            let excess = self.transactions.len() - TRANSACTION_LOG_CAP;
            self.transactions.drain(..excess);
        }
    }
}

impl IntoIndexes for EconomyDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for EconomyDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document_policy() {
        let doc = EconomyDoc::new("player-1");

        assert_eq!(doc.honey, 0);
        assert_eq!(doc.flowers, 0);
        assert_eq!(doc.diamonds, 0);
        assert_eq!(doc.tickets, 0);
        assert_eq!(doc.secondary_coin, 0);
        assert!(doc.bee_counts.is_empty());
        assert!(doc.claimed_mission_ids.is_empty());
        assert!(doc.is_unlocked(AlveoleLevel::L1));
        assert!(!doc.is_unlocked(AlveoleLevel::L2));
        assert!(doc.period_start.is_some());
    }

    #[test]
    fn test_transaction_trail_caps_at_newest() {
        let mut doc = EconomyDoc::new("player-1");
        for i in 0..60 {
            doc.record_transaction("buy-bee", format!("purchase {}", i));
        }

        assert_eq!(doc.transactions.len(), TRANSACTION_LOG_CAP);
        // Oldest entries dropped, newest kept
        assert_eq!(doc.transactions[0].detail, "purchase 10");
        assert_eq!(doc.transactions.last().unwrap().detail, "purchase 59");
    }

    #[test]
    fn test_bson_map_keys_are_wire_strings() {
        let mut doc = EconomyDoc::new("player-1");
        doc.bee_counts.insert(BeeTier::Baby, 2);
        doc.unlocked_alveoles.insert(AlveoleLevel::L2, true);

        let bson = bson::to_document(&doc).unwrap();
        let bees = bson.get_document("bee_counts").unwrap();
        assert_eq!(bees.get_i64("baby").unwrap(), 2);
        let alveoles = bson.get_document("unlocked_alveoles").unwrap();
        assert!(alveoles.get_bool("2").unwrap());
    }
}
