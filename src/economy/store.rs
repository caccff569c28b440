//! Economy state persistence
//!
//! The engine talks to storage through [`EconomyStore`]: `load` and `save`
//! of one document per user. The MongoDB implementation backs production;
//! the in-memory implementation backs dev mode and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::doc;
use tokio::sync::RwLock;
use tracing::info;

use crate::db::schemas::{EconomyDoc, ECONOMY_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::ApiaryError;

/// Storage boundary for economy documents
#[async_trait]
pub trait EconomyStore: Send + Sync {
    /// Load a user's document, `None` if the user has never been seen
    async fn load(&self, user_id: &str) -> Result<Option<EconomyDoc>, ApiaryError>;

    /// Persist a user's document (insert or replace)
    async fn save(&self, doc: &EconomyDoc) -> Result<(), ApiaryError>;

    /// Whether the backing store is reachable (readiness probe)
    fn is_connected(&self) -> bool;
}

/// MongoDB-backed store
pub struct MongoEconomyStore {
    collection: MongoCollection<EconomyDoc>,
}

impl MongoEconomyStore {
    /// Create the store and apply the collection's indexes
    pub async fn new(mongo: &MongoClient) -> Result<Self, ApiaryError> {
        let collection = mongo.collection::<EconomyDoc>(ECONOMY_COLLECTION).await?;
        info!(
            "Economy store ready (db '{}', collection '{}')",
            mongo.db_name(),
            ECONOMY_COLLECTION
        );
        Ok(Self { collection })
    }
}

#[async_trait]
impl EconomyStore for MongoEconomyStore {
    async fn load(&self, user_id: &str) -> Result<Option<EconomyDoc>, ApiaryError> {
        self.collection.find_one(doc! { "user_id": user_id }).await
    }

    async fn save(&self, doc: &EconomyDoc) -> Result<(), ApiaryError> {
        self.collection
            .replace_one(doc! { "user_id": &doc.user_id }, doc.clone())
            .await
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// In-memory store for dev mode and tests
#[derive(Default)]
pub struct MemoryEconomyStore {
    docs: RwLock<HashMap<String, EconomyDoc>>,
}

impl MemoryEconomyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, the shape the engine expects
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl EconomyStore for MemoryEconomyStore {
    async fn load(&self, user_id: &str) -> Result<Option<EconomyDoc>, ApiaryError> {
        Ok(self.docs.read().await.get(user_id).cloned())
    }

    async fn save(&self, doc: &EconomyDoc) -> Result<(), ApiaryError> {
        self.docs
            .write()
            .await
            .insert(doc.user_id.clone(), doc.clone());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryEconomyStore::new();

        assert!(store.load("nobody").await.unwrap().is_none());

        let mut doc = EconomyDoc::new("player-1");
        doc.flowers = 500;
        store.save(&doc).await.unwrap();

        let loaded = store.load("player-1").await.unwrap().unwrap();
        assert_eq!(loaded.flowers, 500);
        assert_eq!(loaded.user_id, "player-1");
    }

    #[tokio::test]
    async fn test_memory_store_save_replaces() {
        let store = MemoryEconomyStore::new();

        let mut doc = EconomyDoc::new("player-1");
        store.save(&doc).await.unwrap();

        doc.honey = 900;
        store.save(&doc).await.unwrap();

        let loaded = store.load("player-1").await.unwrap().unwrap();
        assert_eq!(loaded.honey, 900);
    }
}
