//! Async key/value persistence for answers and the navigation tree.

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Key holding the answers of questionnaire `quest_name`.
pub fn answers_key(quest_name: &str) -> String {
    quest_name.to_string()
}

/// Key holding the serialized navigation queue of `quest_name`.
pub fn tree_key(quest_name: &str) -> String {
    format!("{quest_name}.treeJSON")
}

/// Writes are atomic per key from the session's point of view.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        log::trace!(target: "quest.persist", "set {key}");
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_follow_the_quest_name() {
        assert_eq!(answers_key("Module1"), "Module1");
        assert_eq!(tree_key("Module1"), "Module1.treeJSON");
    }

    #[tokio::test]
    async fn memory_store_round_trips_values() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.set("a", json!({"Q1": "1"})).await.unwrap();
        store.set("a.treeJSON", json!({"path": [], "cursor": null})).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"Q1": "1"})));
        assert_eq!(store.keys().await, ["a", "a.treeJSON"]);

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }
}
