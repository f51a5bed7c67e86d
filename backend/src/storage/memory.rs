use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::ValueStore;

/// Process-local value store; contents are lost on shutdown
#[derive(Clone, Default)]
pub struct InMemoryValueStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ValueStore for InMemoryValueStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<bool> {
        Ok(self.values.write().await.remove(key).is_some())
    }
}
