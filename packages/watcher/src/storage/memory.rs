//! In-memory snapshot store.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::traits::JobRepository;
use crate::types::JobCollection;

/// Keeps the single latest snapshot per source URL in a guarded map.
///
/// One process-wide lock; fine for the bounded source counts a single
/// watcher process handles. Callers never touch the map directly.
#[derive(Default)]
pub struct MemoryRepository {
    collections: RwLock<HashMap<String, JobCollection>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for MemoryRepository {
    async fn save(&self, collection: JobCollection) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.insert(collection.source_url.clone(), collection);
        Ok(())
    }

    async fn latest(&self, url: &str) -> Result<Option<JobCollection>> {
        let collections = self.collections.read().await;
        Ok(collections.get(url).cloned())
    }
}
