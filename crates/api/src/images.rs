//! Bounded in-memory store of generated-image records.
//!
//! Records live only for the lifetime of the process. The store is FIFO:
//! once `capacity` is reached, the oldest record is evicted on insert, so
//! memory use is bounded no matter how long the server runs.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Metadata for one generated image.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedImage {
    /// Unique id for this image.
    pub id: Uuid,
    /// URL of the generated image on the provider's storage.
    pub url: String,
    /// Prompt the image was generated from (post-refinement).
    pub prompt: String,
    /// Workflow label selected by the caller.
    pub workflow: String,
    /// When the record was created (UTC).
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied generation parameters, echoed back verbatim.
    pub params: Value,
    /// Caller-supplied global parameters, echoed back verbatim.
    pub global_params: Value,
    /// Selected refiner id (`"none"` when refinement was off).
    pub refiner: String,
    /// Caller-supplied refiner parameters, echoed back verbatim.
    pub refiner_params: Value,
    /// Whether a reference image accompanied the request.
    pub used_reference_image: bool,
    /// Batch this image belongs to.
    pub batch_id: String,
    /// Index of this image within its batch.
    pub batch_index: u32,
}

/// Bounded FIFO store of [`GeneratedImage`] records.
pub struct ImageStore {
    capacity: usize,
    inner: RwLock<VecDeque<GeneratedImage>>,
}

impl ImageStore {
    /// Create a store that retains at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: RwLock::new(VecDeque::new()),
        }
    }

    /// Insert a record, evicting the oldest one at capacity.
    pub async fn insert(&self, image: GeneratedImage) {
        let mut inner = self.inner.write().await;
        if inner.len() == self.capacity {
            if let Some(evicted) = inner.pop_front() {
                tracing::debug!(id = %evicted.id, "Evicted oldest image record");
            }
        }
        inner.push_back(image);
    }

    /// Look up a record by id.
    pub async fn get(&self, id: &Uuid) -> Option<GeneratedImage> {
        let inner = self.inner.read().await;
        inner.iter().find(|img| &img.id == id).cloned()
    }

    /// All records, newest first.
    pub async fn list(&self) -> Vec<GeneratedImage> {
        let inner = self.inner.read().await;
        inner.iter().rev().cloned().collect()
    }

    /// Number of retained records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(batch_index: u32) -> GeneratedImage {
        GeneratedImage {
            id: Uuid::new_v4(),
            url: "https://example.com/out.png".to_string(),
            prompt: "a red fox".to_string(),
            workflow: "text-to-image".to_string(),
            timestamp: Utc::now(),
            params: json!({}),
            global_params: json!({}),
            refiner: "none".to_string(),
            refiner_params: json!({}),
            used_reference_image: false,
            batch_id: "batch-1".to_string(),
            batch_index,
        }
    }

    #[tokio::test]
    async fn insert_and_get_by_id() {
        let store = ImageStore::new(10);
        assert!(store.is_empty().await);

        let image = record(0);
        let id = image.id;
        store.insert(image).await;
        assert!(!store.is_empty().await);

        let fetched = store.get(&id).await.unwrap();
        assert_eq!(fetched.id, id);
        assert!(store.get(&Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let store = ImageStore::new(10);
        for i in 0..3 {
            store.insert(record(i)).await;
        }
        let listed = store.list().await;
        let indices: Vec<u32> = listed.iter().map(|img| img.batch_index).collect();
        assert_eq!(indices, vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn capacity_evicts_oldest() {
        let store = ImageStore::new(2);
        let first = record(0);
        let first_id = first.id;
        store.insert(first).await;
        store.insert(record(1)).await;
        store.insert(record(2)).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(&first_id).await.is_none());
    }
}
