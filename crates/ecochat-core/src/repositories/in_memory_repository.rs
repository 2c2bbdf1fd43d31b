use std::sync::Arc;

use parking_lot::Mutex;

use super::error::RepositoryResult;
use super::store_repository::{BoxFuture, StoreRepository};
use crate::models::Store;

/// In-memory repository for the thread store
/// Keeps the serialized snapshot so encoding is exercised exactly as on disk.
/// Useful for testing and for sessions that should not touch the filesystem.
#[derive(Clone, Default)]
pub struct InMemoryStoreRepository {
    snapshot: Arc<Mutex<Option<String>>>,
}

impl InMemoryStoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with a raw snapshot, e.g. a corrupt one.
    pub fn with_raw_snapshot(raw: impl Into<String>) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// The raw JSON last written, if any.
    pub fn raw_snapshot(&self) -> Option<String> {
        self.snapshot.lock().clone()
    }
}

impl StoreRepository for InMemoryStoreRepository {
    fn load(&self) -> BoxFuture<'static, RepositoryResult<Option<Store>>> {
        let raw = self.snapshot.lock().clone();

        Box::pin(async move {
            match raw {
                Some(json) => Ok(Some(serde_json::from_str(&json)?)),
                None => Ok(None),
            }
        })
    }

    fn save(&self, store: &Store) -> BoxFuture<'static, RepositoryResult<()>> {
        let snapshot = self.snapshot.clone();
        let json = serde_json::to_string(store);

        Box::pin(async move {
            *snapshot.lock() = Some(json?);
            Ok(())
        })
    }
}
