use std::sync::Arc;

use tracing::{debug, info, warn};

use super::store_repository::StoreRepository;
use crate::models::Store;

/// Restore/persist front for whichever repository backs the store.
///
/// Both directions fail soft: a missing or corrupt snapshot restores as an
/// empty store, and a failed write is logged and otherwise ignored.
#[derive(Clone)]
pub struct ThreadStore {
    repository: Arc<dyn StoreRepository>,
}

impl ThreadStore {
    pub fn new(repository: Arc<dyn StoreRepository>) -> Self {
        Self { repository }
    }

    pub async fn restore(&self) -> Store {
        match self.repository.load().await {
            Ok(Some(mut store)) => {
                if store.repair_active_pointer() {
                    warn!("Persisted active thread no longer exists, clearing it");
                }
                info!(threads = store.threads().len(), "Restored thread store");
                store
            }
            Ok(None) => {
                debug!("No persisted thread store, starting empty");
                Store::new()
            }
            Err(e) => {
                warn!(error = ?e, "Discarding unreadable thread store snapshot");
                Store::new()
            }
        }
    }

    pub async fn persist(&self, store: &Store) {
        if let Err(e) = self.repository.save(store).await {
            warn!(error = ?e, "Failed to persist thread store");
        }
    }
}
