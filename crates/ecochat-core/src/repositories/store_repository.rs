use std::future::Future;
use std::pin::Pin;

use super::error::RepositoryResult;
use crate::models::Store;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence medium for the whole `Store` snapshot.
pub trait StoreRepository: Send + Sync + 'static {
    /// Load the persisted snapshot. `Ok(None)` means nothing was saved yet.
    fn load(&self) -> BoxFuture<'static, RepositoryResult<Option<Store>>>;

    /// Replace the persisted snapshot with `store`.
    fn save(&self, store: &Store) -> BoxFuture<'static, RepositoryResult<()>>;
}
