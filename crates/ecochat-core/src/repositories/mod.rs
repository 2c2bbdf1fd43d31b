pub mod error;
pub mod in_memory_repository;
pub mod store_json_repository;
pub mod store_repository;
pub mod thread_store;

pub use error::{RepositoryError, RepositoryResult};
pub use in_memory_repository::InMemoryStoreRepository;
pub use store_json_repository::StoreJsonRepository;
pub use store_repository::{BoxFuture, StoreRepository};
pub use thread_store::ThreadStore;
