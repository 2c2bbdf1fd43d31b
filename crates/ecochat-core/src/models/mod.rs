pub mod image_ref;
pub mod message;
pub mod store;
pub mod thread;
pub mod timestamp;

pub use image_ref::{ImageRef, ImageRefError};
pub use message::{Message, MessageBody, MessageId, Role, Section};
pub use store::{Store, StoreError};
pub use thread::{ChatThread, DEFAULT_THREAD_TITLE, ThreadId};
