use std::sync::Arc;

use tracing::{debug, info, warn};

use super::busy::BusyFlag;
use super::image_client::ImageClient;
use crate::models::{ImageRef, Message, Store, ThreadId, timestamp};
use crate::repositories::ThreadStore;

pub const IMAGE_FALLBACK: &str = "Failed to generate image. Please try again.";

/// An image request whose prompt is already in the store.
#[derive(Clone, Debug)]
pub struct PendingImage {
    pub thread_id: ThreadId,
    pub prompt: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ImageOutcome {
    Generated(ImageRef),
    Failed,
}

#[derive(Clone)]
pub struct ImageRequestService {
    client: Arc<dyn ImageClient>,
    thread_store: ThreadStore,
    busy: BusyFlag,
}

impl ImageRequestService {
    pub fn new(client: Arc<dyn ImageClient>, thread_store: ThreadStore, busy: BusyFlag) -> Self {
        Self {
            client,
            thread_store,
            busy,
        }
    }

    /// Request an illustration for `prompt` in the active thread.
    ///
    /// On failure the thread gets `IMAGE_FALLBACK` as an assistant message.
    pub async fn send_image_prompt(&self, store: Store, prompt: &str) -> Store {
        let _busy = self.busy.raise();

        let (store, pending) = self.begin(store, prompt);
        self.thread_store.persist(&store).await;

        let outcome = self.exchange(&pending).await;

        let store = self.finish(store, &pending, outcome);
        self.thread_store.persist(&store).await;
        store
    }

    pub fn begin(&self, mut store: Store, prompt: &str) -> (Store, PendingImage) {
        let thread_id = store.push_user_message(prompt, timestamp::now());
        debug!(thread_id, "Prepared image exchange");

        (
            store,
            PendingImage {
                thread_id,
                prompt: prompt.to_string(),
            },
        )
    }

    pub async fn exchange(&self, pending: &PendingImage) -> ImageOutcome {
        match self.client.generate(&pending.prompt).await {
            Ok(image) => {
                info!(
                    thread_id = pending.thread_id,
                    bytes = image.bytes.len(),
                    "Received generated image"
                );
                ImageOutcome::Generated(ImageRef::from_bytes(
                    &image.bytes,
                    image.content_type.as_deref(),
                ))
            }
            Err(e) => {
                warn!(thread_id = pending.thread_id, error = %e, "Image request failed");
                ImageOutcome::Failed
            }
        }
    }

    pub fn finish(&self, mut store: Store, pending: &PendingImage, outcome: ImageOutcome) -> Store {
        let now = timestamp::now();
        let id = store.next_message_id(now);
        let message = match outcome {
            ImageOutcome::Generated(image) => Message::image(id, pending.prompt.clone(), image, now),
            ImageOutcome::Failed => Message::assistant(id, IMAGE_FALLBACK, Vec::new(), now),
        };

        if let Err(e) = store.append_message(pending.thread_id, message) {
            warn!(error = %e, "Dropping image for a thread that no longer exists");
        }
        store
    }
}
