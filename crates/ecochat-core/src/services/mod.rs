pub mod busy;
pub mod completion_client;
pub mod conversation_service;
pub mod image_client;
pub mod image_service;
pub mod response_parser;

pub use busy::{BusyFlag, BusyGuard};
pub use completion_client::{
    ChatTurn, CollaboratorError, CompletionClient, FireworksCompletionClient, TurnRole,
};
pub use conversation_service::{AssistantReply, ConversationService, PendingText, TEXT_FALLBACK};
pub use image_client::{FireworksImageClient, GeneratedImage, ImageClient};
pub use image_service::{IMAGE_FALLBACK, ImageOutcome, ImageRequestService, PendingImage};
