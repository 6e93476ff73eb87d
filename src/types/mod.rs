// Public modules
pub mod chat_completion_chunk;
pub mod chat_completion_request;
pub mod generation_params;
pub mod message;
pub mod model;

// Re-exports
pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta};
pub use chat_completion_request::{ChatCompletionRequest, RequestMessage};
pub use generation_params::{
    FREQUENCY_PENALTY_RANGE, GenerationParams, MAX_TOKENS_RANGE, PRESENCE_PENALTY_RANGE,
    TEMPERATURE_RANGE, TOP_P_RANGE,
};
pub use message::{Message, MessageRole};
pub use model::Model;
