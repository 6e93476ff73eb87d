// Public modules
pub mod accumulator;
pub mod archive;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod conversation;
pub mod error;
pub mod render;
pub mod sse;
pub mod types;
pub mod utils;

mod observability;

// Re-exports
pub use accumulator::{CURSOR_MARKER, StreamAccumulator, strip_cursor};
pub use archive::{ArchiveEntry, CsvArchive, TranscriptArchive};
pub use client::{CompletionService, FragmentStream, OpenAi};
pub use client_logger::ClientLogger;
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
