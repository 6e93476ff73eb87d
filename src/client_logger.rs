//! Logging trait for completion traffic.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log the requests sent by the [`OpenAi`](crate::OpenAi) client, the
//! fragments it streams back, and the messages a chat session commits.

use crate::{ChatCompletionRequest, Message};

/// A trait for logging completion traffic.
///
/// # Example
///
/// ```rust,ignore
/// use palaver::{ChatCompletionRequest, ClientLogger, Message};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, request: &ChatCompletionRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Request: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_fragment(&self, fragment: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Fragment: {fragment:?}").unwrap();
///     }
///
///     fn log_message(&self, message: &Message) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Message: {}", serde_json::to_string(message).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an outbound request, just before it is sent.
    fn log_request(&self, request: &ChatCompletionRequest);

    /// Log one streamed text fragment, in arrival order.
    fn log_fragment(&self, fragment: &str);

    /// Log a message as a chat session commits it to the conversation.
    ///
    /// Called for user messages and for complete and truncated responses.
    fn log_message(&self, message: &Message);
}
