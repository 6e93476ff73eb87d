use serde::{Deserialize, Serialize};

use crate::types::{GenerationParams, Message, MessageRole, Model};

/// A message as the completion service sees it: role and content only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestMessage {
    /// The role of the message.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
}

impl From<&Message> for RequestMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// The body of a streamed chat-completion request.
///
/// Every message of the conversation is included, in order; nothing is
/// truncated or summarized locally.  Sampling fields left as `None` are
/// omitted so the service applies its own defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// The model that will complete the conversation.
    pub model: Model,

    /// The conversation so far.
    pub messages: Vec<RequestMessage>,

    /// Amount of randomness injected into the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Presence penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    /// Frequency penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    /// Whether to stream the response as server-sent events.
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Build the fixed-model request of the basic session.
    pub fn basic(messages: &[Message]) -> Self {
        Self {
            model: Model::Gpt35Turbo,
            messages: messages.iter().map(RequestMessage::from).collect(),
            temperature: None,
            max_tokens: None,
            top_p: None,
            presence_penalty: None,
            frequency_penalty: None,
            stream: true,
        }
    }

    /// Build a request carrying the model and all five sampling parameters.
    pub fn with_params(messages: &[Message], params: &GenerationParams) -> Self {
        Self {
            model: params.model,
            temperature: Some(params.temperature),
            max_tokens: Some(params.max_tokens),
            top_p: Some(params.top_p),
            presence_penalty: Some(params.presence_penalty),
            frequency_penalty: Some(params.frequency_penalty),
            ..Self::basic(messages)
        }
    }

    /// Build a request for either session variant.
    pub fn build(messages: &[Message], params: Option<&GenerationParams>) -> Self {
        match params {
            Some(params) => Self::with_params(messages, params),
            None => Self::basic(messages),
        }
    }
}
