use serde::{Deserialize, Serialize};

/// The incremental part of a streamed choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Present on the first chunk of a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// The next piece of assistant text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One choice inside a streamed chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Index of the choice; always 0 for single-choice requests.
    #[serde(default)]
    pub index: u32,

    /// The delta for this choice.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Why generation stopped, on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// One `data:` payload of a streamed chat completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Identifier shared by all chunks of one response.
    #[serde(default)]
    pub id: String,

    /// The model that produced the chunk.
    #[serde(default)]
    pub model: String,

    /// The streamed choices.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    /// The text fragment carried by this chunk.
    ///
    /// Chunks without content (the role announcement, the finish marker, or
    /// an empty choice list) yield an empty fragment.
    pub fn fragment(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .unwrap_or("")
    }

    /// The finish reason of the first choice, if this is the last chunk.
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    #[test]
    fn content_chunk() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1694268190,
            "model": "gpt-3.5-turbo",
            "choices": [{"index": 0, "delta": {"content": "Hi"}, "finish_reason": null}]
        }))
        .unwrap();
        assert_eq!(chunk.fragment(), "Hi");
        assert_eq!(chunk.finish_reason(), None);
    }

    #[test]
    fn role_and_finish_chunks_are_empty_fragments() {
        let chunk: ChatCompletionChunk = from_value(json!({
            "choices": [{"index": 0, "delta": {"role": "assistant"}}]
        }))
        .unwrap();
        assert_eq!(chunk.fragment(), "");

        let chunk: ChatCompletionChunk = from_value(json!({
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(chunk.fragment(), "");
        assert_eq!(chunk.finish_reason(), Some("stop"));
    }

    #[test]
    fn no_choices() {
        let chunk: ChatCompletionChunk = from_value(json!({"choices": []})).unwrap();
        assert_eq!(chunk.fragment(), "");
    }
}
