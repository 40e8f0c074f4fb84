//! Chat-completions response bodies.
//!
//! Fields the adapter does not read are kept so the raw response survives a
//! round trip through [`serde_json::to_value`].

use serde::{Deserialize, Serialize};

use super::request::ToolCallPayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallPayload>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

/// One server-sent event of a streamed chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    /// Text carried by the first choice, empty when there is none.
    pub fn delta_text(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .unwrap_or_default()
    }

    pub fn delta_role(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.role.as_deref())
    }

    /// Tool-call fragments carried by the first choice.
    pub fn delta_tool_calls(&self) -> &[ChunkToolCall] {
        self.choices
            .first()
            .and_then(|choice| choice.delta.tool_calls.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,

    #[serde(default)]
    pub delta: ChunkDelta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChunkToolCall>>,
}

/// A fragment of a streamed tool call. The first fragment for an `index`
/// carries the id and name; later ones append to the arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkToolCall {
    #[serde(default)]
    pub index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<ChunkFunctionCall>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tolerates_missing_optional_fields() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "Hello" } }]
        }))
        .unwrap();

        let message = completion.choices[0].message.as_ref().unwrap();
        assert_eq!(message.content.as_deref(), Some("Hello"));
        assert!(message.role.is_none());
        assert!(completion.usage.is_none());
    }

    #[test]
    fn test_tool_call_type_defaults_to_function() {
        let message: ResponseMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "function": { "name": "get_weather", "arguments": "{\"city\":\"Lisbon\"}" }
            }]
        }))
        .unwrap();

        let calls = message.tool_calls.unwrap();
        assert_eq!(calls[0].r#type, "function");
        assert_eq!(calls[0].function.arguments, r#"{"city":"Lisbon"}"#);
    }

    #[test]
    fn test_chunk_delta_accessors() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{ "delta": { "role": "assistant", "content": "Hel" } }]
        }))
        .unwrap();
        assert_eq!(chunk.delta_text(), "Hel");
        assert_eq!(chunk.delta_role(), Some("assistant"));

        let empty: ChatCompletionChunk = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert_eq!(empty.delta_text(), "");
    }

    #[test]
    fn test_partial_usage_defaults_missing_counts() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hi" } }],
            "usage": { "total_tokens": 12 }
        }))
        .unwrap();

        let usage = completion.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 0);
        assert_eq!(usage.completion_tokens, 0);
        assert_eq!(usage.total_tokens, 12);
    }

    #[test]
    fn test_chunk_tool_call_fragments() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{ "delta": { "tool_calls": [{
                "index": 0,
                "id": "call_1",
                "type": "function",
                "function": { "name": "get_weather", "arguments": "" }
            }] } }]
        }))
        .unwrap();

        let calls = chunk.delta_tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id.as_deref(), Some("call_1"));
        assert_eq!(
            calls[0].function.as_ref().and_then(|f| f.name.as_deref()),
            Some("get_weather")
        );
        assert!(chunk.choices[0].delta.content.is_none());
    }
}
