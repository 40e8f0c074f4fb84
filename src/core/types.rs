use std::pin::Pin;

use futures::Stream;
use serde_json::Value;

use crate::core::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Tool => "tool",
        }
    }

    /// Parse a role as it appears on the wire. `developer` is folded into `System`.
    pub fn from_wire(role: &str) -> Option<Self> {
        match role {
            "system" | "developer" => Some(ChatRole::System),
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            "tool" => Some(ChatRole::Tool),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Calls requested by the model. Only set on assistant messages.
    pub tool_calls: Option<Vec<ToolCall>>,
    /// The call this message answers. Only set on tool messages.
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Result of a tool call, sent back so the model can continue.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(ChatRole::Tool, content)
        }
    }
}

/// A function call requested by the model. `arguments` is the raw JSON text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// A tool call with its arguments decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSelection {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: Option<String>,
    /// JSON schema of the parameters object.
    pub parameters: Value,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: Option<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description,
            parameters,
        }
    }

    /// Build a tool whose parameters are described by `T`'s JSON schema.
    pub fn from_schema<T: schemars::JsonSchema>(
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, LlmError> {
        let schema = schemars::schema_for!(T);
        let parameters = serde_json::to_value(&schema).map_err(|e| LlmError::Parse {
            message: "Failed to build JSON Schema for tool parameters".to_string(),
            source: Box::new(e),
        })?;

        if !parameters.is_object() {
            return Err(LlmError::ProviderConfiguration(
                "Tool parameters schema root is not an object".to_string(),
            ));
        }

        Ok(Self::new(name, description, parameters))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolChoice {
    None,
    Auto,
    Required,
    Function { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    /// The vendor response as received.
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub raw: Value,
}

impl ChatResponse {
    /// Decode the tool calls carried by the response message.
    ///
    /// With `error_on_no_tool_call` set, a message without tool calls is an error
    /// instead of an empty list.
    pub fn tool_selections(
        &self,
        error_on_no_tool_call: bool,
    ) -> Result<Vec<ToolSelection>, LlmError> {
        let calls = self.message.tool_calls.as_deref().unwrap_or_default();

        if calls.is_empty() {
            if error_on_no_tool_call {
                return Err(LlmError::ResponseShape(format!(
                    "Expected at least one tool call, but got 0 tool calls. Content: {}",
                    self.message.content
                )));
            }
            return Ok(Vec::new());
        }

        calls
            .iter()
            .map(|call| {
                let arguments = if call.arguments.trim().is_empty() {
                    Value::Object(Default::default())
                } else {
                    serde_json::from_str(&call.arguments).map_err(|e| LlmError::Parse {
                        message: format!("Failed to parse tool arguments: {}", call.arguments),
                        source: Box::new(e),
                    })?
                };

                Ok(ToolSelection {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments,
                })
            })
            .collect()
    }
}

/// One step of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionDelta {
    /// Text received so far.
    pub text: String,
    /// Text added by this step.
    pub delta: String,
}

/// One step of a streamed chat.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatDelta {
    /// The assistant message accumulated so far.
    pub message: ChatMessage,
    pub delta: String,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmMetadata {
    pub model_name: String,
    pub context_window: u32,
    pub num_output: Option<u32>,
    pub is_chat_model: bool,
    pub is_function_calling_model: bool,
}

pub type CompletionDeltaIter = Box<dyn Iterator<Item = Result<CompletionDelta, LlmError>> + Send>;
pub type ChatDeltaIter = Box<dyn Iterator<Item = Result<ChatDelta, LlmError>> + Send>;
pub type CompletionDeltaStream =
    Pin<Box<dyn Stream<Item = Result<CompletionDelta, LlmError>> + Send>>;
pub type ChatDeltaStream = Pin<Box<dyn Stream<Item = Result<ChatDelta, LlmError>> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response_with_calls(calls: Option<Vec<ToolCall>>) -> ChatResponse {
        ChatResponse {
            message: ChatMessage {
                tool_calls: calls,
                ..ChatMessage::assistant("")
            },
            raw: json!({}),
        }
    }

    #[test]
    fn test_tool_selections_decode_arguments() {
        let response = response_with_calls(Some(vec![ToolCall {
            id: "call_1".into(),
            name: "get_weather".into(),
            arguments: r#"{"city":"Lisbon"}"#.into(),
        }]));

        let selections = response.tool_selections(true).unwrap();
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].id, "call_1");
        assert_eq!(selections[0].name, "get_weather");
        assert_eq!(selections[0].arguments["city"], "Lisbon");
    }

    #[test]
    fn test_tool_selections_empty_arguments_become_empty_object() {
        let response = response_with_calls(Some(vec![ToolCall {
            id: "call_1".into(),
            name: "now".into(),
            arguments: String::new(),
        }]));

        let selections = response.tool_selections(false).unwrap();
        assert_eq!(selections[0].arguments, json!({}));
    }

    #[test]
    fn test_tool_selections_without_calls() {
        let response = response_with_calls(None);

        assert!(response.tool_selections(false).unwrap().is_empty());
        assert!(matches!(
            response.tool_selections(true),
            Err(LlmError::ResponseShape(_))
        ));
    }

    #[test]
    fn test_tool_selections_reject_malformed_arguments() {
        let response = response_with_calls(Some(vec![ToolCall {
            id: "call_1".into(),
            name: "get_weather".into(),
            arguments: "{city:".into(),
        }]));

        assert!(matches!(
            response.tool_selections(true),
            Err(LlmError::Parse { .. })
        ));
    }

    #[derive(schemars::JsonSchema)]
    #[allow(dead_code)]
    struct WeatherArgs {
        city: String,
        days: Option<u8>,
    }

    #[test]
    fn test_tool_from_schema_uses_object_schema() {
        let tool = Tool::from_schema::<WeatherArgs>("get_weather", None).unwrap();
        assert_eq!(tool.parameters["type"], "object");
        assert!(tool.parameters["properties"]["city"].is_object());
        assert_eq!(tool.parameters["required"], json!(["city"]));
    }

    #[test]
    fn test_role_wire_names() {
        for role in [
            ChatRole::System,
            ChatRole::User,
            ChatRole::Assistant,
            ChatRole::Tool,
        ] {
            assert_eq!(ChatRole::from_wire(role.as_str()), Some(role));
        }
        assert_eq!(ChatRole::from_wire("developer"), Some(ChatRole::System));
        assert_eq!(ChatRole::from_wire("narrator"), None);
    }
}
