use serde::{Deserialize, Serialize, Serializer, ser::Error as _};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,

    pub messages: Vec<RequestMessage>,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,

    /// Alter this or temperature but not both.
    pub top_p: Option<f32>,

    pub stream: bool,

    pub tools: Option<Vec<FunctionTool>>,

    pub tool_choice: Option<ToolChoice>,

    /// Provider-specific parameters, merged into the top level of the body.
    /// A key that names a field above replaces that field's value.
    pub extra: Map<String, Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<RequestMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
            stream: false,
            tools: None,
            tool_choice: None,
            extra: Map::new(),
        }
    }
}

#[derive(Serialize)]
struct RequestFields<'a> {
    model: &'a str,

    messages: &'a [RequestMessage],

    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [FunctionTool]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a ToolChoice>,
}

impl Serialize for ChatCompletionRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = RequestFields {
            model: &self.model,
            messages: &self.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            stream: self.stream,
            tools: self.tools.as_deref(),
            tool_choice: self.tool_choice.as_ref(),
        };

        let mut body = match serde_json::to_value(fields).map_err(S::Error::custom)? {
            Value::Object(body) => body,
            _ => return Err(S::Error::custom("request fields must serialize to an object")),
        };
        for (key, value) in &self.extra {
            body.insert(key.clone(), value.clone());
        }
        body.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestMessage {
    pub role: String,

    /// `None` only for assistant turns that carry tool calls.
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallPayload>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub id: String,

    /// Always `function`
    #[serde(rename = "type", default = "function_type")]
    pub r#type: String,

    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// JSON-encoded arguments, exactly as the model produced them.
    #[serde(default)]
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionTool {
    /// Always `function`
    #[serde(rename = "type")]
    pub r#type: String,

    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub parameters: Value,
}

/// `"none"`, `"auto"`, `"required"` or a named function.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolChoice {
    Mode(ToolMode),
    Named(NamedToolChoice),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    None,
    Auto,
    Required,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedToolChoice {
    #[serde(rename = "type")]
    pub r#type: String,

    pub function: NamedFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedFunction {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_are_omitted() {
        let request = ChatCompletionRequest::new(
            "llama3.3-70b-instruct",
            vec![RequestMessage {
                role: "user".into(),
                content: Some("Hi".into()),
                tool_calls: None,
                tool_call_id: None,
            }],
        );

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama3.3-70b-instruct",
                "messages": [{ "role": "user", "content": "Hi" }]
            })
        );
    }

    #[test]
    fn test_extra_parameters_are_flattened() {
        let mut request = ChatCompletionRequest::new("m", Vec::new());
        request.stream = true;
        request.extra.insert("seed".into(), json!(7));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(body["seed"], 7);
    }

    #[test]
    fn test_extra_parameters_replace_builtin_fields() {
        let mut request = ChatCompletionRequest::new("m", Vec::new());
        request.temperature = Some(0.1);
        request.extra.insert("temperature".into(), json!(0.5));
        request.extra.insert("model".into(), json!("other"));

        let text = serde_json::to_string(&request).unwrap();
        assert_eq!(text.matches("\"temperature\"").count(), 1);
        assert_eq!(text.matches("\"model\"").count(), 1);

        let body: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["model"], "other");
    }

    #[test]
    fn test_tool_choice_serialization() {
        let mode = serde_json::to_value(ToolChoice::Mode(ToolMode::Required)).unwrap();
        assert_eq!(mode, json!("required"));

        let named = serde_json::to_value(ToolChoice::Named(NamedToolChoice {
            r#type: "function".into(),
            function: NamedFunction {
                name: "get_weather".into(),
            },
        }))
        .unwrap();
        assert_eq!(
            named,
            json!({ "type": "function", "function": { "name": "get_weather" } })
        );
    }
}
