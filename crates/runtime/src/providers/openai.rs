//! OpenAI-compatible chat-completions backend (OpenAI and Azure OpenAI).

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Role, ToolCall, ToolSpec, Usage,
};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Authentication mode for the completion endpoint.
///
/// Use `AzureKey` for an Azure OpenAI resource key, sent as `api-key`.
/// Use `Bearer` for OpenAI and other compatible services.
#[derive(Debug, Clone)]
pub enum OpenAiAuth {
    AzureKey(String),
    Bearer(String),
}

impl std::fmt::Display for OpenAiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AzureKey(_) => write!(f, "azure_key"),
            Self::Bearer(_) => write!(f, "bearer"),
        }
    }
}

impl OpenAiAuth {
    fn apply_headers(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::AzureKey(key) => req.header("api-key", key),
            Self::Bearer(token) => req.header("Authorization", format!("Bearer {token}")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ApiFunction,
}

#[derive(Debug, Serialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

fn function_type() -> String {
    "function".to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    auth: OpenAiAuth,
    model: String,
    base_url: Option<String>,
    api_version: String,
    temperature: Option<f32>,
}

impl OpenAiBackendBuilder {
    pub fn new(auth: OpenAiAuth, model: impl Into<String>) -> Self {
        Self {
            auth,
            model: model.into(),
            base_url: None,
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
        }
    }

    /// Service root. For Azure this is the resource endpoint,
    /// e.g. `https://my-resource.openai.azure.com`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Azure `api-version` query parameter.
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn build(self) -> OpenAiBackend {
        let base = self
            .base_url
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());
        let base = base.trim_end_matches('/');
        let url = match self.auth {
            OpenAiAuth::AzureKey(_) => format!(
                "{base}/openai/deployments/{}/chat/completions?api-version={}",
                self.model, self.api_version
            ),
            OpenAiAuth::Bearer(_) => format!("{base}/chat/completions"),
        };

        OpenAiBackend {
            client: reqwest::Client::new(),
            auth: self.auth,
            model: self.model,
            url,
            temperature: self.temperature,
        }
    }
}

/// Chat-completions backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    auth: OpenAiAuth,
    model: String,
    url: String,
    temperature: Option<f32>,
}

impl OpenAiBackend {
    pub fn builder(auth: OpenAiAuth, model: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(auth, model)
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage {
        ApiMessage {
            role: Self::role_to_api(msg.role),
            content: msg.content.clone(),
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| ApiToolCall {
                    id: call.id.clone(),
                    call_type: function_type(),
                    function: ApiFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool {
        ApiTool {
            tool_type: "function",
            function: ApiFunction {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
                strict: true,
            },
        }
    }

    fn response_to_message(message: ApiResponseMessage) -> Message {
        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Message::assistant_calls(message.content, tool_calls)
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({}, auth={})", self.model, self.auth)
    }
}

impl Backend for OpenAiBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = ApiRequest {
            model: &self.model,
            messages: request.messages.iter().map(Self::message_to_api).collect(),
            tools: request.tools.iter().map(Self::tool_to_api).collect(),
            temperature: self.temperature,
        };

        debug!(
            model = %self.model,
            messages = api_request.messages.len(),
            tools = api_request.tools.len(),
            "sending chat completion"
        );

        let req = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .header("accept", "application/json");

        let req = self.auth.apply_headers(req);

        let response = req
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response has no choices".into()))?;

        let usage = api_response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ModelResponse {
            message: Self::response_to_message(choice.message),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transcript() -> Vec<Message> {
        vec![
            Message::system("be brief"),
            Message::user("insert hello"),
            Message::assistant_calls(
                None,
                vec![ToolCall::new("call_1", "insert_text", r#"{"inserting_text":"hello","start_index":0}"#)],
            ),
            Message::tool_result("call_1", "Inserted \"hello\" at index 0 with length 5"),
        ]
    }

    #[test]
    fn auth_display() {
        assert_eq!(OpenAiAuth::AzureKey("k".into()).to_string(), "azure_key");
        assert_eq!(OpenAiAuth::Bearer("k".into()).to_string(), "bearer");
    }

    #[test]
    fn azure_url_targets_deployment() {
        let backend = OpenAiBackend::builder(OpenAiAuth::AzureKey("k".into()), "gpt-4o-mini")
            .base_url("https://res.openai.azure.com/")
            .build();
        assert_eq!(
            backend.url,
            "https://res.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-08-01-preview"
        );
    }

    #[test]
    fn tool_turns_map_to_wire_format() {
        let messages = transcript();
        let wire: Vec<Value> = messages
            .iter()
            .map(|m| serde_json::to_value(OpenAiBackend::message_to_api(m)).unwrap())
            .collect();

        assert_eq!(wire[0], json!({"role": "system", "content": "be brief"}));
        assert_eq!(wire[2]["tool_calls"][0]["type"], "function");
        assert_eq!(wire[2]["tool_calls"][0]["function"]["name"], "insert_text");
        assert!(wire[2].get("content").is_none());
        assert_eq!(wire[3]["role"], "tool");
        assert_eq!(wire[3]["tool_call_id"], "call_1");
    }

    #[test]
    fn specs_are_strict_functions() {
        let spec = ToolSpec::new("get_selection", "Get the selection.", json!({"type": "object"}));
        let wire = serde_json::to_value(OpenAiBackend::tool_to_api(&spec)).unwrap();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["strict"], true);
    }

    #[tokio::test]
    async fn parses_tool_call_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_a",
                                "type": "function",
                                "function": {"name": "get_selection", "arguments": "{}"}
                            }]
                        }
                    }],
                    "usage": {"prompt_tokens": 12, "completion_tokens": 3}
                }"#,
            )
            .create_async()
            .await;

        let backend = OpenAiBackend::builder(OpenAiAuth::Bearer("test-key".into()), "gpt-4o")
            .base_url(format!("{}/v1", server.url()))
            .build();
        let messages = vec![Message::user("what is selected?")];
        let response = backend
            .call(ModelRequest {
                messages: &messages,
                tools: &[],
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.message.tool_calls, vec![ToolCall::new("call_a", "get_selection", "{}")]);
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 3);
    }

    #[tokio::test]
    async fn azure_key_header_and_text_answer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-4o-mini/chat/completions")
            .match_query(mockito::Matcher::UrlEncoded(
                "api-version".into(),
                "2024-08-01-preview".into(),
            ))
            .match_header("api-key", "azure-key")
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "Done."}}]}"#)
            .create_async()
            .await;

        let backend = OpenAiBackend::builder(OpenAiAuth::AzureKey("azure-key".into()), "gpt-4o-mini")
            .base_url(server.url())
            .build();
        let messages = vec![Message::user("hi")];
        let response = backend
            .call(ModelRequest {
                messages: &messages,
                tools: &[],
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.message.text(), "Done.");
        assert!(!response.message.has_tool_calls());
        assert_eq!(response.usage, Usage::default());
    }

    #[tokio::test]
    async fn error_status_becomes_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let backend = OpenAiBackend::builder(OpenAiAuth::Bearer("k".into()), "gpt-4o")
            .base_url(format!("{}/v1", server.url()))
            .build();
        let err = backend
            .call(ModelRequest {
                messages: &[],
                tools: &[],
            })
            .await
            .unwrap_err();

        assert!(matches!(&err, ModelError::Api { status: 429, body } if body == "slow down"));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let backend = OpenAiBackend::builder(OpenAiAuth::Bearer("k".into()), "gpt-4o")
            .base_url(format!("{}/v1", server.url()))
            .build();
        let err = backend
            .call(ModelRequest {
                messages: &[],
                tools: &[],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }
}
