use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize, Debug, Clone)]
pub struct Assistant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Serialize, Debug)]
pub struct CreateAssistantRequest {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<Value>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Thread {
    pub id: String,
}

#[derive(Serialize, Debug)]
pub struct Attachment {
    pub file_id: String,
    pub tools: Vec<Value>,
}

#[derive(Serialize, Debug)]
pub struct CreateMessageRequest {
    pub role: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Serialize, Debug)]
pub struct CreateRunRequest {
    pub assistant_id: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Run {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    pub fn is_pending(&self) -> bool {
        matches!(self.status.as_str(), "queued" | "in_progress")
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.required_action
            .as_ref()
            .map(|a| a.submit_tool_outputs.tool_calls.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RequiredAction {
    pub submit_tool_outputs: RequiredToolOutputs,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RequiredToolOutputs {
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RunError {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

#[derive(Serialize, Debug)]
pub struct SubmitToolOutputsRequest {
    pub tool_outputs: Vec<ToolOutput>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ThreadMessage {
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find_map(|c| c.text.as_ref().map(|t| t.value.as_str()))
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct MessageContent {
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TextContent {
    pub value: String,
}
