use super::api_models::*;
use crate::config::Credentials;
use crate::exceptions::ChatError;
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Client for the Assistants v2 API, shared by OpenAI and OpenAI-compatible vendors.
#[derive(Debug, Clone)]
pub struct AssistantsClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl AssistantsClient {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            http: crate::utils::setup_http_client(),
            api_key: credentials.api_key.clone(),
            base_url: credentials.base_url.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ChatError> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let msg = if text.trim().is_empty() {
                format!("API Error (Status: {}): [Empty Body]", status)
            } else {
                format!("API Error (Status: {}): {}", status, text)
            };
            return Err(ChatError::Provider(msg));
        }
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChatError> {
        self.send(self.request(reqwest::Method::GET, path)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ChatError> {
        self.send(self.request(reqwest::Method::POST, path).json(body))
            .await
    }

    pub async fn list_assistants(&self) -> Result<Vec<Assistant>, ChatError> {
        let list: ListResponse<Assistant> = self.get("/assistants?limit=100").await?;
        Ok(list.data)
    }

    pub async fn create_assistant(
        &self,
        req: &CreateAssistantRequest,
    ) -> Result<Assistant, ChatError> {
        tracing::debug!("Creating assistant {}", req.name);
        self.post("/assistants", req).await
    }

    pub async fn upload_file(&self, path: &Path) -> Result<FileObject, ChatError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("application/pdf")?,
            );
        tracing::debug!("Uploading {} for assistants", path.display());
        self.send(self.request(reqwest::Method::POST, "/files").multipart(form))
            .await
    }

    pub async fn retrieve_file(&self, file_id: &str) -> Result<FileObject, ChatError> {
        self.get(&format!("/files/{}", file_id)).await
    }

    pub async fn create_thread(&self) -> Result<Thread, ChatError> {
        self.post("/threads", &serde_json::json!({})).await
    }

    pub async fn create_message(
        &self,
        thread_id: &str,
        req: &CreateMessageRequest,
    ) -> Result<serde_json::Value, ChatError> {
        self.post(&format!("/threads/{}/messages", thread_id), req)
            .await
    }

    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, ChatError> {
        let req = CreateRunRequest {
            assistant_id: assistant_id.to_string(),
        };
        self.post(&format!("/threads/{}/runs", thread_id), &req)
            .await
    }

    pub async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ChatError> {
        self.get(&format!("/threads/{}/runs/{}", thread_id, run_id))
            .await
    }

    pub async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<Run, ChatError> {
        let req = SubmitToolOutputsRequest {
            tool_outputs: outputs,
        };
        self.post(
            &format!("/threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
            &req,
        )
        .await
    }

    pub async fn latest_message(&self, thread_id: &str) -> Result<Option<ThreadMessage>, ChatError> {
        let list: ListResponse<ThreadMessage> = self
            .get(&format!("/threads/{}/messages?limit=1", thread_id))
            .await?;
        Ok(list.data.into_iter().next())
    }
}
