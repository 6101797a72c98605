use super::api_models::{
    CachedContent, CreateCacheRequest, GenerateContentRequest, GenerateContentResponse,
    UploadResponse, UploadedFile,
};
use crate::config::Credentials;
use crate::exceptions::ChatError;
use crate::llm::poll::{PollSettings, poll_until};
use reqwest::Client as HttpClient;
use std::path::Path;
use std::time::Duration;

const FILE_POLL: PollSettings =
    PollSettings::every(Duration::from_secs(2)).with_deadline(Duration::from_secs(60));

/// Thin wrapper over the Gemini v1beta REST surface.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
    file_poll: PollSettings,
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let msg = if text.trim().is_empty() {
        format!("API Error (Status: {}): [Empty Body]", status)
    } else {
        format!("API Error (Status: {}): {}", status, text)
    };
    Err(ChatError::Provider(msg))
}

impl GeminiClient {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            http: crate::utils::setup_http_client(),
            api_key: credentials.api_key.clone(),
            base_url: credentials.base_url.clone(),
            file_poll: FILE_POLL,
        }
    }

    pub fn with_file_poll(mut self, settings: PollSettings) -> Self {
        self.file_poll = settings;
        self
    }

    fn api(&self, path: &str) -> String {
        format!("{}/v1beta/{}", self.base_url, path)
    }

    /// Uploads a PDF and waits until the service reports it usable.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadedFile, ChatError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        let metadata = serde_json::json!({ "file": { "displayName": file_name } });
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata.to_string()).mime_str("application/json")?,
            )
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("application/pdf")?,
            );

        tracing::debug!("Uploading {} to Gemini", path.display());
        let response = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "multipart")
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = check(response).await?.json().await?;
        let file = uploaded.file;

        if file.state.as_deref() != Some("PROCESSING") {
            return Ok(file);
        }

        let client = self;
        poll_until(self.file_poll, "the uploaded document", || {
            let name = file.name.clone();
            async move {
                let current = client.get_file(&name).await?;
                match current.state.as_deref() {
                    Some("PROCESSING") => Ok(None),
                    Some("FAILED") => Err(ChatError::Provider(format!(
                        "Processing of uploaded file {} failed.",
                        current.name
                    ))),
                    _ => Ok(Some(current)),
                }
            }
        })
        .await
    }

    pub async fn get_file(&self, name: &str) -> Result<UploadedFile, ChatError> {
        let response = self
            .http
            .get(self.api(name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn delete_file(&self, name: &str) -> Result<(), ChatError> {
        tracing::debug!("Deleting Gemini file {}", name);
        let response = self
            .http
            .delete(self.api(name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn create_cache(&self, req: &CreateCacheRequest) -> Result<CachedContent, ChatError> {
        tracing::debug!("Creating cached content {}", req.display_name);
        let response = self
            .http
            .post(self.api("cachedContents"))
            .header("x-goog-api-key", &self.api_key)
            .json(req)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn get_cache(&self, name: &str) -> Result<CachedContent, ChatError> {
        let response = self
            .http
            .get(self.api(name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn delete_cache(&self, name: &str) -> Result<(), ChatError> {
        tracing::debug!("Deleting cached content {}", name);
        let response = self
            .http
            .delete(self.api(name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn generate(
        &self,
        model: &str,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ChatError> {
        tracing::debug!(
            "generateContent on {} with {} turns (cached: {})",
            model,
            req.contents.len(),
            req.cached_content.is_some()
        );
        let response = self
            .http
            .post(self.api(&format!("{}:generateContent", model)))
            .header("x-goog-api-key", &self.api_key)
            .json(req)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}
