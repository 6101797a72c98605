use super::api_models::{
    Candidate, Content, CreateCacheRequest, GenerateContentRequest, GenerationConfig, Part, Tool,
};
use super::client::GeminiClient;
use crate::consts::*;
use crate::exceptions::ChatError;
use crate::models::{CacheEvent, CacheState, ChatRecord, Exchange, Message, Role};
use crate::tools::{ToolContext, ToolRegistry};
use serde_json::Value;
use std::path::Path;

const USABLE_FINISH_REASONS: [&str; 3] = ["STOP", "MAX_TOKENS", "FINISH_REASON_UNSPECIFIED"];

pub fn qualified_model(model_id: &str) -> String {
    if model_id.starts_with("models/") {
        model_id.to_string()
    } else {
        format!("models/{}", model_id)
    }
}

pub fn cache_display_name(pdf_path: &Path, model_id: &str) -> String {
    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}_cache_{}", file_name, model_id.replace('.', "_"))
}

/// Chat history as Gemini turns. Adjacent turns with the same role are merged
/// into one so the request alternates user/model.
pub fn history_contents(messages: &[Message]) -> Vec<Content> {
    messages
        .iter()
        .map(|m| {
            let part = Part::text(m.conversation_text());
            match m.role {
                Role::User => Content::user(vec![part]),
                Role::Assistant => Content::model(vec![part]),
            }
        })
        .collect()
}

pub fn merge_turns(contents: Vec<Content>) -> Vec<Content> {
    let mut merged: Vec<Content> = Vec::with_capacity(contents.len());
    for turn in contents {
        match merged.last_mut() {
            Some(last) if last.role == turn.role => last.parts.extend(turn.parts),
            _ => merged.push(turn),
        }
    }
    merged
}

fn describe_empty(candidate: &Candidate, prompt_feedback: Option<&Value>) -> String {
    if let Some(reason) = candidate.finish_reason.as_deref()
        && !USABLE_FINISH_REASONS.contains(&reason)
    {
        let mut answer = format!("Could not generate content. Reason: {}.", reason);
        if let Some(ratings) = &candidate.safety_ratings
            && !ratings.is_empty()
        {
            answer.push_str(&format!(" Safety Ratings: {}", Value::Array(ratings.clone())));
        }
        return answer;
    }
    match prompt_feedback {
        Some(fb) => format!("Could not generate content. Prompt Feedback: {}", fb),
        None => EMPTY_RESPONSE.to_string(),
    }
}

/// Answers questions about a record's document with Gemini, reusing a prompt
/// cache when one is available.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    client: GeminiClient,
    model_id: String,
}

impl GeminiAdapter {
    pub fn new(client: GeminiClient, model_id: &str) -> Self {
        Self {
            client,
            model_id: model_id.to_string(),
        }
    }

    /// Runs one exchange. The record's last message is the new user query.
    /// Never fails: any error becomes the answer text.
    pub async fn generate_answer(&self, record: &mut ChatRecord, tools: &ToolRegistry) -> Exchange {
        match self.run_exchange(record, tools).await {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::error!("Gemini exchange failed: {}", e);
                Exchange::text(format!("An unexpected error occurred: {}", e))
            }
        }
    }

    async fn run_exchange(
        &self,
        record: &mut ChatRecord,
        tools: &ToolRegistry,
    ) -> Result<Exchange, ChatError> {
        let model = qualified_model(&self.model_id);

        self.validate_cache(record, &model).await;

        if record.cache.cache_name().is_none() && !record.pdf_path.is_file() {
            return Ok(Exchange::text(format!(
                "Error: PDF file not found for processing: {}",
                record.pdf_path.display()
            )));
        }

        if matches!(record.cache, CacheState::NoCache) {
            self.create_cache(record, &model, tools).await;
        }

        let mut fallback_upload = None;
        let result = self
            .converse(record, tools, &model, &mut fallback_upload)
            .await;

        if let Some(file) = fallback_upload
            && let Err(e) = self.client.delete_file(&file.name).await
        {
            tracing::warn!("Could not delete uploaded file {}: {}", file.name, e);
        }

        result
    }

    async fn validate_cache(&self, record: &mut ChatRecord, model: &str) {
        let CacheState::Cached {
            name,
            model: recorded_model,
        } = &record.cache
        else {
            return;
        };
        let name = name.clone();
        let recorded_ok = recorded_model.as_deref() == Some(model);

        match self.client.get_cache(&name).await {
            Ok(remote) if recorded_ok && remote.model.as_deref() == Some(model) => {
                tracing::info!("Reusing cached content {}", name);
            }
            Ok(remote) => {
                tracing::info!(
                    "Cached content {} belongs to {:?}, not {}; discarding",
                    name,
                    remote.model,
                    model
                );
                if let Err(e) = self.client.delete_cache(&name).await {
                    tracing::warn!("Could not delete cached content {}: {}", name, e);
                }
                record.cache.apply(CacheEvent::Invalidated);
            }
            Err(e) => {
                tracing::info!("Cached content {} is no longer available: {}", name, e);
                record.cache.apply(CacheEvent::Invalidated);
            }
        }
    }

    async fn create_cache(&self, record: &mut ChatRecord, model: &str, tools: &ToolRegistry) {
        let file = match self.client.upload_file(&record.pdf_path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Upload for caching failed, using direct upload: {}", e);
                record.cache.apply(CacheEvent::CreationFailed);
                return;
            }
        };

        let req = CreateCacheRequest {
            model: model.to_string(),
            display_name: cache_display_name(&record.pdf_path, &self.model_id),
            system_instruction: Content::system(DETAILED_SYSTEM_INSTRUCTION),
            contents: vec![Content::user(vec![Part::file(&file)])],
            tools: Tool::from_declarations(&tools.declarations()),
            ttl: CACHE_TTL.to_string(),
        };
        let created = self.client.create_cache(&req).await;

        if let Err(e) = self.client.delete_file(&file.name).await {
            tracing::warn!("Could not delete uploaded file {}: {}", file.name, e);
        }

        match created {
            Ok(cache) => {
                tracing::info!("Created cached content {} for {}", cache.name, model);
                record.cache.apply(CacheEvent::Created {
                    name: cache.name,
                    model: model.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!("Cache creation failed, using direct upload: {}", e);
                record.cache.apply(CacheEvent::CreationFailed);
            }
        }
    }

    async fn converse(
        &self,
        record: &ChatRecord,
        tools: &ToolRegistry,
        model: &str,
        fallback_upload: &mut Option<super::api_models::UploadedFile>,
    ) -> Result<Exchange, ChatError> {
        let history = history_contents(&record.messages);

        let (mut contents, cached_content, request_tools) = match record.cache.cache_name() {
            Some(name) => (merge_turns(history), Some(name.to_string()), None),
            None => {
                let file = self.client.upload_file(&record.pdf_path).await?;
                let mut contents = vec![Content::user(vec![
                    Part::text(DETAILED_SYSTEM_INSTRUCTION),
                    Part::file(&file),
                ])];
                *fallback_upload = Some(file);
                contents.extend(history);
                (
                    merge_turns(contents),
                    None,
                    Some(Tool::from_declarations(&tools.declarations())),
                )
            }
        };

        let mut ctx = ToolContext::default();
        let mut rounds = 0;

        while rounds < MAX_FUNCTION_CALLS {
            let req = GenerateContentRequest {
                contents: contents.clone(),
                generation_config: GenerationConfig {
                    temperature: TEMPERATURE,
                },
                cached_content: cached_content.clone(),
                tools: request_tools.clone(),
            };
            let response = self.client.generate(model, &req).await?;

            let Some(candidate) = response.candidates.first() else {
                let mut answer = NO_CANDIDATES.to_string();
                if let Some(fb) = &response.prompt_feedback {
                    answer.push_str(&format!(" Prompt Feedback: {}", fb));
                }
                return Ok(Exchange::text(answer));
            };

            let parts = candidate
                .content
                .as_ref()
                .map(|c| c.parts.as_slice())
                .unwrap_or_default();

            let calls: Vec<_> = parts.iter().filter_map(|p| p.function_call.as_ref()).collect();
            if !calls.is_empty() {
                let mut responses = Vec::with_capacity(calls.len());
                for call in calls {
                    let Some(output) = tools.call(&call.name, &call.args, &mut ctx).await else {
                        return Ok(Exchange::text(format!(
                            "Error: The model tried to use an unavailable tool: {}.",
                            call.name
                        )));
                    };
                    responses.push(Part::function_response(&call.name, output));
                }
                contents.push(Content::model(parts.to_vec()));
                contents.push(Content::user(responses));
                rounds += 1;
                continue;
            }

            if !parts.is_empty() {
                let answer: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
                return Ok(Exchange {
                    answer,
                    chart: ctx.staged_chart,
                });
            }

            return Ok(Exchange::text(describe_empty(
                candidate,
                response.prompt_feedback.as_ref(),
            )));
        }

        Ok(Exchange {
            answer: EXCEEDED_FUNCTION_CALLS.to_string(),
            chart: ctx.staged_chart,
        })
    }
}
