use super::api_models::{Attachment, CreateAssistantRequest, CreateMessageRequest, Run, ToolOutput};
use super::client::AssistantsClient;
use crate::consts::*;
use crate::exceptions::ChatError;
use crate::llm::poll::{PollSettings, poll_until};
use crate::models::{ChartSpec, ChatRecord, Exchange};
use crate::tools::{ToolContext, ToolRegistry, unknown_tool_output};
use serde_json::{Value, json};
use std::cell::Cell;
use std::time::Duration;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy)]
pub struct AssistantPolling {
    pub file: PollSettings,
    pub run: PollSettings,
}

impl Default for AssistantPolling {
    fn default() -> Self {
        Self {
            file: PollSettings::every(Duration::from_secs(2)).with_deadline(Duration::from_secs(60)),
            run: PollSettings::every(Duration::from_secs(1)),
        }
    }
}

pub fn assistant_fingerprint(model_id: &str) -> String {
    format!("{}_{}", ASSISTANT_NAME, model_id)
}

fn file_is_fresh(uploaded_at: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    uploaded_at.is_some_and(|at| (now - at).whole_seconds() < FILE_FRESHNESS_SECS)
}

/// Answers through a persistent assistant, one thread per chat record.
#[derive(Debug, Clone)]
pub struct AssistantsAdapter {
    client: AssistantsClient,
    model_id: String,
    polling: AssistantPolling,
}

impl AssistantsAdapter {
    pub fn new(client: AssistantsClient, model_id: &str) -> Self {
        Self {
            client,
            model_id: model_id.to_string(),
            polling: AssistantPolling::default(),
        }
    }

    pub fn with_polling(mut self, polling: AssistantPolling) -> Self {
        self.polling = polling;
        self
    }

    /// Runs one exchange for the record's last user message. Thread and
    /// file handles are written back onto the record as they are obtained.
    pub async fn generate_answer(&self, record: &mut ChatRecord, tools: &ToolRegistry) -> Exchange {
        let Some(query) = record.last_user_query().map(str::to_string) else {
            return Exchange::text(EMPTY_RESPONSE);
        };

        let assistant_id = match self.get_or_create_assistant(tools).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Assistant setup failed: {}", e);
                return Exchange::text(ASSISTANT_INIT_FAILED);
            }
        };

        let staged = Cell::new(None);
        match self
            .run_exchange(record, tools, &assistant_id, &query, &staged)
            .await
        {
            Ok(answer) => Exchange {
                answer,
                chart: staged.take(),
            },
            Err(e) => {
                tracing::error!("Assistant exchange failed: {}", e);
                Exchange::text(format!("An unexpected error occurred: {}", e))
            }
        }
    }

    async fn get_or_create_assistant(&self, tools: &ToolRegistry) -> Result<String, ChatError> {
        let fingerprint = assistant_fingerprint(&self.model_id);
        let existing = self.client.list_assistants().await?;
        if let Some(found) = existing
            .into_iter()
            .find(|a| a.name.as_deref() == Some(fingerprint.as_str()))
        {
            return Ok(found.id);
        }

        let mut all_tools = vec![json!({ "type": "file_search" })];
        all_tools.extend(tools.declarations().iter().map(|d| d.to_openai()));

        let created = self
            .client
            .create_assistant(&CreateAssistantRequest {
                name: fingerprint,
                instructions: DETAILED_SYSTEM_INSTRUCTION.to_string(),
                model: self.model_id.clone(),
                tools: all_tools,
            })
            .await?;
        tracing::info!("Created assistant {}", created.id);
        Ok(created.id)
    }

    async fn ensure_file(&self, record: &mut ChatRecord) -> Result<String, ChatError> {
        let now = OffsetDateTime::now_utc();
        if let Some(id) = &record.openai_file_id
            && file_is_fresh(record.openai_file_uploaded_at, now)
        {
            return Ok(id.clone());
        }

        if !record.pdf_path.is_file() {
            return Err(ChatError::NotFound(format!(
                "PDF file not found for processing: {}",
                record.pdf_path.display()
            )));
        }

        let uploaded = self.client.upload_file(&record.pdf_path).await?;
        let client = &self.client;
        let file_id = uploaded.id.clone();
        poll_until(self.polling.file, "document processing", || {
            let file_id = file_id.clone();
            async move {
                let status = client.retrieve_file(&file_id).await?;
                match status.status.as_deref() {
                    Some("processed") => Ok(Some(())),
                    Some("error") | Some("failed") => Err(ChatError::Provider(
                        "File processing failed on the provider side.".into(),
                    )),
                    _ => Ok(None),
                }
            }
        })
        .await?;

        record.openai_file_id = Some(uploaded.id.clone());
        record.openai_file_uploaded_at = Some(OffsetDateTime::now_utc());
        Ok(uploaded.id)
    }

    async fn run_exchange(
        &self,
        record: &mut ChatRecord,
        tools: &ToolRegistry,
        assistant_id: &str,
        query: &str,
        staged: &Cell<Option<ChartSpec>>,
    ) -> Result<String, ChatError> {
        let file_id = self.ensure_file(record).await?;

        let thread_id = match &record.openai_thread_id {
            Some(id) => id.clone(),
            None => {
                let thread = self.client.create_thread().await?;
                record.openai_thread_id = Some(thread.id.clone());
                thread.id
            }
        };

        self.client
            .create_message(
                &thread_id,
                &CreateMessageRequest {
                    role: "user".to_string(),
                    content: query.to_string(),
                    attachments: vec![Attachment {
                        file_id,
                        tools: vec![json!({ "type": "file_search" })],
                    }],
                },
            )
            .await?;

        let run = self.client.create_run(&thread_id, assistant_id).await?;
        let run_id = run.id.clone();
        let client = &self.client;
        let thread = thread_id.as_str();

        let finished: Run = poll_until(self.polling.run, "the assistant run", || {
            let run_id = run_id.clone();
            async move {
                let run = client.retrieve_run(thread, &run_id).await?;
                if run.is_pending() {
                    return Ok(None);
                }
                if run.status != "requires_action" {
                    return Ok(Some(run));
                }

                let mut outputs = Vec::new();
                for call in run.tool_calls() {
                    let args: Value = serde_json::from_str(&call.function.arguments)
                        .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
                    let mut ctx = ToolContext::default();
                    let output = match tools.call(&call.function.name, &args, &mut ctx).await {
                        Some(output) => output,
                        None => unknown_tool_output(&call.function.name),
                    };
                    if let Some(chart) = ctx.staged_chart {
                        staged.set(Some(chart));
                    }
                    outputs.push(ToolOutput {
                        tool_call_id: call.id.clone(),
                        output,
                    });
                }
                client.submit_tool_outputs(thread, &run.id, outputs).await?;
                Ok(None)
            }
        })
        .await?;

        if finished.status == "completed" {
            let message = self.client.latest_message(&thread_id).await?;
            return Ok(message
                .and_then(|m| m.text().map(str::to_string))
                .unwrap_or_else(|| EMPTY_RESPONSE.to_string()));
        }

        let mut answer = format!("Assistant run finished with status: {}", finished.status);
        if let Some(err) = &finished.last_error {
            answer.push_str(&format!(" - {}", err.message));
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_freshness_window() {
        let now = OffsetDateTime::now_utc();
        assert!(file_is_fresh(Some(now - time::Duration::minutes(59)), now));
        assert!(!file_is_fresh(Some(now - time::Duration::minutes(61)), now));
        assert!(!file_is_fresh(None, now));
    }

    #[test]
    fn test_fingerprint_includes_model() {
        assert_eq!(
            assistant_fingerprint("gpt-4o"),
            "PDF_Q&A_Financial_Assistant_gpt-4o"
        );
    }
}
