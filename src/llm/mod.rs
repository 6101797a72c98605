pub mod assistants;
pub mod gemini;
pub mod poll;

use crate::config::{Credentials, ModelSpec, Provider};
use crate::exceptions::ChatError;
use crate::models::{ChatRecord, Exchange};
use crate::tools::ToolRegistry;
use assistants::client::AssistantsClient;
use assistants::executor::AssistantsAdapter;
use gemini::client::GeminiClient;
use gemini::executor::GeminiAdapter;

/// The model adapter selected by the `provider/` prefix of the model string.
#[derive(Debug, Clone)]
pub enum Backend {
    Gemini(GeminiAdapter),
    Assistants(AssistantsAdapter),
}

impl Backend {
    /// Builds the adapter, reading the provider's key from the environment.
    pub fn for_model(spec: &ModelSpec) -> Result<Self, ChatError> {
        let credentials = spec.credentials()?;
        Ok(Self::with_credentials(spec, &credentials))
    }

    pub fn with_credentials(spec: &ModelSpec, credentials: &Credentials) -> Self {
        match spec.provider {
            Provider::Gemini => Backend::Gemini(GeminiAdapter::new(
                GeminiClient::new(credentials),
                &spec.model_id,
            )),
            Provider::OpenAi | Provider::DeepSeek => Backend::Assistants(AssistantsAdapter::new(
                AssistantsClient::new(credentials),
                &spec.model_id,
            )),
        }
    }

    pub async fn generate_answer(&self, record: &mut ChatRecord, tools: &ToolRegistry) -> Exchange {
        match self {
            Backend::Gemini(adapter) => adapter.generate_answer(record, tools).await,
            Backend::Assistants(adapter) => adapter.generate_answer(record, tools).await,
        }
    }
}
