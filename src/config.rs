use crate::consts::{DEFAULT_CHATS_DIR, DEFAULT_MODEL};
use crate::exceptions::ChatError;
use crate::profiles::ProfileSet;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_MARKET_DATA_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
    DeepSeek,
}

impl Provider {
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    fn base_url_env(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_BASE_URL",
            Provider::OpenAi => "OPENAI_BASE_URL",
            Provider::DeepSeek => "DEEPSEEK_BASE_URL",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::DeepSeek => "https://api.deepseek.com",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::OpenAi => write!(f, "openai"),
            Provider::DeepSeek => write!(f, "deepseek"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: Provider,
    pub model_id: String,
}

impl ModelSpec {
    pub fn parse(full_str: &str) -> Result<Self, ChatError> {
        let (provider, model_name) = full_str.split_once('/').ok_or_else(|| {
            ChatError::Configuration(format!(
                "Invalid model format '{}'. Expected 'provider/model'.",
                full_str
            ))
        })?;

        let provider = match provider {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAi,
            "deepseek" => Provider::DeepSeek,
            _ => {
                return Err(ChatError::Configuration(format!(
                    "Unrecognized provider prefix in '{}'. Use 'gemini/', 'openai/' or 'deepseek/'.",
                    full_str
                )));
            }
        };

        if model_name.trim().is_empty() {
            return Err(ChatError::Configuration(format!(
                "Model name is missing in '{}'.",
                full_str
            )));
        }

        Ok(Self {
            provider,
            model_id: model_name.to_string(),
        })
    }

    /// Reads the API key and endpoint for this model's provider from the environment.
    pub fn credentials(&self) -> Result<Credentials, ChatError> {
        let key_env = self.provider.api_key_env();
        let api_key = env::var(key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ChatError::Configuration(format!(
                    "{} not found. Please set it in your environment or .env file.",
                    key_env
                ))
            })?;

        let base_url = env::var(self.provider.base_url_env())
            .unwrap_or_else(|_| self.provider.default_base_url().to_string());

        Ok(Credentials {
            api_key,
            base_url: crate::utils::normalize_base_url(&base_url),
        })
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model_id)
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chats_dir: PathBuf,
    pub profiles: ProfileSet,
    pub model: ModelSpec,
    pub market_data_url: String,
    pub pdf_viewer: Option<String>,
}

impl AppConfig {
    pub fn from_env(model_override: Option<&str>) -> Result<Self, ChatError> {
        let chats_dir = env::var("STMTCHAT_CHATS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CHATS_DIR));

        let profiles = match env::var("STMTCHAT_PROFILES") {
            Ok(path) => ProfileSet::load(&PathBuf::from(path))?,
            Err(_) => ProfileSet::builtin()?,
        };

        let model_str = model_override
            .map(str::to_string)
            .or_else(|| env::var("STMTCHAT_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let model = ModelSpec::parse(&model_str)?;

        let market_data_url = env::var("STMTCHAT_MARKET_DATA_URL")
            .unwrap_or_else(|_| DEFAULT_MARKET_DATA_URL.to_string());

        Ok(Self {
            chats_dir,
            profiles,
            model,
            market_data_url: crate::utils::normalize_base_url(&market_data_url),
            pdf_viewer: env::var("STMTCHAT_PDF_VIEWER").ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_spec_providers() {
        let spec = ModelSpec::parse("gemini/gemini-2.5-pro").unwrap();
        assert_eq!(spec.provider, Provider::Gemini);
        assert_eq!(spec.model_id, "gemini-2.5-pro");
        assert_eq!(spec.to_string(), "gemini/gemini-2.5-pro");

        let spec = ModelSpec::parse("openai/gpt-4o").unwrap();
        assert_eq!(spec.provider, Provider::OpenAi);

        let spec = ModelSpec::parse("deepseek/deepseek-chat").unwrap();
        assert_eq!(spec.provider, Provider::DeepSeek);
    }

    #[test]
    fn test_parse_model_spec_rejects_bad_input() {
        assert!(ModelSpec::parse("gpt-4o").is_err());
        assert!(ModelSpec::parse("anthropic/claude").is_err());
        assert!(ModelSpec::parse("gemini/").is_err());
    }
}
