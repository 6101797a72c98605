use crate::config::{AppConfig, ModelSpec, Provider};
use crate::exceptions::ChatError;
use crate::llm::Backend;
use crate::llm::gemini::client::GeminiClient;
use crate::models::Exchange;
use crate::session::AppState;
use crate::tools::ToolRegistry;
use crate::tools::market_data::MarketDataClient;

/// Options every chat-bound command accepts.
#[derive(Debug, Clone, Default)]
pub struct ChatTarget {
    pub profile: String,
    pub model: Option<String>,
    pub chat: Option<String>,
}

pub fn open_state(target: &ChatTarget) -> Result<(AppConfig, AppState), ChatError> {
    let config = AppConfig::from_env(target.model.as_deref())?;
    let mut state = AppState::open(&config, &target.profile)?;

    if let Some(selector) = &target.chat {
        state.select_chat(selector)?;
    } else if state.active_title().is_none() {
        return Err(no_chats_error(&state));
    }
    Ok((config, state))
}

pub fn no_chats_error(state: &AppState) -> ChatError {
    ChatError::NotFound(format!(
        "Profile '{}' has no chats with a readable PDF document.",
        state.profile.id
    ))
}

/// Fails early when the selected model's API key is missing.
pub fn exchange_stack(config: &AppConfig) -> Result<(Backend, ToolRegistry), ChatError> {
    let backend = Backend::for_model(&config.model)?;
    let tools = ToolRegistry::new(MarketDataClient::new(&config.market_data_url));
    Ok((backend, tools))
}

/// Gemini client for cache cleanup, if a Gemini key is configured.
pub fn gemini_cleanup_client() -> Option<GeminiClient> {
    let spec = ModelSpec {
        provider: Provider::Gemini,
        model_id: String::new(),
    };
    spec.credentials().ok().map(|c| GeminiClient::new(&c))
}

/// The `--profile` value on a command line being completed. The last one wins.
pub fn completion_profile<I: IntoIterator<Item = String>>(args: I) -> Option<String> {
    let mut found = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--profile" || arg == "-p" {
            if let Some(value) = args.next() {
                found = Some(value);
            }
        } else if let Some(value) = arg.strip_prefix("--profile=") {
            found = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("-p")
            && !value.is_empty()
            && !arg.starts_with("--")
        {
            found = Some(value.trim_start_matches('=').to_string());
        }
    }
    found.filter(|p| !p.is_empty())
}

pub fn resolve_question(state: &AppState, number: usize) -> Result<String, ChatError> {
    let questions = state.questions();
    number
        .checked_sub(1)
        .and_then(|i| questions.get(i))
        .cloned()
        .ok_or_else(|| {
            ChatError::InvalidInput(format!(
                "Question {} does not exist. Profile '{}' has {} suggested questions.",
                number,
                state.profile.id,
                questions.len()
            ))
        })
}

pub async fn ask_and_render(
    state: &mut AppState,
    backend: &Backend,
    tools: &ToolRegistry,
    query: &str,
) -> Result<Exchange, ChatError> {
    let exchange = {
        let _status = crate::console::ThinkingStatus::start();
        state.ask(backend, tools, query).await?
    };

    let width = crate::console::get_terminal_width();
    println!("{}", exchange.answer.trim_end());
    if let Some(chart) = &exchange.chart {
        println!();
        println!("{}", crate::console::render_chart(chart, width));
    }
    Ok(exchange)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_completion_profile_reads_flag_forms() {
        assert_eq!(
            completion_profile(args("stmtchat -- stmtchat --profile demo3 ask --chat")),
            Some("demo3".into())
        );
        assert_eq!(
            completion_profile(args("stmtchat --profile=demo2 chat -c")),
            Some("demo2".into())
        );
        assert_eq!(
            completion_profile(args("stmtchat -p demo4 -pdemo2 view --chat")),
            Some("demo2".into())
        );
        assert_eq!(completion_profile(args("stmtchat ask --chat")), None);
        assert_eq!(completion_profile(args("stmtchat ask --profile")), None);
    }
}
