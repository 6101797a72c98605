use super::shared::{ChatTarget, ask_and_render, exchange_stack, open_state, resolve_question};
use crate::exceptions::ChatError;
use std::io::Read;

pub async fn run(
    target: ChatTarget,
    question: Option<String>,
    number: Option<usize>,
) -> Result<(), ChatError> {
    let (config, mut state) = open_state(&target)?;

    let query = match (question, number) {
        (Some(q), _) => q,
        (None, Some(n)) => resolve_question(&state, n)?,
        (None, None) if !crate::console::is_stdin_terminal() => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        (None, None) => {
            return Err(ChatError::InvalidInput(
                "Provide a question, --question <N>, or pipe the question on stdin.".into(),
            ));
        }
    };
    if query.trim().is_empty() {
        return Err(ChatError::InvalidInput("Question must not be empty.".into()));
    }

    let (backend, tools) = exchange_stack(&config)?;
    ask_and_render(&mut state, &backend, &tools, &query).await?;
    Ok(())
}
