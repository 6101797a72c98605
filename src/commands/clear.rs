use super::shared::{ChatTarget, gemini_cleanup_client, open_state};
use crate::exceptions::ChatError;

pub async fn run(target: ChatTarget) -> Result<(), ChatError> {
    let (_, mut state) = open_state(&target)?;
    let gemini = gemini_cleanup_client();
    let title = state.clear_active_chat(gemini.as_ref()).await?;
    println!("Cleared chat '{}'.", title);
    Ok(())
}
