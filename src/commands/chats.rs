use super::shared::{ChatTarget, open_state};
use crate::config::AppConfig;
use crate::exceptions::ChatError;
use crate::session::AppState;
use comfy_table::presets::NOTHING;
use comfy_table::*;

/// Lists selectable chats with the index `--chat` accepts.
pub fn list(profile: String, model: Option<String>) -> Result<(), ChatError> {
    let config = AppConfig::from_env(model.as_deref())?;
    let state = AppState::open(&config, &profile)?;
    let titles = state.selectable_titles();

    if titles.is_empty() {
        println!(
            "No chats available for profile '{}'. Check that its PDF documents exist.",
            state.profile.id
        );
        return Ok(());
    }

    println!("{}", state.profile.page_title);

    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_width(crate::console::get_terminal_width() as u16)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#")
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
        Cell::new("Chat").add_attribute(Attribute::Bold),
        Cell::new("Messages")
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);

    for (i, title) in titles.iter().enumerate() {
        let marker = if state.active_title() == Some(title.as_str()) {
            "*"
        } else {
            ""
        };
        let count = state.record(title).map_or(0, |r| r.messages.len());
        table.add_row(vec![
            Cell::new(format!("{}{}", marker, i)).set_alignment(CellAlignment::Right),
            Cell::new(title),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub fn questions(profile: String, model: Option<String>) -> Result<(), ChatError> {
    let config = AppConfig::from_env(model.as_deref())?;
    let profile = config.profiles.get(&profile)?;

    if profile.questions.is_empty() {
        println!("Profile '{}' has no suggested questions.", profile.id);
        return Ok(());
    }
    for (i, q) in profile.questions.iter().enumerate() {
        println!("{:>3}. {}", i + 1, q);
    }
    Ok(())
}

pub fn history(target: ChatTarget) -> Result<(), ChatError> {
    let (_, state) = open_state(&target)?;
    let Some(record) = state.active_chat() else {
        return Err(super::shared::no_chats_error(&state));
    };

    let title = state.active_title().unwrap_or_default();
    crate::console::draw_panel(
        title,
        &[record.pdf_path.display().to_string()],
        crate::console::get_terminal_width(),
    );

    if record.messages.is_empty() {
        println!("No messages yet. Ask a question with `stmtchat ask`.");
        return Ok(());
    }
    for msg in &record.messages {
        crate::console::render_message(msg);
    }
    Ok(())
}
