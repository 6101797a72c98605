use crate::config::AppConfig;
use crate::exceptions::ChatError;
use comfy_table::presets::NOTHING;
use comfy_table::*;

pub fn run(model: Option<String>) -> Result<(), ChatError> {
    let config = AppConfig::from_env(model.as_deref())?;
    let width = crate::console::get_terminal_width();

    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_width(width as u16)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Profile").add_attribute(Attribute::Bold),
        Cell::new("Label").add_attribute(Attribute::Bold),
        Cell::new("Chats")
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
        Cell::new("Questions")
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);

    for profile in config.profiles.iter() {
        table.add_row(vec![
            Cell::new(&profile.id),
            Cell::new(&profile.label),
            Cell::new(profile.chats.len()).set_alignment(CellAlignment::Right),
            Cell::new(profile.questions.len()).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}", table);
    Ok(())
}
