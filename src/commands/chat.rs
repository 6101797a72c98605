use super::shared::{ChatTarget, ask_and_render, exchange_stack, gemini_cleanup_client, open_state, resolve_question};
use super::view::open_document;
use crate::config::AppConfig;
use crate::exceptions::ChatError;
use crate::session::AppState;
use crossterm::style::Stylize;
use std::io::{BufRead, Write};

const HELP: &str = "\
Commands:
  /questions      list suggested questions
  /ask <N>        ask suggested question N
  /chats          list chats
  /switch <chat>  switch chat by title or index
  /history        show the conversation so far
  /view           open the PDF in the viewer
  /clear          delete this chat's history
  /help           show this help
  /quit           leave
Anything else is sent as a question.";

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Question(&'a str),
    Questions,
    AskSuggested(&'a str),
    Chats,
    Switch(&'a str),
    History,
    View,
    Clear,
    Help,
    Quit,
    Unknown(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(cmd) = line.strip_prefix('/') else {
        return Input::Question(line);
    };
    let (name, arg) = cmd.split_once(char::is_whitespace).unwrap_or((cmd, ""));
    let arg = arg.trim();
    match name {
        "questions" | "q" => Input::Questions,
        "ask" => Input::AskSuggested(arg),
        "chats" => Input::Chats,
        "switch" | "s" => Input::Switch(arg),
        "history" | "h" => Input::History,
        "view" => Input::View,
        "clear" => Input::Clear,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => Input::Unknown(name),
    }
}

fn print_chats(state: &AppState) {
    for (i, title) in state.selectable_titles().iter().enumerate() {
        let marker = if state.active_title() == Some(title.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{} {:>2}  {}", marker, i, title);
    }
}

fn print_questions(state: &AppState) {
    for (i, q) in state.questions().iter().enumerate() {
        println!("{:>3}. {}", i + 1, q);
    }
}

fn prompt_line(state: &AppState) -> String {
    let title = state.active_title().unwrap_or("no chat");
    if crate::console::is_stdout_terminal() {
        format!("{} > ", title.bold())
    } else {
        format!("{} > ", title)
    }
}

pub async fn run(target: ChatTarget) -> Result<(), ChatError> {
    let (config, mut state) = open_state(&target)?;
    let (backend, tools) = exchange_stack(&config)?;

    crate::console::draw_panel(
        &state.profile.page_title,
        &[format!("Model: {}", config.model), "Type /help for commands.".to_string()],
        crate::console::get_terminal_width(),
    );

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", prompt_line(&state));
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;

        let outcome = match parse_input(&line) {
            Input::Empty => Ok(()),
            Input::Quit => break,
            Input::Help => {
                println!("{}", HELP);
                Ok(())
            }
            Input::Questions => {
                print_questions(&state);
                Ok(())
            }
            Input::Chats => {
                print_chats(&state);
                Ok(())
            }
            Input::Switch(selector) => state.select_chat(selector).map(|title| {
                println!("Switched to '{}'.", title);
            }),
            Input::History => {
                if let Some(record) = state.active_chat() {
                    record.messages.iter().for_each(crate::console::render_message);
                }
                Ok(())
            }
            Input::View => view_active(&state, &config),
            Input::Clear => clear_active(&mut state).await,
            Input::AskSuggested(arg) => match arg.parse::<usize>() {
                Ok(n) => match resolve_question(&state, n) {
                    Ok(q) => {
                        if crate::console::is_stdout_terminal() {
                            println!("{}", q.as_str().dim());
                        } else {
                            println!("{}", q);
                        }
                        ask_and_render(&mut state, &backend, &tools, &q).await.map(|_| ())
                    }
                    Err(e) => Err(e),
                },
                Err(_) => Err(ChatError::InvalidInput("Usage: /ask <N>".into())),
            },
            Input::Question(q) => {
                if state.active_title().is_none() {
                    Err(super::shared::no_chats_error(&state))
                } else {
                    ask_and_render(&mut state, &backend, &tools, q).await.map(|_| ())
                }
            }
            Input::Unknown(name) => Err(ChatError::InvalidInput(format!(
                "Unknown command '/{}'. Type /help for commands.",
                name
            ))),
        };

        if let Err(e) = outcome {
            eprintln!("Error: {}", e);
        }
    }
    Ok(())
}

fn view_active(state: &AppState, config: &AppConfig) -> Result<(), ChatError> {
    let record = state
        .active_chat()
        .ok_or_else(|| super::shared::no_chats_error(state))?;
    open_document(&record.pdf_path, config.pdf_viewer.as_deref())
}

async fn clear_active(state: &mut AppState) -> Result<(), ChatError> {
    let gemini = gemini_cleanup_client();
    let title = state.clear_active_chat(gemini.as_ref()).await?;
    println!("Cleared chat '{}'.", title);
    match state.active_title() {
        Some(next) => println!("Now on '{}'.", next),
        None => println!("No chats left in this profile."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_commands_and_questions() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(
            parse_input("What is the net P&L?"),
            Input::Question("What is the net P&L?")
        );
        assert_eq!(parse_input("/ask 3"), Input::AskSuggested("3"));
        assert_eq!(
            parse_input("/switch FY 2024-2025 1"),
            Input::Switch("FY 2024-2025 1")
        );
        assert_eq!(parse_input("/exit"), Input::Quit);
        assert_eq!(parse_input("/bogus"), Input::Unknown("bogus"));
    }
}
