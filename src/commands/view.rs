use super::shared::{ChatTarget, open_state};
use crate::exceptions::ChatError;
use std::path::Path;
use std::process::Command;

fn default_viewer() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["open".into()]
    } else if cfg!(target_os = "windows") {
        vec!["cmd".into(), "/C".into(), "start".into(), "".into()]
    } else {
        vec!["xdg-open".into()]
    }
}

/// Hands the PDF to `viewer` (a shell-style command line) or the platform opener.
pub fn open_document(path: &Path, viewer: Option<&str>) -> Result<(), ChatError> {
    let parts = match viewer {
        Some(cmd) => shlex::split(cmd).ok_or_else(|| {
            ChatError::Configuration(format!(
                "Failed to parse STMTCHAT_PDF_VIEWER variable: '{}'",
                cmd
            ))
        })?,
        None => default_viewer(),
    };

    if parts.is_empty() {
        return Err(ChatError::Configuration(
            "STMTCHAT_PDF_VIEWER environment variable is empty".into(),
        ));
    }

    let status = Command::new(&parts[0])
        .args(&parts[1..])
        .arg(path)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ChatError::InvalidInput(format!(
                    "PDF viewer '{}' not found. Please set STMTCHAT_PDF_VIEWER.",
                    parts[0]
                ))
            } else {
                ChatError::Io(e)
            }
        })?;

    if !status.success() {
        return Err(ChatError::InvalidInput(format!(
            "PDF viewer exited with code {}.",
            status.code().unwrap_or(1)
        )));
    }
    Ok(())
}

pub fn run(target: ChatTarget) -> Result<(), ChatError> {
    let (config, state) = open_state(&target)?;
    let record = state
        .active_chat()
        .ok_or_else(|| super::shared::no_chats_error(&state))?;
    open_document(&record.pdf_path, config.pdf_viewer.as_deref())
}
