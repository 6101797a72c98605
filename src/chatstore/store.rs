use crate::exceptions::ChatError;
use crate::fs::{atomic_write_json, read_json, sanitize_component};
use crate::models::ChatRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One JSON file per chat title, grouped in a directory per profile.
#[derive(Debug, Clone)]
pub struct ChatStore {
    root: PathBuf,
}

impl ChatStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profile_dir(&self, profile: &str) -> PathBuf {
        self.root
            .join(sanitize_component(profile, |c| c.is_alphanumeric()))
    }

    pub fn chat_path(&self, profile: &str, title: &str) -> PathBuf {
        let safe_title = sanitize_component(title, |c| c.is_alphanumeric() || c == ' ' || c == '-');
        self.profile_dir(profile).join(format!("{}.json", safe_title))
    }

    /// Loads every readable record of a profile. Malformed files are skipped with a warning.
    pub fn load(&self, profile: &str) -> Result<BTreeMap<String, ChatRecord>, ChatError> {
        let dir = self.profile_dir(profile);
        fs::create_dir_all(&dir)?;

        let mut chats = BTreeMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match read_json::<ChatRecord>(&path) {
                Ok(mut record) => {
                    let title = record.title.clone().unwrap_or_else(|| stem.to_string());
                    record.title = Some(title.clone());
                    chats.insert(title, record);
                }
                Err(e) => {
                    tracing::warn!("Skipping chat file {}: {}", path.display(), e);
                }
            }
        }

        Ok(chats)
    }

    /// Title stored in the file `title` maps to, when that is a different chat.
    /// Distinct titles can sanitize to the same file name.
    pub fn conflicting_title(&self, profile: &str, title: &str) -> Option<String> {
        let path = self.chat_path(profile, title);
        if !path.is_file() {
            return None;
        }
        let stored = read_json::<ChatRecord>(&path).ok()?.title?;
        (stored != title).then_some(stored)
    }

    pub fn save(&self, profile: &str, title: &str, record: &ChatRecord) -> Result<(), ChatError> {
        let path = self.chat_path(profile, title);
        if let Some(other) = self.conflicting_title(profile, title) {
            tracing::warn!(
                "Chat '{}' overwrites chat '{}' stored in {}",
                title,
                other,
                path.display()
            );
        }
        tracing::debug!("Saving chat '{}' to {}", title, path.display());
        if record.title.as_deref() == Some(title) {
            atomic_write_json(&path, record)
        } else {
            let mut titled = record.clone();
            titled.title = Some(title.to_string());
            atomic_write_json(&path, &titled)
        }
    }

    /// Deletes the persisted record. A file that is already gone is not an error.
    pub fn remove(&self, profile: &str, title: &str) -> Result<(), ChatError> {
        match fs::remove_file(self.chat_path(profile, title)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChatError::Io(e)),
        }
    }
}
