use crate::exceptions::ChatError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const BUILTIN_PROFILES: &str = include_str!("../profiles.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct PredefinedChat {
    pub title: String,
    pub document: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(skip)]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub page_title: String,
    #[serde(default)]
    pub chats: Vec<PredefinedChat>,
    #[serde(default)]
    pub questions: Vec<String>,
}

impl Profile {
    pub fn document_for(&self, title: &str) -> Option<&Path> {
        self.chats
            .iter()
            .find(|c| c.title == title)
            .map(|c| c.document.as_path())
    }

    pub fn is_predefined(&self, title: &str) -> bool {
        self.chats.iter().any(|c| c.title == title)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileSet {
    pub fn builtin() -> Result<Self, ChatError> {
        Self::parse(BUILTIN_PROFILES, None)
    }

    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Configuration(format!(
                "Could not read profile file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&raw, path.parent())
    }

    /// Parses a profile table. Relative document paths are joined onto `base_dir` when given.
    pub fn parse(raw: &str, base_dir: Option<&Path>) -> Result<Self, ChatError> {
        let file: ProfileFile = toml::from_str(raw)?;
        let mut profiles = file.profiles;

        for (id, profile) in profiles.iter_mut() {
            profile.id = id.clone();
            if profile.page_title.is_empty() {
                profile.page_title = profile.label.clone();
            }
            if let Some(base) = base_dir {
                for chat in profile.chats.iter_mut() {
                    if chat.document.is_relative() {
                        chat.document = base.join(&chat.document);
                    }
                }
            }
        }

        if profiles.is_empty() {
            return Err(ChatError::Configuration(
                "No profiles are defined in the profile table.".into(),
            ));
        }

        Ok(Self { profiles })
    }

    pub fn get(&self, id: &str) -> Result<&Profile, ChatError> {
        self.profiles.get(id).ok_or_else(|| {
            ChatError::InvalidInput(format!(
                "Unknown profile '{}'. Available profiles: {}",
                id,
                self.ids().join(", ")
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_parse() {
        let set = ProfileSet::builtin().unwrap();
        let demo1 = set.get("demo1").unwrap();
        assert_eq!(demo1.chats.len(), 6);
        assert_eq!(
            demo1.questions[0],
            "What is the date range of the given statement?"
        );
        assert_eq!(
            demo1.document_for("01-Apr-2024 to 31-Mar-2025 1"),
            Some(Path::new("documents/demo1/doc1.pdf"))
        );
    }

    #[test]
    fn test_relative_documents_resolve_against_file_dir() {
        let raw = r#"
            [profiles.acme]
            label = "Acme"

            [[profiles.acme.chats]]
            title = "Q1"
            document = "docs/q1.pdf"

            [[profiles.acme.chats]]
            title = "Q2"
            document = "/abs/q2.pdf"
        "#;
        let set = ProfileSet::parse(raw, Some(Path::new("/srv/stmt"))).unwrap();
        let acme = set.get("acme").unwrap();
        assert_eq!(acme.page_title, "Acme");
        assert_eq!(acme.chats[0].document, PathBuf::from("/srv/stmt/docs/q1.pdf"));
        assert_eq!(acme.chats[1].document, PathBuf::from("/abs/q2.pdf"));
        assert!(acme.questions.is_empty());
    }

    #[test]
    fn test_unknown_profile_lists_available_ids() {
        let set = ProfileSet::builtin().unwrap();
        let err = set.get("nope").unwrap_err().to_string();
        assert!(err.contains("demo1"));
        assert!(err.contains("demo4"));
    }
}
