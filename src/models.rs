use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::OffsetDateTime;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Chart,
}

// --- Messages ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            kind: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind: None,
        }
    }

    pub fn chart(spec: &ChartSpec) -> Result<Self, serde_json::Error> {
        Ok(Self {
            role: Role::Assistant,
            content: serde_json::to_string(spec)?,
            kind: Some(MessageKind::Chart),
        })
    }

    pub fn is_chart(&self) -> bool {
        self.kind == Some(MessageKind::Chart)
    }

    /// Parses the chart payload of a `chart` message.
    pub fn chart_spec(&self) -> Option<ChartSpec> {
        if !self.is_chart() {
            return None;
        }
        serde_json::from_str(&self.content).ok()
    }

    /// How the message is replayed to a model as plain conversation text.
    pub fn conversation_text(&self) -> String {
        match self.chart_spec() {
            Some(spec) => format!("[Displayed chart: {}]", spec.title),
            None => self.content.clone(),
        }
    }
}

// --- Prompt cache lifecycle ---

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheState {
    #[default]
    NoCache,
    Cached {
        name: String,
        model: Option<String>,
    },
    /// Cache creation failed once; every exchange uploads the document directly.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Created { name: String, model: String },
    Invalidated,
    CreationFailed,
    DocumentChanged,
}

impl CacheState {
    pub fn transition(self, event: CacheEvent) -> CacheState {
        match (self, event) {
            (_, CacheEvent::DocumentChanged) => CacheState::NoCache,
            (CacheState::Disabled, _) => CacheState::Disabled,
            (_, CacheEvent::Created { name, model }) => CacheState::Cached {
                name,
                model: Some(model),
            },
            (_, CacheEvent::Invalidated) => CacheState::NoCache,
            (_, CacheEvent::CreationFailed) => CacheState::Disabled,
        }
    }

    pub fn apply(&mut self, event: CacheEvent) {
        *self = std::mem::take(self).transition(event);
    }

    pub fn cache_name(&self) -> Option<&str> {
        match self {
            CacheState::Cached { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, CacheState::Disabled)
    }

    fn from_fields(name: Option<String>, model: Option<String>, failed: bool) -> Self {
        match (failed, name) {
            (true, _) => CacheState::Disabled,
            (false, Some(name)) => CacheState::Cached { name, model },
            (false, None) => CacheState::NoCache,
        }
    }
}

// --- Chat records (chats/<profile>/<title>.json) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ChatRecordFile", into = "ChatRecordFile")]
pub struct ChatRecord {
    pub title: Option<String>,
    pub pdf_path: PathBuf,
    pub messages: Vec<Message>,
    pub cache: CacheState,
    pub openai_thread_id: Option<String>,
    pub openai_file_id: Option<String>,
    pub openai_file_uploaded_at: Option<OffsetDateTime>,
}

impl ChatRecord {
    pub fn new(title: &str, pdf_path: PathBuf) -> Self {
        Self {
            title: Some(title.to_string()),
            pdf_path,
            messages: Vec::new(),
            cache: CacheState::NoCache,
            openai_thread_id: None,
            openai_file_id: None,
            openai_file_uploaded_at: None,
        }
    }

    /// Points the record at a different document, discarding everything bound to the old one.
    pub fn reset_document(&mut self, pdf_path: PathBuf) {
        self.pdf_path = pdf_path;
        self.messages.clear();
        self.cache.apply(CacheEvent::DocumentChanged);
        self.openai_thread_id = None;
        self.openai_file_id = None;
        self.openai_file_uploaded_at = None;
    }

    pub fn has_valid_document(&self) -> bool {
        crate::fs::is_readable_pdf(&self.pdf_path)
    }

    pub fn last_user_query(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// On-disk shape. Optional fields are back-filled when older files omit them.
#[derive(Serialize, Deserialize)]
struct ChatRecordFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    pdf_path: PathBuf,
    messages: Vec<Message>,
    #[serde(default)]
    gemini_cache_name: Option<String>,
    #[serde(default)]
    gemini_cache_model: Option<String>,
    #[serde(default)]
    cache_creation_failed: bool,
    #[serde(default)]
    openai_thread_id: Option<String>,
    #[serde(default)]
    openai_file_id: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    openai_file_uploaded_at: Option<OffsetDateTime>,
}

impl From<ChatRecordFile> for ChatRecord {
    fn from(f: ChatRecordFile) -> Self {
        Self {
            title: f.title,
            pdf_path: f.pdf_path,
            messages: f.messages,
            cache: CacheState::from_fields(
                f.gemini_cache_name,
                f.gemini_cache_model,
                f.cache_creation_failed,
            ),
            openai_thread_id: f.openai_thread_id,
            openai_file_id: f.openai_file_id,
            openai_file_uploaded_at: f.openai_file_uploaded_at,
        }
    }
}

impl From<ChatRecord> for ChatRecordFile {
    fn from(r: ChatRecord) -> Self {
        let (gemini_cache_name, gemini_cache_model, cache_creation_failed) = match r.cache {
            CacheState::NoCache => (None, None, false),
            CacheState::Cached { name, model } => (Some(name), model, false),
            CacheState::Disabled => (None, None, true),
        };
        Self {
            title: r.title,
            pdf_path: r.pdf_path,
            messages: r.messages,
            gemini_cache_name,
            gemini_cache_model,
            cache_creation_failed,
            openai_thread_id: r.openai_thread_id,
            openai_file_id: r.openai_file_id,
            openai_file_uploaded_at: r.openai_file_uploaded_at,
        }
    }
}

// --- Charts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Pie,
    Line,
}

impl ChartKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pie" => ChartKind::Pie,
            "line" => ChartKind::Line,
            _ => ChartKind::Bar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub x_axis: String,
    pub y_axis: String,
    pub points: Vec<ChartPoint>,
}

// --- Exchange results ---

#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub answer: String,
    pub chart: Option<ChartSpec>,
}

impl Exchange {
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            chart: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_failure_is_sticky_until_document_changes() {
        let mut state = CacheState::NoCache;
        state.apply(CacheEvent::CreationFailed);
        assert_eq!(state, CacheState::Disabled);

        state.apply(CacheEvent::Created {
            name: "cachedContents/x".into(),
            model: "models/m".into(),
        });
        assert_eq!(state, CacheState::Disabled);

        state.apply(CacheEvent::Invalidated);
        assert_eq!(state, CacheState::Disabled);

        state.apply(CacheEvent::DocumentChanged);
        assert_eq!(state, CacheState::NoCache);
    }

    #[test]
    fn test_invalidation_clears_cached_handle() {
        let mut state = CacheState::NoCache;
        state.apply(CacheEvent::Created {
            name: "cachedContents/x".into(),
            model: "models/m".into(),
        });
        assert_eq!(state.cache_name(), Some("cachedContents/x"));

        state.apply(CacheEvent::Invalidated);
        assert_eq!(state, CacheState::NoCache);
    }

    #[test]
    fn test_legacy_file_is_backfilled() {
        let json = r#"{"pdf_path": "documents/demo1/doc1.pdf", "messages": [{"role": "user", "content": "hi"}]}"#;
        let record: ChatRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.cache, CacheState::NoCache);
        assert!(record.title.is_none());
        assert!(record.openai_thread_id.is_none());
        assert!(record.openai_file_uploaded_at.is_none());
        assert_eq!(record.messages[0].kind, None);
    }

    #[test]
    fn test_persisted_flags_map_to_cache_state() {
        let json = r#"{"pdf_path": "a.pdf", "messages": [], "gemini_cache_name": "cachedContents/abc", "gemini_cache_model": "models/m", "cache_creation_failed": false}"#;
        let record: ChatRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.cache,
            CacheState::Cached {
                name: "cachedContents/abc".into(),
                model: Some("models/m".into())
            }
        );

        let failed = r#"{"pdf_path": "a.pdf", "messages": [], "gemini_cache_name": "cachedContents/abc", "cache_creation_failed": true}"#;
        let record: ChatRecord = serde_json::from_str(failed).unwrap();
        assert_eq!(record.cache, CacheState::Disabled);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["cache_creation_failed"], true);
        assert!(value["gemini_cache_name"].is_null());
    }

    #[test]
    fn test_chart_message_replays_as_short_text() {
        let spec = ChartSpec {
            title: "Segment P&L".into(),
            kind: ChartKind::Bar,
            x_axis: "item".into(),
            y_axis: "value".into(),
            points: vec![ChartPoint {
                label: "Equity".into(),
                value: 10.0,
            }],
        };
        let msg = Message::chart(&spec).unwrap();
        assert!(msg.is_chart());
        assert_eq!(msg.chart_spec(), Some(spec));
        assert_eq!(msg.conversation_text(), "[Displayed chart: Segment P&L]");
    }
}
