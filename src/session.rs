use crate::chatstore::store::ChatStore;
use crate::config::AppConfig;
use crate::exceptions::ChatError;
use crate::llm::Backend;
use crate::llm::gemini::client::GeminiClient;
use crate::models::{ChatRecord, Exchange, Message};
use crate::profiles::Profile;
use crate::tools::ToolRegistry;
use std::collections::BTreeMap;

/// One profile's chats, loaded from disk, plus the currently selected chat.
#[derive(Debug)]
pub struct AppState {
    pub profile: Profile,
    store: ChatStore,
    chats: BTreeMap<String, ChatRecord>,
    active: Option<String>,
}

impl AppState {
    pub fn open(config: &AppConfig, profile_id: &str) -> Result<Self, ChatError> {
        let profile = config.profiles.get(profile_id)?.clone();
        Self::with_store(profile, ChatStore::new(config.chats_dir.clone()))
    }

    /// Loads the profile's records and brings predefined chats in line with the
    /// profile table before selecting the first selectable chat.
    pub fn with_store(profile: Profile, store: ChatStore) -> Result<Self, ChatError> {
        let chats = store.load(&profile.id)?;
        let mut state = Self {
            profile,
            store,
            chats,
            active: None,
        };
        state.sync_predefined()?;
        state.active = state.selectable_titles().into_iter().next();
        Ok(state)
    }

    fn sync_predefined(&mut self) -> Result<(), ChatError> {
        for chat in &self.profile.chats {
            if !crate::fs::is_readable_pdf(&chat.document) {
                tracing::debug!(
                    "Skipping '{}': {} is not a readable PDF",
                    chat.title,
                    chat.document.display()
                );
                continue;
            }

            match self.chats.get_mut(&chat.title) {
                None => {
                    let record = ChatRecord::new(&chat.title, chat.document.clone());
                    self.store.save(&self.profile.id, &chat.title, &record)?;
                    self.chats.insert(chat.title.clone(), record);
                }
                Some(record) if record.pdf_path != chat.document => {
                    tracing::info!(
                        "Document for '{}' changed to {}; resetting chat",
                        chat.title,
                        chat.document.display()
                    );
                    record.reset_document(chat.document.clone());
                    self.store.save(&self.profile.id, &chat.title, record)?;
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Predefined chats in profile order, then other chats by title. Chats whose
    /// document is missing are never listed.
    pub fn selectable_titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self
            .profile
            .chats
            .iter()
            .filter(|c| {
                self.chats
                    .get(&c.title)
                    .is_some_and(ChatRecord::has_valid_document)
            })
            .map(|c| c.title.clone())
            .collect();

        titles.extend(
            self.chats
                .iter()
                .filter(|(title, record)| {
                    !self.profile.is_predefined(title) && record.has_valid_document()
                })
                .map(|(title, _)| title.clone()),
        );
        titles
    }

    pub fn active_title(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_chat(&self) -> Option<&ChatRecord> {
        self.active.as_ref().and_then(|t| self.chats.get(t))
    }

    pub fn record(&self, title: &str) -> Option<&ChatRecord> {
        self.chats.get(title)
    }

    pub fn questions(&self) -> &[String] {
        &self.profile.questions
    }

    /// Selects by exact title, or by index into `selectable_titles()`
    /// (negative indices count from the end).
    pub fn select_chat(&mut self, selector: &str) -> Result<&str, ChatError> {
        let titles = self.selectable_titles();

        let chosen = if let Some(title) = titles.iter().find(|t| t.as_str() == selector) {
            title.clone()
        } else if let Ok(index) = selector.trim().parse::<isize>() {
            let len = titles.len() as isize;
            let resolved = if index < 0 { len + index } else { index };
            if resolved < 0 || resolved >= len {
                return Err(ChatError::InvalidInput(format!(
                    "Chat index {} is out of range (valid: 0 to {}, or -1 to -{}).",
                    index,
                    (len - 1).max(0),
                    len.max(1)
                )));
            }
            titles[resolved as usize].clone()
        } else {
            return Err(ChatError::NotFound(format!(
                "Chat '{}' not found. Available chats: {}",
                selector,
                titles.join(", ")
            )));
        };

        self.active = Some(chosen);
        Ok(self.active.as_deref().unwrap_or_default())
    }

    /// Deletes the active chat and its file, then selects the first remaining chat.
    /// The remote prompt cache is removed when a Gemini client is available.
    pub async fn clear_active_chat(
        &mut self,
        gemini: Option<&GeminiClient>,
    ) -> Result<String, ChatError> {
        let title = self
            .active
            .clone()
            .ok_or_else(|| ChatError::InvalidInput("No chat is selected.".into()))?;

        if let Some(record) = self.chats.remove(&title)
            && let Some(cache_name) = record.cache.cache_name()
        {
            match gemini {
                Some(client) => {
                    if let Err(e) = client.delete_cache(cache_name).await {
                        tracing::warn!("Could not delete Gemini cache {}: {}", cache_name, e);
                    }
                }
                None => tracing::warn!(
                    "GEMINI_API_KEY is not set; leaving cache {} to expire",
                    cache_name
                ),
            }
        }

        self.store.remove(&self.profile.id, &title)?;
        self.active = self.selectable_titles().into_iter().next();
        Ok(title)
    }

    /// Adds the query to the active chat, asks the model, records the answer
    /// (and any chart) and persists the chat.
    pub async fn ask(
        &mut self,
        backend: &Backend,
        tools: &ToolRegistry,
        query: &str,
    ) -> Result<Exchange, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::InvalidInput("Question must not be empty.".into()));
        }
        let title = self
            .active
            .clone()
            .ok_or_else(|| ChatError::InvalidInput("No chat is selected.".into()))?;
        let record = self
            .chats
            .get_mut(&title)
            .ok_or_else(|| ChatError::NotFound(format!("Chat '{}' not found.", title)))?;

        record.messages.push(Message::user(query));
        let exchange = backend.generate_answer(record, tools).await;

        record.messages.push(Message::assistant(exchange.answer.clone()));
        if let Some(chart) = &exchange.chart {
            record.messages.push(Message::chart(chart)?);
        }

        self.store.save(&self.profile.id, &title, record)?;
        Ok(exchange)
    }
}
