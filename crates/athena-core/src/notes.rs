//! Study notes editor.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::storage::{KeyValueStore, EDITOR_CONTENT_KEY};
use crate::traits::QuizBackend;

/// Free-form notes, kept locally and mirrored to the backend.
pub struct NotesEditor {
    store: Arc<dyn KeyValueStore>,
    content: String,
}

impl NotesEditor {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            content: String::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Load the notes. Locally stored content wins; otherwise the backend copy
    /// is fetched. A backend failure leaves the notes empty.
    pub async fn load(&mut self, backend: &dyn QuizBackend) -> anyhow::Result<&str> {
        if let Some(local) = self.store.get(EDITOR_CONTENT_KEY)? {
            debug!("notes loaded from local store");
            self.content = local;
            return Ok(&self.content);
        }

        match backend.get_editor_content().await {
            Ok(Some(content)) => self.content = content,
            Ok(None) => self.content.clear(),
            Err(e) => warn!(error = %e, "failed to fetch notes"),
        }
        Ok(&self.content)
    }

    /// Save locally, then post to the backend. Returns whether the backend
    /// accepted the save.
    pub async fn save(&mut self, content: &str, backend: &dyn QuizBackend) -> anyhow::Result<bool> {
        self.store.set(EDITOR_CONTENT_KEY, content)?;
        self.content = content.to_string();

        match backend.save_editor_content(content).await {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "failed to save notes to backend");
                Ok(false)
            }
        }
    }
}
