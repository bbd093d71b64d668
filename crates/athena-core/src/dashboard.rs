//! Dashboard of quiz sets.
//!
//! Aggregates the per-set details, score and lock state the backend serves
//! separately, and keeps the checkbox selection in the local store.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::error::ValidationError;
use crate::layout::Layout;
use crate::lock::LockState;
use crate::model::{Grade, QuizSet};
use crate::storage::{load_json, save_json, KeyValueStore, CHECKED_ITEMS_KEY};
use crate::traits::{BackendResult, LockScope, QuizBackend, QuizSetRef};
use crate::urls::{compact_urls, UrlRange};

/// Grade column text for one quiz set.
pub fn grade_cell(set: &QuizSet, layout: Layout, globally_locked: bool) -> String {
    if globally_locked {
        return "Pending".to_string();
    }
    let grade = set.grade();
    match layout {
        Layout::Narrow => format!("{grade} ({}%)", set.percentage()),
        Layout::Wide => {
            let arrow = match grade {
                Grade::Passed => '▲',
                Grade::Failed => '▼',
            };
            format!(
                "{grade} {}/{} {arrow}{}%",
                set.score,
                set.total_questions,
                set.percentage()
            )
        }
    }
}

/// Checkbox state of the header checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAll {
    None,
    Some,
    All,
}

pub struct Dashboard {
    backend: Arc<dyn QuizBackend>,
    store: Arc<dyn KeyValueStore>,
    lock: LockState,
    quiz_sets: Vec<QuizSet>,
    checked: BTreeMap<String, bool>,
}

impl Dashboard {
    pub fn new(
        backend: Arc<dyn QuizBackend>,
        store: Arc<dyn KeyValueStore>,
        lock: LockState,
    ) -> Self {
        Self {
            backend,
            store,
            lock,
            quiz_sets: Vec::new(),
            checked: BTreeMap::new(),
        }
    }

    pub fn quiz_sets(&self) -> &[QuizSet] {
        &self.quiz_sets
    }

    pub fn quiz_set(&self, id: &str) -> Option<&QuizSet> {
        self.quiz_sets.iter().find(|s| s.id == id)
    }

    pub fn lock(&self) -> &LockState {
        &self.lock
    }

    /// Fetch every quiz set with its details, score and lock state.
    ///
    /// Sets whose details cannot be fetched are left out. A failure to list
    /// the sets leaves the dashboard empty.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> &[QuizSet] {
        if let Err(e) = self.lock.refresh(self.backend.as_ref()).await {
            warn!(error = %e, "failed to fetch global lock state");
        }

        self.checked = match load_json(self.store.as_ref(), CHECKED_ITEMS_KEY) {
            Ok(checked) => checked.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "failed to read checkbox state");
                BTreeMap::new()
            }
        };

        let refs = match self.backend.get_quiz_sets().await {
            Ok(refs) => refs,
            Err(e) => {
                warn!(error = %e, "failed to fetch quiz sets");
                self.quiz_sets.clear();
                return &self.quiz_sets;
            }
        };

        let backend = self.backend.as_ref();
        let loaded = join_all(refs.into_iter().map(|r| async move {
            let id = r.id.clone();
            (id, fetch_quiz_set(backend, r).await)
        }))
        .await;

        self.quiz_sets = loaded
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(set) => Some(set),
                Err(e) => {
                    warn!(quiz_set = %id, error = %e, "skipping quiz set");
                    None
                }
            })
            .collect();

        info!(count = self.quiz_sets.len(), "dashboard loaded");
        &self.quiz_sets
    }

    /// Rename a quiz set. Returns whether the backend accepted it.
    #[instrument(skip(self))]
    pub async fn rename(&mut self, id: &str, new_title: &str) -> Result<bool, ValidationError> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        match self.backend.rename_quiz_set(id, new_title).await {
            Ok(()) => {
                if let Some(set) = self.quiz_sets.iter_mut().find(|s| s.id == id) {
                    set.title = new_title.to_string();
                }
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "failed to rename quiz set");
                Ok(false)
            }
        }
    }

    /// Delete a quiz set. Returns whether the backend accepted it.
    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: &str) -> bool {
        match self.backend.delete_quiz_set(id).await {
            Ok(()) => {
                self.quiz_sets.retain(|s| s.id != id);
                if self.checked.remove(id).is_some() {
                    self.persist_checked();
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to delete quiz set");
                false
            }
        }
    }

    /// Flip one quiz set's lock. Returns the new state, or `None` on failure.
    #[instrument(skip(self))]
    pub async fn toggle_lock(&mut self, id: &str) -> Option<bool> {
        let scope = LockScope::QuizSet(id.to_string());
        if let Err(e) = self.backend.toggle_lock_state(&scope).await {
            warn!(error = %e, "failed to toggle quiz set lock");
            return None;
        }
        let set = self.quiz_sets.iter_mut().find(|s| s.id == id);
        match set {
            Some(set) => {
                set.lock_state = !set.lock_state;
                Some(set.lock_state)
            }
            None => match self.backend.get_lock_state(&scope).await {
                Ok(state) => Some(state),
                Err(e) => {
                    warn!(error = %e, "failed to read quiz set lock");
                    None
                }
            },
        }
    }

    /// Flip the global lock. Returns the refreshed state, or `None` on
    /// failure.
    pub async fn toggle_global_lock(&self) -> Option<bool> {
        match self.lock.toggle(self.backend.as_ref()).await {
            Ok(locked) => Some(locked),
            Err(e) => {
                warn!(error = %e, "failed to toggle global lock");
                None
            }
        }
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.checked.get(id).copied().unwrap_or(false)
    }

    pub fn set_checked(&mut self, id: &str, checked: bool) {
        self.checked.insert(id.to_string(), checked);
        self.persist_checked();
    }

    /// Check or uncheck every loaded quiz set.
    pub fn set_all_checked(&mut self, checked: bool) {
        self.checked = self
            .quiz_sets
            .iter()
            .map(|s| (s.id.clone(), checked))
            .collect();
        self.persist_checked();
    }

    pub fn select_all_state(&self) -> SelectAll {
        let checked = self.quiz_sets.iter().filter(|s| self.is_checked(&s.id)).count();
        if checked == 0 {
            SelectAll::None
        } else if checked == self.quiz_sets.len() {
            SelectAll::All
        } else {
            SelectAll::Some
        }
    }

    /// Source URLs of a quiz set, compacted into ranges.
    pub fn url_ranges(&self, id: &str) -> Vec<UrlRange> {
        self.quiz_set(id)
            .map(|s| compact_urls(&s.urls))
            .unwrap_or_default()
    }

    /// The printable PDF of a quiz set, or `None` on failure.
    #[instrument(skip(self))]
    pub async fn download_pdf(&self, id: &str) -> Option<Vec<u8>> {
        match self.backend.download_quiz_pdf(id).await {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "pdf downloaded");
                Some(bytes)
            }
            Err(e) => {
                warn!(error = %e, "failed to download quiz pdf");
                None
            }
        }
    }

    fn persist_checked(&self) {
        if let Err(e) = save_json(self.store.as_ref(), CHECKED_ITEMS_KEY, &self.checked) {
            warn!(error = %e, "failed to persist checkbox state");
        }
    }
}

async fn fetch_quiz_set(backend: &dyn QuizBackend, quiz_set: QuizSetRef) -> BackendResult<QuizSet> {
    let scope = LockScope::QuizSet(quiz_set.id.clone());
    let (details, score, lock_state) = tokio::try_join!(
        backend.get_quiz_set_details(&quiz_set.id),
        backend.get_quiz_set_score(&quiz_set.id),
        backend.get_lock_state(&scope),
    )?;

    Ok(QuizSet {
        id: quiz_set.id,
        title: quiz_set.title,
        urls: details.urls.into_iter().flatten().collect(),
        progress: details.progress,
        score: score.score,
        total_questions: score.total_questions,
        lock_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(score: u32, total: u32) -> QuizSet {
        QuizSet {
            id: "s".into(),
            title: "S".into(),
            urls: vec![],
            progress: 100,
            score,
            total_questions: total,
            lock_state: false,
        }
    }

    #[test]
    fn grade_cell_per_layout() {
        assert_eq!(grade_cell(&set(7, 10), Layout::Wide, true), "Pending");
        assert_eq!(grade_cell(&set(7, 10), Layout::Narrow, false), "Passed (70%)");
        assert_eq!(grade_cell(&set(1, 3), Layout::Wide, false), "Failed 1/3 ▼33%");
        assert_eq!(grade_cell(&set(3, 3), Layout::Wide, false), "Passed 3/3 ▲100%");
    }
}
