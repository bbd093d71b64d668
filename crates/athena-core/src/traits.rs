//! The backend seam.
//!
//! [`QuizBackend`] is implemented over HTTP by `athena-client` and by an
//! in-memory mock for tests. Everything above it (session, dashboard, notes)
//! is written against the trait only.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::model::{Grade, OptionLabel, Question, QuestionId};
use crate::scrape::ScrapeRequest;

pub type BackendResult<T> = Result<T, BackendError>;

// ---------------------------------------------------------------------------
// QuizBackend trait
// ---------------------------------------------------------------------------

/// Every call the athena client makes to its backend.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    // -- dashboard ----------------------------------------------------------

    async fn get_quiz_sets(&self) -> BackendResult<Vec<QuizSetRef>>;

    async fn get_quiz_set_details(&self, quiz_set_id: &str) -> BackendResult<QuizSetDetails>;

    async fn get_quiz_set_score(&self, quiz_set_id: &str) -> BackendResult<QuizSetScore>;

    async fn get_lock_state(&self, scope: &LockScope) -> BackendResult<bool>;

    /// Flip a lock. The global toggle reports the new state; per-set toggles
    /// report nothing.
    async fn toggle_lock_state(&self, scope: &LockScope) -> BackendResult<Option<bool>>;

    async fn rename_quiz_set(&self, quiz_set_id: &str, new_title: &str) -> BackendResult<()>;

    async fn delete_quiz_set(&self, quiz_set_id: &str) -> BackendResult<()>;

    async fn start_scraping(&self, request: &ScrapeRequest) -> BackendResult<ScrapeResponse>;

    async fn download_quiz_pdf(&self, quiz_set_id: &str) -> BackendResult<Vec<u8>>;

    // -- quiz ---------------------------------------------------------------

    /// Questions in stored order, without user selections.
    async fn get_questions(&self, quiz_set_id: &str) -> BackendResult<Vec<Question>>;

    /// Store a new random question order, clear all selections, and return
    /// the questions in that order.
    async fn shuffle_questions(&self, quiz_set_id: &str) -> BackendResult<Vec<Question>>;

    /// Clear all selections and return the questions in stored order.
    async fn reset_questions(&self, quiz_set_id: &str) -> BackendResult<Vec<Question>>;

    async fn get_user_selections(
        &self,
        quiz_set_id: &str,
    ) -> BackendResult<HashMap<QuestionId, Option<OptionLabel>>>;

    async fn update_user_selection(
        &self,
        question_id: QuestionId,
        selected_option: Option<OptionLabel>,
    ) -> BackendResult<()>;

    async fn update_score(&self, update: &ScoreUpdate) -> BackendResult<()>;

    /// Ids of the favorite questions of a quiz set.
    async fn get_favorites(&self, quiz_set_id: &str) -> BackendResult<Vec<QuestionId>>;

    async fn toggle_favorite(&self, question_id: QuestionId) -> BackendResult<()>;

    async fn get_eye_icon_state(&self, quiz_set_id: &str) -> BackendResult<bool>;

    async fn update_eye_icon_state(&self, quiz_set_id: &str, state: bool) -> BackendResult<()>;

    async fn update_quiz_set_score(&self, quiz_set_id: &str, score: u32) -> BackendResult<()>;

    async fn update_quiz_set_status(&self, quiz_set_id: &str, status: Grade) -> BackendResult<()>;

    // -- explanations & discussion -----------------------------------------

    /// Previously saved further explanation, if any.
    async fn get_further_explanation(&self, question_id: QuestionId)
        -> BackendResult<Option<String>>;

    /// Ask the explanation service for a new further explanation.
    async fn generate_further_explanation(
        &self,
        request: &ExplanationRequest,
    ) -> BackendResult<String>;

    async fn save_further_explanation(
        &self,
        question_id: QuestionId,
        explanation: &str,
    ) -> BackendResult<()>;

    /// Raw discussion dump, or `None` when the question has no discussion.
    async fn get_discussion_comments(&self, question_id: QuestionId)
        -> BackendResult<Option<String>>;

    // -- notes --------------------------------------------------------------

    async fn get_editor_content(&self) -> BackendResult<Option<String>>;

    async fn save_editor_content(&self, content: &str) -> BackendResult<()>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A quiz set as listed by `getQuizSets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSetRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSetDetails {
    pub id: String,
    pub title: String,
    /// One entry per question; questions without a source URL give `null`.
    #[serde(default)]
    pub urls: Vec<Option<String>>,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub answered_questions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSetScore {
    pub score: u32,
    pub total_questions: u32,
}

/// What a lock call applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockScope {
    /// Grade visibility across the whole dashboard.
    Global,
    QuizSet(String),
}

impl LockScope {
    /// Path segment used by the lock endpoints.
    pub fn path_segment(&self) -> &str {
        match self {
            LockScope::Global => "global",
            LockScope::QuizSet(id) => id,
        }
    }
}

impl fmt::Display for LockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockScope::Global => write!(f, "global"),
            LockScope::QuizSet(id) => write!(f, "quiz set {id}"),
        }
    }
}

/// Body of `updateScore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub question_id: QuestionId,
    /// `true` adds one to the running score, `false` takes one away.
    pub increment: bool,
    pub quiz_set_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    #[serde(default)]
    pub message: String,
    pub quiz_set_id: String,
}

/// Body of the further-explanation generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationRequest {
    pub question_text: String,
    pub options: Vec<String>,
    /// Label of the correct option, e.g. `Option B`.
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl ExplanationRequest {
    pub fn for_question(question: &Question) -> Self {
        Self {
            question_text: question.text.clone(),
            options: question.options.clone(),
            answer: question.answer.to_string(),
            explanation: question.explanation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_scope_paths() {
        assert_eq!(LockScope::Global.path_segment(), "global");
        assert_eq!(LockScope::QuizSet("abc".into()).path_segment(), "abc");
        assert_eq!(LockScope::QuizSet("abc".into()).to_string(), "quiz set abc");
    }

    #[test]
    fn quiz_set_details_tolerates_missing_urls() {
        let details: QuizSetDetails = serde_json::from_value(serde_json::json!({
            "id": "s1",
            "title": "Circuits",
            "urls": ["https://a/1", null],
            "progress": 50,
            "total_questions": 2,
            "answered_questions": 1
        }))
        .unwrap();
        assert_eq!(details.urls, vec![Some("https://a/1".to_string()), None]);
    }

    #[test]
    fn selections_map_has_string_keys_on_the_wire() {
        let selections: HashMap<QuestionId, Option<OptionLabel>> =
            serde_json::from_str(r#"{"3": "Option B", "4": null}"#).unwrap();
        assert_eq!(selections[&3].map(|l| l.index()), Some(1));
        assert_eq!(selections[&4], None);
    }

    #[test]
    fn explanation_request_from_question() {
        let question: Question = serde_json::from_value(serde_json::json!({
            "id": 1,
            "text": "2+2?",
            "options": ["3", "4"],
            "answer": "Option B",
            "explanation": "Basic arithmetic."
        }))
        .unwrap();
        let request = ExplanationRequest::for_question(&question);
        assert_eq!(request.answer, "Option B");
        assert_eq!(request.options, vec!["3", "4"]);
    }
}
