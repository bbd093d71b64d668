//! In-memory backend for testing sessions and the dashboard without a server.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use athena_core::error::BackendError;
use athena_core::model::{Grade, OptionLabel, Question, QuestionId};
use athena_core::scrape::ScrapeRequest;
use athena_core::traits::{
    BackendResult, ExplanationRequest, LockScope, QuizBackend, QuizSetDetails, QuizSetRef,
    QuizSetScore, ScoreUpdate, ScrapeResponse,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetQuizSets,
    GetQuizSetDetails(String),
    GetQuizSetScore(String),
    GetLockState(LockScope),
    ToggleLockState(LockScope),
    RenameQuizSet(String, String),
    DeleteQuizSet(String),
    StartScraping(ScrapeRequest),
    DownloadQuizPdf(String),
    GetQuestions(String),
    ShuffleQuestions(String),
    ResetQuestions(String),
    GetUserSelections(String),
    UpdateUserSelection(QuestionId, Option<OptionLabel>),
    UpdateScore(ScoreUpdate),
    GetFavorites(String),
    ToggleFavorite(QuestionId),
    GetEyeIconState(String),
    UpdateEyeIconState(String, bool),
    UpdateQuizSetScore(String, u32),
    UpdateQuizSetStatus(String, Grade),
    GetFurtherExplanation(QuestionId),
    GenerateFurtherExplanation(ExplanationRequest),
    SaveFurtherExplanation(QuestionId, String),
    GetDiscussionComments(QuestionId),
    GetEditorContent,
    SaveEditorContent(String),
}

impl Call {
    /// Method name, as used by [`MockBackend::fail`].
    pub fn method(&self) -> &'static str {
        match self {
            Call::GetQuizSets => "get_quiz_sets",
            Call::GetQuizSetDetails(_) => "get_quiz_set_details",
            Call::GetQuizSetScore(_) => "get_quiz_set_score",
            Call::GetLockState(_) => "get_lock_state",
            Call::ToggleLockState(_) => "toggle_lock_state",
            Call::RenameQuizSet(..) => "rename_quiz_set",
            Call::DeleteQuizSet(_) => "delete_quiz_set",
            Call::StartScraping(_) => "start_scraping",
            Call::DownloadQuizPdf(_) => "download_quiz_pdf",
            Call::GetQuestions(_) => "get_questions",
            Call::ShuffleQuestions(_) => "shuffle_questions",
            Call::ResetQuestions(_) => "reset_questions",
            Call::GetUserSelections(_) => "get_user_selections",
            Call::UpdateUserSelection(..) => "update_user_selection",
            Call::UpdateScore(_) => "update_score",
            Call::GetFavorites(_) => "get_favorites",
            Call::ToggleFavorite(_) => "toggle_favorite",
            Call::GetEyeIconState(_) => "get_eye_icon_state",
            Call::UpdateEyeIconState(..) => "update_eye_icon_state",
            Call::UpdateQuizSetScore(..) => "update_quiz_set_score",
            Call::UpdateQuizSetStatus(..) => "update_quiz_set_status",
            Call::GetFurtherExplanation(_) => "get_further_explanation",
            Call::GenerateFurtherExplanation(_) => "generate_further_explanation",
            Call::SaveFurtherExplanation(..) => "save_further_explanation",
            Call::GetDiscussionComments(_) => "get_discussion_comments",
            Call::GetEditorContent => "get_editor_content",
            Call::SaveEditorContent(_) => "save_editor_content",
        }
    }

    /// Quiz set the call targets, if any.
    fn quiz_set(&self) -> Option<&str> {
        match self {
            Call::GetQuizSetDetails(id)
            | Call::GetQuizSetScore(id)
            | Call::RenameQuizSet(id, _)
            | Call::DeleteQuizSet(id)
            | Call::DownloadQuizPdf(id)
            | Call::GetQuestions(id)
            | Call::ShuffleQuestions(id)
            | Call::ResetQuestions(id)
            | Call::GetUserSelections(id)
            | Call::GetFavorites(id)
            | Call::GetEyeIconState(id)
            | Call::UpdateEyeIconState(id, _)
            | Call::UpdateQuizSetScore(id, _)
            | Call::UpdateQuizSetStatus(id, _) => Some(id),
            Call::GetLockState(LockScope::QuizSet(id))
            | Call::ToggleLockState(LockScope::QuizSet(id)) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    quiz_sets: Vec<QuizSetRef>,
    /// Questions per quiz set, in stored order.
    questions: HashMap<String, Vec<Question>>,
    selections: HashMap<QuestionId, Option<OptionLabel>>,
    favorites: BTreeSet<QuestionId>,
    global_lock: bool,
    locks: HashMap<String, bool>,
    answers_visible: HashMap<String, bool>,
    running_scores: HashMap<String, u32>,
    saved_scores: HashMap<String, u32>,
    statuses: HashMap<String, Grade>,
    explanations: HashMap<QuestionId, String>,
    generated: String,
    comments: HashMap<QuestionId, String>,
    editor_content: Option<String>,
    next_quiz_set: u32,
}

/// A [`QuizBackend`] holding its data in memory.
///
/// Behaves like the real backend for the calls the client makes, records
/// every call, and can be told to fail chosen calls.
pub struct MockBackend {
    state: Mutex<State>,
    calls: Mutex<Vec<Call>>,
    /// Method names, or `method:quiz_set_id`, that fail.
    failures: Mutex<HashSet<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                global_lock: true,
                generated: "Generated explanation.".to_string(),
                ..Default::default()
            }),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
        }
    }

    /// Add a quiz set with its questions in stored order.
    pub fn with_quiz_set(self, id: &str, title: &str, questions: Vec<Question>) -> Self {
        {
            let mut state = self.lock_state();
            state.quiz_sets.push(QuizSetRef {
                id: id.to_string(),
                title: title.to_string(),
            });
            for question in &questions {
                if question.user_selected_option.is_some() {
                    state
                        .selections
                        .insert(question.id, question.user_selected_option);
                }
            }
            let stripped = questions
                .into_iter()
                .map(|mut q| {
                    q.user_selected_option = None;
                    q
                })
                .collect();
            state.questions.insert(id.to_string(), stripped);
            state.locks.insert(id.to_string(), false);
        }
        self
    }

    pub fn with_global_lock(self, locked: bool) -> Self {
        self.lock_state().global_lock = locked;
        self
    }

    pub fn with_favorites(self, ids: &[QuestionId]) -> Self {
        self.lock_state().favorites.extend(ids.iter().copied());
        self
    }

    pub fn with_saved_explanation(self, question_id: QuestionId, text: &str) -> Self {
        self.lock_state()
            .explanations
            .insert(question_id, text.to_string());
        self
    }

    /// Text returned by `generate_further_explanation`.
    pub fn with_generated_explanation(self, text: &str) -> Self {
        self.lock_state().generated = text.to_string();
        self
    }

    pub fn with_comments(self, question_id: QuestionId, raw: &str) -> Self {
        self.lock_state().comments.insert(question_id, raw.to_string());
        self
    }

    pub fn with_editor_content(self, content: &str) -> Self {
        self.lock_state().editor_content = Some(content.to_string());
        self
    }

    /// Make every call to `method` fail with a 500. `method:quiz_set_id`
    /// restricts the failure to one quiz set.
    pub fn fail(&self, key: &str) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string());
    }

    pub fn recover(&self, key: &str) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Calls to `method`, in order.
    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method() == method)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Stored selection of a question.
    pub fn selection(&self, question_id: QuestionId) -> Option<OptionLabel> {
        self.lock_state()
            .selections
            .get(&question_id)
            .copied()
            .flatten()
    }

    /// Score accumulated through `update_score`.
    pub fn running_score(&self, quiz_set_id: &str) -> u32 {
        self.lock_state()
            .running_scores
            .get(quiz_set_id)
            .copied()
            .unwrap_or(0)
    }

    /// Score and status saved on submit.
    pub fn submitted(&self, quiz_set_id: &str) -> Option<(u32, Grade)> {
        let state = self.lock_state();
        let score = state.saved_scores.get(quiz_set_id)?;
        let status = state.statuses.get(quiz_set_id)?;
        Some((*score, *status))
    }

    pub fn saved_explanation(&self, question_id: QuestionId) -> Option<String> {
        self.lock_state().explanations.get(&question_id).cloned()
    }

    pub fn editor_content(&self) -> Option<String> {
        self.lock_state().editor_content.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record `call` and apply any configured failure.
    fn record(&self, call: Call) -> BackendResult<()> {
        let method = call.method();
        let scoped = call.quiz_set().map(|id| format!("{method}:{id}"));
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);

        let failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        if failures.contains(method) || scoped.is_some_and(|k| failures.contains(&k)) {
            return Err(BackendError::Api {
                status: 500,
                message: format!("{method} failed"),
            });
        }
        Ok(())
    }

    fn questions_of(state: &State, quiz_set_id: &str) -> BackendResult<Vec<Question>> {
        state
            .questions
            .get(quiz_set_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound("Quiz set not found".to_string()))
    }

    fn clear_selections(state: &mut State, quiz_set_id: &str) {
        let ids: Vec<QuestionId> = state
            .questions
            .get(quiz_set_id)
            .map(|qs| qs.iter().map(|q| q.id).collect())
            .unwrap_or_default();
        for id in ids {
            state.selections.remove(&id);
        }
        state.running_scores.remove(quiz_set_id);
    }
}

#[async_trait]
impl QuizBackend for MockBackend {
    async fn get_quiz_sets(&self) -> BackendResult<Vec<QuizSetRef>> {
        self.record(Call::GetQuizSets)?;
        Ok(self.lock_state().quiz_sets.clone())
    }

    async fn get_quiz_set_details(&self, quiz_set_id: &str) -> BackendResult<QuizSetDetails> {
        self.record(Call::GetQuizSetDetails(quiz_set_id.to_string()))?;
        let state = self.lock_state();
        let title = state
            .quiz_sets
            .iter()
            .find(|s| s.id == quiz_set_id)
            .map(|s| s.title.clone())
            .ok_or_else(|| BackendError::NotFound("Quiz set not found".to_string()))?;
        let questions = Self::questions_of(&state, quiz_set_id)?;
        let total = questions.len() as u32;
        let answered = questions
            .iter()
            .filter(|q| matches!(state.selections.get(&q.id), Some(Some(_))))
            .count() as u32;
        let progress = if total == 0 {
            0
        } else {
            (answered as f64 / total as f64 * 100.0).round() as u32
        };
        Ok(QuizSetDetails {
            id: quiz_set_id.to_string(),
            title,
            urls: questions.into_iter().map(|q| q.url).collect(),
            progress,
            total_questions: total,
            answered_questions: answered,
        })
    }

    async fn get_quiz_set_score(&self, quiz_set_id: &str) -> BackendResult<QuizSetScore> {
        self.record(Call::GetQuizSetScore(quiz_set_id.to_string()))?;
        let state = self.lock_state();
        let questions = Self::questions_of(&state, quiz_set_id)?;
        let score = questions
            .iter()
            .filter(|q| state.selections.get(&q.id) == Some(&Some(q.answer)))
            .count() as u32;
        Ok(QuizSetScore {
            score,
            total_questions: questions.len() as u32,
        })
    }

    async fn get_lock_state(&self, scope: &LockScope) -> BackendResult<bool> {
        self.record(Call::GetLockState(scope.clone()))?;
        let state = self.lock_state();
        Ok(match scope {
            LockScope::Global => state.global_lock,
            LockScope::QuizSet(id) => state.locks.get(id).copied().unwrap_or(false),
        })
    }

    async fn toggle_lock_state(&self, scope: &LockScope) -> BackendResult<Option<bool>> {
        self.record(Call::ToggleLockState(scope.clone()))?;
        let mut state = self.lock_state();
        Ok(match scope {
            LockScope::Global => {
                state.global_lock = !state.global_lock;
                Some(state.global_lock)
            }
            LockScope::QuizSet(id) => {
                let lock = state.locks.entry(id.clone()).or_insert(false);
                *lock = !*lock;
                None
            }
        })
    }

    async fn rename_quiz_set(&self, quiz_set_id: &str, new_title: &str) -> BackendResult<()> {
        self.record(Call::RenameQuizSet(
            quiz_set_id.to_string(),
            new_title.to_string(),
        ))?;
        let mut state = self.lock_state();
        let set = state
            .quiz_sets
            .iter_mut()
            .find(|s| s.id == quiz_set_id)
            .ok_or_else(|| BackendError::NotFound("Quiz set not found".to_string()))?;
        set.title = new_title.to_string();
        Ok(())
    }

    async fn delete_quiz_set(&self, quiz_set_id: &str) -> BackendResult<()> {
        self.record(Call::DeleteQuizSet(quiz_set_id.to_string()))?;
        let mut state = self.lock_state();
        let before = state.quiz_sets.len();
        state.quiz_sets.retain(|s| s.id != quiz_set_id);
        if state.quiz_sets.len() == before {
            return Err(BackendError::NotFound("Quiz set not found".to_string()));
        }
        state.questions.remove(quiz_set_id);
        state.locks.remove(quiz_set_id);
        Ok(())
    }

    async fn start_scraping(&self, request: &ScrapeRequest) -> BackendResult<ScrapeResponse> {
        self.record(Call::StartScraping(request.clone()))?;
        let mut state = self.lock_state();
        state.next_quiz_set += 1;
        let id = format!("scraped-{}", state.next_quiz_set);
        state.quiz_sets.push(QuizSetRef {
            id: id.clone(),
            title: request.title.clone(),
        });
        state.questions.insert(id.clone(), Vec::new());
        Ok(ScrapeResponse {
            message: "Scraping completed".to_string(),
            quiz_set_id: id,
        })
    }

    async fn download_quiz_pdf(&self, quiz_set_id: &str) -> BackendResult<Vec<u8>> {
        self.record(Call::DownloadQuizPdf(quiz_set_id.to_string()))?;
        let state = self.lock_state();
        Self::questions_of(&state, quiz_set_id)?;
        Ok(format!("%PDF-1.4\n% {quiz_set_id}\n").into_bytes())
    }

    async fn get_questions(&self, quiz_set_id: &str) -> BackendResult<Vec<Question>> {
        self.record(Call::GetQuestions(quiz_set_id.to_string()))?;
        Self::questions_of(&self.lock_state(), quiz_set_id)
    }

    /// Reverses the stored order, which is enough to observe a reorder.
    async fn shuffle_questions(&self, quiz_set_id: &str) -> BackendResult<Vec<Question>> {
        self.record(Call::ShuffleQuestions(quiz_set_id.to_string()))?;
        let mut state = self.lock_state();
        Self::clear_selections(&mut state, quiz_set_id);
        let questions = state
            .questions
            .get_mut(quiz_set_id)
            .ok_or_else(|| BackendError::NotFound("No questions found".to_string()))?;
        questions.reverse();
        for (order, question) in questions.iter_mut().enumerate() {
            question.order_index = order as i64;
        }
        Ok(questions.clone())
    }

    async fn reset_questions(&self, quiz_set_id: &str) -> BackendResult<Vec<Question>> {
        self.record(Call::ResetQuestions(quiz_set_id.to_string()))?;
        let mut state = self.lock_state();
        Self::clear_selections(&mut state, quiz_set_id);
        let mut questions = Self::questions_of(&state, quiz_set_id)?;
        questions.sort_by_key(|q| q.order_index);
        Ok(questions)
    }

    async fn get_user_selections(
        &self,
        quiz_set_id: &str,
    ) -> BackendResult<HashMap<QuestionId, Option<OptionLabel>>> {
        self.record(Call::GetUserSelections(quiz_set_id.to_string()))?;
        let state = self.lock_state();
        let questions = Self::questions_of(&state, quiz_set_id)?;
        Ok(questions
            .iter()
            .map(|q| (q.id, state.selections.get(&q.id).copied().flatten()))
            .collect())
    }

    async fn update_user_selection(
        &self,
        question_id: QuestionId,
        selected_option: Option<OptionLabel>,
    ) -> BackendResult<()> {
        self.record(Call::UpdateUserSelection(question_id, selected_option))?;
        self.lock_state()
            .selections
            .insert(question_id, selected_option);
        Ok(())
    }

    async fn update_score(&self, update: &ScoreUpdate) -> BackendResult<()> {
        self.record(Call::UpdateScore(update.clone()))?;
        let mut state = self.lock_state();
        let score = state
            .running_scores
            .entry(update.quiz_set_id.clone())
            .or_insert(0);
        *score = if update.increment {
            *score + 1
        } else {
            score.saturating_sub(1)
        };
        Ok(())
    }

    async fn get_favorites(&self, quiz_set_id: &str) -> BackendResult<Vec<QuestionId>> {
        self.record(Call::GetFavorites(quiz_set_id.to_string()))?;
        let state = self.lock_state();
        let questions = Self::questions_of(&state, quiz_set_id)?;
        Ok(questions
            .iter()
            .map(|q| q.id)
            .filter(|id| state.favorites.contains(id))
            .collect())
    }

    async fn toggle_favorite(&self, question_id: QuestionId) -> BackendResult<()> {
        self.record(Call::ToggleFavorite(question_id))?;
        let mut state = self.lock_state();
        if !state.favorites.remove(&question_id) {
            state.favorites.insert(question_id);
        }
        Ok(())
    }

    async fn get_eye_icon_state(&self, quiz_set_id: &str) -> BackendResult<bool> {
        self.record(Call::GetEyeIconState(quiz_set_id.to_string()))?;
        Ok(self
            .lock_state()
            .answers_visible
            .get(quiz_set_id)
            .copied()
            .unwrap_or(true))
    }

    async fn update_eye_icon_state(&self, quiz_set_id: &str, state: bool) -> BackendResult<()> {
        self.record(Call::UpdateEyeIconState(quiz_set_id.to_string(), state))?;
        self.lock_state()
            .answers_visible
            .insert(quiz_set_id.to_string(), state);
        Ok(())
    }

    async fn update_quiz_set_score(&self, quiz_set_id: &str, score: u32) -> BackendResult<()> {
        self.record(Call::UpdateQuizSetScore(quiz_set_id.to_string(), score))?;
        self.lock_state()
            .saved_scores
            .insert(quiz_set_id.to_string(), score);
        Ok(())
    }

    async fn update_quiz_set_status(&self, quiz_set_id: &str, status: Grade) -> BackendResult<()> {
        self.record(Call::UpdateQuizSetStatus(quiz_set_id.to_string(), status))?;
        self.lock_state()
            .statuses
            .insert(quiz_set_id.to_string(), status);
        Ok(())
    }

    async fn get_further_explanation(
        &self,
        question_id: QuestionId,
    ) -> BackendResult<Option<String>> {
        self.record(Call::GetFurtherExplanation(question_id))?;
        Ok(self.lock_state().explanations.get(&question_id).cloned())
    }

    async fn generate_further_explanation(
        &self,
        request: &ExplanationRequest,
    ) -> BackendResult<String> {
        self.record(Call::GenerateFurtherExplanation(request.clone()))?;
        Ok(self.lock_state().generated.clone())
    }

    async fn save_further_explanation(
        &self,
        question_id: QuestionId,
        explanation: &str,
    ) -> BackendResult<()> {
        self.record(Call::SaveFurtherExplanation(
            question_id,
            explanation.to_string(),
        ))?;
        self.lock_state()
            .explanations
            .insert(question_id, explanation.to_string());
        Ok(())
    }

    async fn get_discussion_comments(
        &self,
        question_id: QuestionId,
    ) -> BackendResult<Option<String>> {
        self.record(Call::GetDiscussionComments(question_id))?;
        Ok(self.lock_state().comments.get(&question_id).cloned())
    }

    async fn get_editor_content(&self) -> BackendResult<Option<String>> {
        self.record(Call::GetEditorContent)?;
        Ok(self.lock_state().editor_content.clone())
    }

    async fn save_editor_content(&self, content: &str) -> BackendResult<()> {
        self.record(Call::SaveEditorContent(content.to_string()))?;
        self.lock_state().editor_content = Some(content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: QuestionId, answer: usize) -> Question {
        Question {
            id,
            order_index: id,
            text: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            answer: OptionLabel::from_index(answer).unwrap(),
            url: Some(format!("https://bank.example/q/{id}")),
            explanation: String::new(),
            discussion_link: None,
            user_selected_option: None,
            has_math_content: false,
        }
    }

    #[tokio::test]
    async fn selections_drive_score_and_progress() {
        let mock = MockBackend::new().with_quiz_set(
            "s1",
            "Set",
            vec![question(1, 0), question(2, 1)],
        );
        mock.update_user_selection(1, OptionLabel::from_index(0))
            .await
            .unwrap();

        let score = mock.get_quiz_set_score("s1").await.unwrap();
        assert_eq!((score.score, score.total_questions), (1, 2));
        let details = mock.get_quiz_set_details("s1").await.unwrap();
        assert_eq!(details.progress, 50);
        assert_eq!(details.answered_questions, 1);
    }

    #[tokio::test]
    async fn shuffle_reverses_and_clears() {
        let mock = MockBackend::new().with_quiz_set(
            "s1",
            "Set",
            vec![question(1, 0), question(2, 1), question(3, 2)],
        );
        mock.update_user_selection(2, OptionLabel::from_index(1))
            .await
            .unwrap();

        let shuffled = mock.shuffle_questions("s1").await.unwrap();
        let ids: Vec<_> = shuffled.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(mock.selection(2), None);
    }

    #[tokio::test]
    async fn injected_failures_are_scoped() {
        let mock = MockBackend::new()
            .with_quiz_set("a", "A", vec![question(1, 0)])
            .with_quiz_set("b", "B", vec![question(2, 0)]);
        mock.fail("get_quiz_set_details:b");

        assert!(mock.get_quiz_set_details("a").await.is_ok());
        assert!(matches!(
            mock.get_quiz_set_details("b").await,
            Err(BackendError::Api { status: 500, .. })
        ));
        assert_eq!(mock.calls_to("get_quiz_set_details").len(), 2);

        mock.recover("get_quiz_set_details:b");
        assert!(mock.get_quiz_set_details("b").await.is_ok());
    }

    #[tokio::test]
    async fn lock_toggles() {
        let mock = MockBackend::new().with_quiz_set("s1", "Set", vec![]);
        assert_eq!(
            mock.toggle_lock_state(&LockScope::Global).await.unwrap(),
            Some(false)
        );
        let scope = LockScope::QuizSet("s1".into());
        assert_eq!(mock.toggle_lock_state(&scope).await.unwrap(), None);
        assert!(mock.get_lock_state(&scope).await.unwrap());
    }
}
