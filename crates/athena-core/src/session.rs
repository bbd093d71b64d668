//! A quiz-taking session for one quiz set.
//!
//! [`QuizSession`] ties the navigator to the backend: it loads questions and
//! the user's saved state, persists every selection and favorite as it
//! happens, and produces the summary on submit.
//!
//! Backend failures inside session operations are logged and swallowed. The
//! operation leaves local state as it was and reports the failure only through
//! its return value.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument, warn};

use crate::comments::{parse_comments, Comment};
use crate::markdown::format_bot_response;
use crate::model::{OptionLabel, Question, QuestionId, QuizSummary};
use crate::navigator::{CursorPolicy, QuestionFilter, QuestionNavigator, Selection};
use crate::normalize::{render_question, RenderedQuestion};
use crate::shuffle::{shuffle_options, unshuffled_label};
use crate::storage::{KeyValueStore, LoadingFlag, MemoryStore};
use crate::traits::{ExplanationRequest, QuizBackend, ScoreUpdate};

/// Everything fetched for one load, not yet applied.
#[derive(Debug, Clone)]
pub struct QuizSnapshot {
    quiz_set_id: String,
    epoch: u64,
    /// `None` when the questions could not be fetched.
    questions: Option<Vec<Question>>,
    selections: HashMap<QuestionId, Option<OptionLabel>>,
    favorites: Vec<QuestionId>,
    answers_visible: Option<bool>,
}

impl QuizSnapshot {
    pub fn quiz_set_id(&self) -> &str {
        &self.quiz_set_id
    }
}

/// Result of [`QuizSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was submitted. Holds `(number, id)` of each unanswered
    /// question, numbered from 1 in quiz-set order.
    Unanswered(Vec<(usize, QuestionId)>),
    Summary(QuizSummary),
}

pub struct QuizSession {
    backend: Arc<dyn QuizBackend>,
    store: Arc<dyn KeyValueStore>,
    quiz_set_id: String,
    navigator: QuestionNavigator,
    options_shuffled: bool,
    /// Per question `order[shown] = canonical` while options are shuffled.
    option_orders: HashMap<QuestionId, Vec<usize>>,
    running_score: u32,
    answers_visible: bool,
    /// Bumped on every quiz-set switch; snapshots from older epochs are stale.
    epoch: u64,
    rng: StdRng,
}

impl QuizSession {
    pub fn new(backend: Arc<dyn QuizBackend>, quiz_set_id: impl Into<String>) -> Self {
        Self {
            backend,
            store: Arc::new(MemoryStore::new()),
            quiz_set_id: quiz_set_id.into(),
            navigator: QuestionNavigator::default(),
            options_shuffled: false,
            option_orders: HashMap::new(),
            running_score: 0,
            answers_visible: true,
            epoch: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use `store` for loading flags instead of an in-memory store.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    /// Shuffle options from the first load on.
    pub fn with_options_shuffled(mut self, on: bool) -> Self {
        self.options_shuffled = on;
        self
    }

    /// Make option shuffles reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn quiz_set_id(&self) -> &str {
        &self.quiz_set_id
    }

    pub fn navigator(&self) -> &QuestionNavigator {
        &self.navigator
    }

    /// Local navigation (filter, cursor) needs no backend call.
    pub fn navigator_mut(&mut self) -> &mut QuestionNavigator {
        &mut self.navigator
    }

    /// Score as tracked by selection deltas since the last load.
    pub fn running_score(&self) -> u32 {
        self.running_score
    }

    pub fn options_shuffled(&self) -> bool {
        self.options_shuffled
    }

    pub fn answers_visible(&self) -> bool {
        self.answers_visible
    }

    pub fn current(&self) -> Option<&Question> {
        self.navigator.current()
    }

    pub fn rendered_current(&self) -> Option<RenderedQuestion> {
        self.current().map(|q| render_question(q, &self.quiz_set_id))
    }

    // -- loading ------------------------------------------------------------

    /// Fetch questions, selections, favorites and answer visibility.
    #[instrument(skip(self), fields(quiz_set = %self.quiz_set_id))]
    pub async fn fetch_snapshot(&self) -> QuizSnapshot {
        let id = self.quiz_set_id.as_str();
        let (questions, selections, favorites, answers_visible) = tokio::join!(
            self.backend.get_questions(id),
            self.backend.get_user_selections(id),
            self.backend.get_favorites(id),
            self.backend.get_eye_icon_state(id),
        );

        QuizSnapshot {
            quiz_set_id: id.to_string(),
            epoch: self.epoch,
            questions: questions
                .map_err(|e| warn!(error = %e, "failed to fetch questions"))
                .ok(),
            selections: selections
                .map_err(|e| warn!(error = %e, "failed to fetch user selections"))
                .unwrap_or_default(),
            favorites: favorites
                .map_err(|e| warn!(error = %e, "failed to fetch favorites"))
                .unwrap_or_default(),
            answers_visible: answers_visible
                .map_err(|e| warn!(error = %e, "failed to fetch answer visibility"))
                .ok(),
        }
    }

    /// Install a snapshot. Returns `false` if it was discarded, either because
    /// the session switched quiz sets after it was taken or because the
    /// questions could not be fetched.
    pub fn apply_snapshot(&mut self, snapshot: QuizSnapshot) -> bool {
        if snapshot.epoch != self.epoch || snapshot.quiz_set_id != self.quiz_set_id {
            debug!(
                stale = %snapshot.quiz_set_id,
                current = %self.quiz_set_id,
                "discarding stale snapshot"
            );
            return false;
        }
        let Some(mut questions) = snapshot.questions else {
            return false;
        };

        for question in &mut questions {
            if let Some(selection) = snapshot.selections.get(&question.id) {
                question.user_selected_option = *selection;
            }
        }
        self.option_orders.clear();
        if self.options_shuffled {
            self.shuffle_all_options(&mut questions);
        }

        self.navigator.replace_questions(questions, CursorPolicy::Reset);
        self.navigator.set_favorites(snapshot.favorites);
        self.running_score = self.navigator.score();
        if let Some(visible) = snapshot.answers_visible {
            self.answers_visible = visible;
        }
        info!(
            quiz_set = %self.quiz_set_id,
            questions = self.navigator.questions().len(),
            "quiz loaded"
        );
        true
    }

    pub async fn load(&mut self) -> bool {
        let snapshot = self.fetch_snapshot().await;
        self.apply_snapshot(snapshot)
    }

    /// Point the session at another quiz set. Snapshots fetched for the
    /// previous set are discarded from now on.
    pub fn switch_to(&mut self, quiz_set_id: impl Into<String>) {
        self.quiz_set_id = quiz_set_id.into();
        self.epoch += 1;
        self.navigator = QuestionNavigator::default();
        self.option_orders.clear();
        self.running_score = 0;
        debug!(quiz_set = %self.quiz_set_id, epoch = self.epoch, "switched quiz set");
    }

    // -- answering ----------------------------------------------------------

    /// Select an option of the current question, or clear the selection with
    /// `None`. Selecting the option that is already selected clears it.
    ///
    /// A score change is reported first, then the new selection is saved
    /// under its label in the canonical option order.
    #[instrument(skip(self))]
    pub async fn select_option(&mut self, option_index: Option<usize>) -> Option<Selection> {
        let question_id = self.current()?.id;
        let result = match option_index {
            Some(index) => self.navigator.click_option(question_id, index),
            None => self.navigator.select_option(question_id, None),
        };
        let selection = match result {
            Ok(selection) => selection,
            Err(e) => {
                warn!(error = %e, "invalid selection");
                return None;
            }
        };

        if selection.score_delta != 0 {
            self.running_score = self.running_score.saturating_add_signed(selection.score_delta);
            let update = ScoreUpdate {
                question_id,
                increment: selection.score_delta > 0,
                quiz_set_id: self.quiz_set_id.clone(),
            };
            if let Err(e) = self.backend.update_score(&update).await {
                warn!(error = %e, "failed to update score");
            }
        }

        let saved = selection
            .current
            .map(|label| self.canonical_label(question_id, label));
        if let Err(e) = self.backend.update_user_selection(question_id, saved).await {
            warn!(error = %e, "failed to save selection");
        }

        Some(selection)
    }

    /// Flip the favorite flag of the current question. Returns the new flag,
    /// or `None` if nothing changed.
    #[instrument(skip(self))]
    pub async fn toggle_favorite(&mut self) -> Option<bool> {
        let question_id = self.current()?.id;
        match self.backend.toggle_favorite(question_id).await {
            Ok(()) => Some(self.navigator.toggle_favorite(question_id)),
            Err(e) => {
                warn!(error = %e, "failed to toggle favorite");
                None
            }
        }
    }

    // -- ordering -----------------------------------------------------------

    /// Have the backend store a new question order. Selections are cleared
    /// and the cursor goes back to the first question.
    #[instrument(skip(self), fields(quiz_set = %self.quiz_set_id))]
    pub async fn shuffle_questions(&mut self) -> bool {
        let mut questions = match self.backend.shuffle_questions(&self.quiz_set_id).await {
            Ok(questions) => questions,
            Err(e) => {
                warn!(error = %e, "failed to shuffle questions");
                return false;
            }
        };

        for question in &mut questions {
            question.user_selected_option = None;
        }
        self.option_orders.clear();
        if self.options_shuffled {
            self.shuffle_all_options(&mut questions);
        }
        self.navigator.replace_questions(questions, CursorPolicy::Reset);
        self.running_score = 0;
        true
    }

    /// Turn local option shuffling on or off. Turning it off refetches the
    /// canonical option order.
    #[instrument(skip(self))]
    pub async fn set_options_shuffled(&mut self, on: bool) -> bool {
        if on {
            let mut questions = self.navigator.questions().to_vec();
            self.shuffle_all_options(&mut questions);
            self.navigator.replace_questions(questions, CursorPolicy::Clamp);
            self.options_shuffled = true;
            return true;
        }

        let id = self.quiz_set_id.as_str();
        let (questions, selections) = tokio::join!(
            self.backend.get_questions(id),
            self.backend.get_user_selections(id),
        );
        let questions = match questions {
            Ok(questions) => questions,
            Err(e) => {
                warn!(error = %e, "failed to refetch questions");
                return false;
            }
        };

        self.options_shuffled = false;
        self.option_orders.clear();
        self.navigator.replace_questions(questions, CursorPolicy::Clamp);
        match selections {
            Ok(selections) => self.navigator.apply_selections(&selections),
            Err(e) => warn!(error = %e, "failed to refetch user selections"),
        }
        true
    }

    /// Shuffle every question's options, composing with any earlier shuffle
    /// so the recorded order still leads back to the canonical one.
    fn shuffle_all_options(&mut self, questions: &mut [Question]) {
        for question in questions {
            let Some(order) = shuffle_options(question, &mut self.rng) else {
                continue;
            };
            let order: Vec<usize> = match self.option_orders.get(&question.id) {
                Some(previous) => order
                    .iter()
                    .map(|&i| previous.get(i).copied().unwrap_or(i))
                    .collect(),
                None => order,
            };
            self.option_orders.insert(question.id, order);
        }
    }

    fn canonical_label(&self, question_id: QuestionId, label: OptionLabel) -> OptionLabel {
        match self.option_orders.get(&question_id) {
            Some(order) => unshuffled_label(order, label),
            None => label,
        }
    }

    /// Clear every selection on the backend and reload.
    #[instrument(skip(self), fields(quiz_set = %self.quiz_set_id))]
    pub async fn reset(&mut self) -> bool {
        if let Err(e) = self.backend.reset_questions(&self.quiz_set_id).await {
            warn!(error = %e, "failed to reset questions");
            return false;
        }
        let reloaded = self.load().await;
        self.navigator.go_to(0);
        reloaded
    }

    // -- submitting ---------------------------------------------------------

    /// Grade the quiz.
    ///
    /// With unanswered questions and `force` off, nothing is submitted and
    /// the unanswered questions are returned instead. Otherwise the score is
    /// recounted from scratch and saved with the pass/fail status.
    #[instrument(skip(self), fields(quiz_set = %self.quiz_set_id))]
    pub async fn submit(&mut self, force: bool) -> SubmitOutcome {
        let unanswered: Vec<(usize, QuestionId)> = self
            .navigator
            .unanswered()
            .into_iter()
            .map(|(number, q)| (number, q.id))
            .collect();
        if !unanswered.is_empty() && !force {
            return SubmitOutcome::Unanswered(unanswered);
        }

        let score = self.navigator.score();
        if score != self.running_score {
            debug!(score, running = self.running_score, "running score drifted");
        }
        self.running_score = score;

        let summary = QuizSummary::new(score, self.navigator.questions().len() as u32);
        let id = self.quiz_set_id.as_str();
        if let Err(e) = self.backend.update_quiz_set_score(id, score).await {
            warn!(error = %e, "failed to save quiz set score");
        }
        if let Err(e) = self.backend.update_quiz_set_status(id, summary.grade).await {
            warn!(error = %e, "failed to save quiz set status");
        }
        info!(%summary, "quiz submitted");
        SubmitOutcome::Summary(summary)
    }

    /// Switch to the incorrect filter, for reviewing after a submit.
    pub fn review_incorrect(&mut self) {
        self.navigator.set_filter(QuestionFilter::Incorrect);
    }

    // -- answer visibility --------------------------------------------------

    /// Show or hide answers, saved per quiz set. Returns the new state, or
    /// `None` if the backend rejected the change.
    pub async fn toggle_answers_visible(&mut self) -> Option<bool> {
        let visible = !self.answers_visible;
        match self
            .backend
            .update_eye_icon_state(&self.quiz_set_id, visible)
            .await
        {
            Ok(()) => {
                self.answers_visible = visible;
                Some(visible)
            }
            Err(e) => {
                warn!(error = %e, "failed to save answer visibility");
                None
            }
        }
    }

    // -- explanations & discussion -----------------------------------------

    /// Further explanation for a question, formatted as HTML.
    ///
    /// A saved explanation is reused unless `regenerate` is set; a newly
    /// generated one is saved for next time.
    #[instrument(skip(self))]
    pub async fn further_explanation(
        &self,
        question_id: QuestionId,
        regenerate: bool,
    ) -> Option<String> {
        let question = self.navigator.question(question_id)?;
        let _loading = LoadingFlag::set(self.store.as_ref(), question_id);

        if !regenerate {
            match self.backend.get_further_explanation(question_id).await {
                Ok(Some(saved)) => return Some(format_bot_response(&saved)),
                Ok(None) => debug!("no saved explanation"),
                Err(e) => warn!(error = %e, "failed to fetch saved explanation"),
            }
        }

        let request = ExplanationRequest::for_question(question);
        let generated = match self.backend.generate_further_explanation(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to generate explanation");
                return None;
            }
        };
        if let Err(e) = self
            .backend
            .save_further_explanation(question_id, &generated)
            .await
        {
            warn!(error = %e, "failed to save explanation");
        }
        Some(format_bot_response(&generated))
    }

    /// Parsed discussion thread of a question; empty when there is none.
    #[instrument(skip(self))]
    pub async fn discussion_comments(&self, question_id: QuestionId) -> Vec<Comment> {
        match self.backend.get_discussion_comments(question_id).await {
            Ok(Some(raw)) => parse_comments(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to fetch discussion comments");
                Vec::new()
            }
        }
    }
}
