//! Question navigation and filtering.
//!
//! [`QuestionNavigator`] owns the full question list of a quiz set, the
//! favorites, and the active filter. The active view is recomputed from those
//! three on every change, and a cursor points into it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NavigatorError;
use crate::model::{OptionLabel, Question, QuestionId};

/// Which questions the active view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionFilter {
    #[default]
    All,
    Favorites,
    Answered,
    Unanswered,
    /// Every question whose selection is not the answer. Unanswered questions
    /// are included.
    Incorrect,
}

impl QuestionFilter {
    pub const ALL: [QuestionFilter; 5] = [
        QuestionFilter::All,
        QuestionFilter::Favorites,
        QuestionFilter::Answered,
        QuestionFilter::Unanswered,
        QuestionFilter::Incorrect,
    ];

    fn matches(self, question: &Question, favorites: &HashSet<QuestionId>) -> bool {
        match self {
            QuestionFilter::All => true,
            QuestionFilter::Favorites => favorites.contains(&question.id),
            QuestionFilter::Answered => question.user_selected_option.is_some(),
            QuestionFilter::Unanswered => question.user_selected_option.is_none(),
            QuestionFilter::Incorrect => question.user_selected_option != Some(question.answer),
        }
    }
}

impl fmt::Display for QuestionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionFilter::All => "all",
            QuestionFilter::Favorites => "favorites",
            QuestionFilter::Answered => "answered",
            QuestionFilter::Unanswered => "unanswered",
            QuestionFilter::Incorrect => "incorrect",
        };
        f.write_str(name)
    }
}

impl FromStr for QuestionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionFilter::ALL
            .into_iter()
            .find(|filter| filter.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown filter '{s}' (expected all, favorites, answered, unanswered \
                     or incorrect)"
                )
            })
    }
}

/// The outcome of changing a question's selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub question_id: QuestionId,
    pub previous: Option<OptionLabel>,
    pub current: Option<OptionLabel>,
    /// `correct(current) - correct(previous)`: -1, 0 or +1.
    pub score_delta: i32,
}

impl Selection {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// What happens to the cursor when the question list is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPolicy {
    /// Back to the first question.
    Reset,
    /// Keep the position, clamped to the new view.
    Clamp,
}

#[derive(Debug, Clone, Default)]
pub struct QuestionNavigator {
    questions: Vec<Question>,
    favorites: HashSet<QuestionId>,
    filter: QuestionFilter,
    /// Positions in `questions` making up the active view.
    view: Vec<usize>,
    cursor: usize,
}

impl QuestionNavigator {
    pub fn new(questions: Vec<Question>) -> Self {
        let mut navigator = Self {
            questions,
            ..Self::default()
        };
        navigator.recompute();
        navigator
    }

    pub fn with_favorites(mut self, favorites: impl IntoIterator<Item = QuestionId>) -> Self {
        self.favorites = favorites.into_iter().collect();
        self.recompute();
        self
    }

    /// All questions, in quiz-set order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn favorites(&self) -> &HashSet<QuestionId> {
        &self.favorites
    }

    pub fn is_favorite(&self, id: QuestionId) -> bool {
        self.favorites.contains(&id)
    }

    pub fn filter(&self) -> QuestionFilter {
        self.filter
    }

    /// Questions in the active view.
    pub fn view(&self) -> impl Iterator<Item = &Question> + '_ {
        self.view.iter().map(|&i| &self.questions[i])
    }

    pub fn view_ids(&self) -> Vec<QuestionId> {
        self.view().map(|q| q.id).collect()
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Index of the current question within the active view.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Question> {
        self.view.get(self.cursor).map(|&i| &self.questions[i])
    }

    /// Switch the active filter. The cursor goes back to the first question.
    pub fn set_filter(&mut self, filter: QuestionFilter) {
        self.filter = filter;
        self.recompute();
        self.cursor = 0;
        debug!(%filter, len = self.view.len(), "filter changed");
    }

    /// Move to `index`, clamped to the active view.
    pub fn go_to(&mut self, index: i64) {
        let last = self.view.len().saturating_sub(1);
        self.cursor = usize::try_from(index.max(0)).unwrap_or(usize::MAX).min(last);
    }

    /// Move back one question. Returns `false` at the start of the view.
    pub fn prev(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move forward one question. Returns `false` at the end of the view.
    pub fn next(&mut self) -> bool {
        if self.cursor + 1 >= self.view.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Set the selection of a question to the option at `option_index`, or
    /// clear it with `None`.
    pub fn select_option(
        &mut self,
        question_id: QuestionId,
        option_index: Option<usize>,
    ) -> Result<Selection, NavigatorError> {
        let position = self
            .position(question_id)
            .ok_or(NavigatorError::QuestionNotFound(question_id))?;
        let question = &mut self.questions[position];

        let current = match option_index {
            Some(index) => Some(
                OptionLabel::from_index(index)
                    .filter(|_| index < question.options.len())
                    .ok_or(NavigatorError::OptionOutOfRange {
                        question_id,
                        index,
                        len: question.options.len(),
                    })?,
            ),
            None => None,
        };

        let previous = question.user_selected_option;
        let was_correct = question.is_correct();
        question.user_selected_option = current;
        let score_delta = i32::from(question.is_correct()) - i32::from(was_correct);

        self.recompute();
        Ok(Selection {
            question_id,
            previous,
            current,
            score_delta,
        })
    }

    /// Select the option at `option_index`, or clear the selection if that
    /// option is already the selected one.
    pub fn click_option(
        &mut self,
        question_id: QuestionId,
        option_index: usize,
    ) -> Result<Selection, NavigatorError> {
        let already_selected = self
            .question(question_id)
            .and_then(|q| q.user_selected_option)
            .is_some_and(|label| label.index() == option_index);

        self.select_option(question_id, (!already_selected).then_some(option_index))
    }

    /// Flip a question's favorite flag. Returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, question_id: QuestionId) -> bool {
        let now_favorite = if self.favorites.remove(&question_id) {
            false
        } else {
            self.favorites.insert(question_id);
            true
        };
        self.recompute();
        now_favorite
    }

    pub fn set_favorites(&mut self, favorites: impl IntoIterator<Item = QuestionId>) {
        self.favorites = favorites.into_iter().collect();
        self.recompute();
    }

    /// Overwrite selections from a `question id -> label` map. Questions
    /// missing from the map keep their current selection.
    pub fn apply_selections(&mut self, selections: &HashMap<QuestionId, Option<OptionLabel>>) {
        for question in &mut self.questions {
            if let Some(selection) = selections.get(&question.id) {
                question.user_selected_option = *selection;
            }
        }
        self.recompute();
    }

    /// Install a new question list (after a shuffle or refetch).
    pub fn replace_questions(&mut self, questions: Vec<Question>, cursor: CursorPolicy) {
        self.questions = questions;
        self.recompute();
        if cursor == CursorPolicy::Reset {
            self.cursor = 0;
        }
    }

    /// Position of a question within the active view.
    pub fn index_in_view(&self, question_id: QuestionId) -> Option<usize> {
        self.view
            .iter()
            .position(|&i| self.questions[i].id == question_id)
    }

    /// Unanswered questions with their 1-based number in the quiz set.
    pub fn unanswered(&self) -> Vec<(usize, &Question)> {
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, q)| !q.is_answered())
            .map(|(i, q)| (i + 1, q))
            .collect()
    }

    /// Number of correctly answered questions, counted from scratch.
    pub fn score(&self) -> u32 {
        self.questions.iter().filter(|q| q.is_correct()).count() as u32
    }

    fn position(&self, question_id: QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| q.id == question_id)
    }

    fn recompute(&mut self) {
        let filter = self.filter;
        let favorites = &self.favorites;
        self.view = self
            .questions
            .iter()
            .enumerate()
            .filter(|(_, q)| filter.matches(q, favorites))
            .map(|(i, _)| i)
            .collect();
        self.cursor = self.cursor.min(self.view.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(index: usize) -> OptionLabel {
        OptionLabel::from_index(index).unwrap()
    }

    fn question(id: QuestionId, answer: usize, selected: Option<usize>) -> Question {
        Question {
            id,
            order_index: id,
            text: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer: label(answer),
            url: None,
            explanation: String::new(),
            discussion_link: None,
            user_selected_option: selected.map(label),
            has_math_content: false,
        }
    }

    fn five() -> QuestionNavigator {
        QuestionNavigator::new(vec![
            question(1, 0, Some(0)),
            question(2, 1, Some(2)),
            question(3, 2, None),
            question(4, 3, Some(3)),
            question(5, 0, None),
        ])
    }

    #[test]
    fn filters_select_the_right_subsequences() {
        let mut nav = five().with_favorites([4, 2]);
        assert_eq!(nav.view_ids(), vec![1, 2, 3, 4, 5]);

        nav.set_filter(QuestionFilter::Favorites);
        assert_eq!(nav.view_ids(), vec![2, 4]);

        nav.set_filter(QuestionFilter::Answered);
        assert_eq!(nav.view_ids(), vec![1, 2, 4]);

        nav.set_filter(QuestionFilter::Unanswered);
        assert_eq!(nav.view_ids(), vec![3, 5]);
    }

    #[test]
    fn incorrect_filter_includes_unanswered() {
        let mut nav = five();
        nav.set_filter(QuestionFilter::Incorrect);
        assert_eq!(nav.view_ids(), vec![2, 3, 5]);
    }

    #[test]
    fn applying_the_same_filter_twice_is_idempotent() {
        let mut nav = five().with_favorites([1, 5]);
        for filter in QuestionFilter::ALL {
            nav.set_filter(filter);
            let first = nav.view_ids();
            nav.set_filter(filter);
            assert_eq!(nav.view_ids(), first, "{filter}");
        }
    }

    #[test]
    fn go_to_clamps() {
        let mut nav = five();
        nav.go_to(-5);
        assert_eq!(nav.cursor(), 0);
        nav.go_to(10_000);
        assert_eq!(nav.cursor(), 4);
        nav.go_to(2);
        assert_eq!(nav.current().map(|q| q.id), Some(3));

        let mut empty = QuestionNavigator::new(vec![]);
        empty.go_to(3);
        assert_eq!(empty.cursor(), 0);
        assert!(empty.current().is_none());
    }

    #[test]
    fn prev_and_next_stop_at_the_edges() {
        let mut nav = five();
        assert!(!nav.prev());
        assert!(nav.next());
        assert_eq!(nav.cursor(), 1);
        nav.go_to(4);
        assert!(!nav.next());
        assert_eq!(nav.cursor(), 4);
    }

    #[test]
    fn changing_filter_resets_cursor() {
        let mut nav = five();
        nav.go_to(3);
        nav.set_filter(QuestionFilter::Answered);
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn unfavoriting_the_last_viewed_favorite_clamps_cursor() {
        let mut nav = five().with_favorites([2, 4]);
        nav.set_filter(QuestionFilter::Favorites);
        nav.go_to(1);
        assert_eq!(nav.current().map(|q| q.id), Some(4));

        assert!(!nav.toggle_favorite(4));
        assert_eq!(nav.view_ids(), vec![2]);
        assert_eq!(nav.cursor(), 0);

        assert!(!nav.toggle_favorite(2));
        assert!(nav.is_empty());
        assert!(nav.current().is_none());

        assert!(nav.toggle_favorite(5));
        assert_eq!(nav.view_ids(), vec![5]);
    }

    #[test]
    fn select_then_deselect_correct_nets_zero() {
        let mut nav = five();
        let select = nav.select_option(3, Some(2)).unwrap();
        assert_eq!(select.score_delta, 1);
        assert_eq!(select.current, Some(label(2)));

        let deselect = nav.click_option(3, 2).unwrap();
        assert_eq!(deselect.current, None);
        assert_eq!(deselect.previous, Some(label(2)));
        assert_eq!(deselect.score_delta, -1);
        assert_eq!(select.score_delta + deselect.score_delta, 0);
    }

    #[test]
    fn switching_from_correct_to_wrong_is_minus_one() {
        let mut nav = five();
        assert_eq!(nav.select_option(1, Some(3)).unwrap().score_delta, -1);
        assert_eq!(nav.select_option(2, Some(0)).unwrap().score_delta, 0);
        let same = nav.select_option(4, Some(3)).unwrap();
        assert_eq!(same.score_delta, 0);
        assert!(!same.changed());
    }

    #[test]
    fn select_option_rejects_bad_input() {
        let mut nav = five();
        assert_eq!(
            nav.select_option(42, Some(0)),
            Err(NavigatorError::QuestionNotFound(42))
        );
        assert_eq!(
            nav.select_option(1, Some(4)),
            Err(NavigatorError::OptionOutOfRange {
                question_id: 1,
                index: 4,
                len: 4
            })
        );
    }

    #[test]
    fn selection_updates_the_active_view() {
        let mut nav = five();
        nav.set_filter(QuestionFilter::Unanswered);
        nav.go_to(1);
        nav.select_option(5, Some(1)).unwrap();
        assert_eq!(nav.view_ids(), vec![3]);
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn score_recount_and_unanswered() {
        let nav = five();
        assert_eq!(nav.score(), 2);
        let unanswered: Vec<_> = nav.unanswered().iter().map(|(n, q)| (*n, q.id)).collect();
        assert_eq!(unanswered, vec![(3, 3), (5, 5)]);
    }

    #[test]
    fn index_in_view_follows_filter() {
        let mut nav = five();
        assert_eq!(nav.index_in_view(4), Some(3));
        nav.set_filter(QuestionFilter::Unanswered);
        assert_eq!(nav.index_in_view(4), None);
        assert_eq!(nav.index_in_view(5), Some(1));
    }

    #[test]
    fn replace_questions_respects_cursor_policy() {
        let mut nav = five();
        nav.go_to(4);
        nav.replace_questions(
            vec![question(9, 0, None), question(8, 0, None)],
            CursorPolicy::Clamp,
        );
        assert_eq!(nav.cursor(), 1);

        nav.replace_questions(
            vec![question(7, 0, None), question(6, 0, None)],
            CursorPolicy::Reset,
        );
        assert_eq!(nav.cursor(), 0);
        assert_eq!(nav.view_ids(), vec![7, 6]);
    }

    #[test]
    fn apply_selections_overwrites_known_questions() {
        let mut nav = five();
        let selections = HashMap::from([(1, None), (3, Some(label(2)))]);
        nav.apply_selections(&selections);
        assert!(!nav.question(1).unwrap().is_answered());
        assert!(nav.question(3).unwrap().is_correct());
        assert!(nav.question(2).unwrap().is_answered());
    }

    #[test]
    fn filter_parse_and_display() {
        for filter in QuestionFilter::ALL {
            assert_eq!(filter.to_string().parse::<QuestionFilter>(), Ok(filter));
        }
        assert_eq!("Incorrect".parse::<QuestionFilter>(), Ok(QuestionFilter::Incorrect));
        assert!("wrong".parse::<QuestionFilter>().is_err());
    }
}
