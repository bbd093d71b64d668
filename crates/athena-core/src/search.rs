//! Keyword search over question text.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::QuestionId;
use crate::navigator::QuestionNavigator;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>?").expect("static regex"));

/// Remove HTML tags, keeping their text content.
pub fn strip_html(html: &str) -> String {
    HTML_TAG.replace_all(html, "").into_owned()
}

/// A question matching a search, located in the active view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub question_id: QuestionId,
    /// Where to jump with [`QuestionNavigator::go_to`].
    pub view_index: usize,
    /// Question text without markup.
    pub text: String,
    pub favorite: bool,
}

/// Case-insensitive substring search over every question's text.
///
/// Matches outside the active view are dropped, since there is nowhere to
/// navigate to. An empty keyword matches nothing.
pub fn search(navigator: &QuestionNavigator, keyword: &str) -> Vec<SearchHit> {
    if keyword.is_empty() {
        return Vec::new();
    }
    let needle = keyword.to_lowercase();

    navigator
        .questions()
        .iter()
        .filter_map(|question| {
            let text = strip_html(&question.text);
            if !text.to_lowercase().contains(&needle) {
                return None;
            }
            Some(SearchHit {
                question_id: question.id,
                view_index: navigator.index_in_view(question.id)?,
                text,
                favorite: navigator.is_favorite(question.id),
            })
        })
        .collect()
}
