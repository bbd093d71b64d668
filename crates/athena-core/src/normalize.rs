//! Content normalization: backend text to renderable HTML fragments.
//!
//! Every function here is a total `&str -> String` transform. Text that does
//! not match a pattern passes through unchanged, so the transforms can be
//! composed freely.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::images::{expand_explanation_images, expand_question_images};
use crate::model::{OptionLabel, Question, QuestionId};

static MATHJAX_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="mathjax">(.*?)</span>"#).expect("static regex")
});

static BRACKET_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\[([\s\S]*?)\\\]").expect("static regex"));

/// Shown instead of an empty question text.
const EMPTY_QUESTION_TEXT: &str = "Question";

/// Rewrite math markup into the delimiters the typesetter understands.
///
/// `<span class="mathjax">x</span>` becomes `$x$` and `\[x\]` becomes `$$x$$`.
pub fn normalize_math(content: &str) -> String {
    let inline = MATHJAX_SPAN.replace_all(content, |caps: &Captures<'_>| {
        format!("${}$", &caps[1])
    });
    BRACKET_MATH
        .replace_all(&inline, |caps: &Captures<'_>| format!("$${}$$", &caps[1]))
        .into_owned()
}

/// Question text or option text, ready for injection.
pub fn render_question_text(text: &str, quiz_set_id: &str) -> String {
    expand_question_images(&normalize_math(text), quiz_set_id)
}

/// Explanation text, ready for injection.
pub fn render_explanation(text: &str, quiz_set_id: &str) -> String {
    expand_explanation_images(text, quiz_set_id)
}

/// A question with every displayed string normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuestion {
    pub id: QuestionId,
    pub text: String,
    /// `(label, html)` per option, in display order.
    pub options: Vec<(OptionLabel, String)>,
    pub explanation: String,
}

pub fn render_question(question: &Question, quiz_set_id: &str) -> RenderedQuestion {
    let text = if question.text.is_empty() {
        EMPTY_QUESTION_TEXT
    } else {
        question.text.as_str()
    };

    let options = question
        .options
        .iter()
        .enumerate()
        .filter_map(|(index, option)| {
            OptionLabel::from_index(index)
                .map(|label| (label, render_question_text(option, quiz_set_id)))
        })
        .collect();

    RenderedQuestion {
        id: question.id,
        text: render_question_text(text, quiz_set_id),
        options,
        explanation: render_explanation(&question.explanation, quiz_set_id),
    }
}
