//! Image placeholder expansion.
//!
//! Scraped questions mark inline images with sentinel tokens such as
//! `(image)q7_within_2(image)`. The scraper stores the image files under a
//! per-context directory; this module rewrites each token into an `<img>`
//! tag pointing at that file. Tokens that do not match are left untouched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const QUESTION_ASSET_ROOT: &str = "/static/assets/images/background";
const EXPLANATION_ASSET_ROOT: &str = "/assets/images/background";

const INLINE_STYLE: &str = "display: inline-block; width: auto; height: auto;";
const BLOCK_STYLE: &str =
    "display: block; margin-left: auto; margin-right: auto; width: auto; height: auto;";
const EXPLANATION_STYLE: &str = "display: inline-block; max-width: 100%; height: auto;";

static WITHIN_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(image\)q(\d+)_(?:[a-z0-9-]+_)?within_(\d+)\(image\)")
        .expect("static regex")
});

static AFTER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)<br/>\(image\)(?:q(\d+)_(?:[a-z0-9-]+_)?after_(\d+)|pinoybix_q(\d+)_after_(1))\(image\)",
    )
    .expect("static regex")
});

static EXAMVEDA_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(image\)examveda_q(\d+)_main\(image\)").expect("static regex")
});

static EXPLANATION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(image\)q(\d+)_[a-z0-9-]+_explanation_(\d+)\(image\)")
        .expect("static regex")
});

/// Where a placeholder sits, which decides the image directory and styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageContext {
    /// Inline within the question text.
    Within,
    /// Block image after the question text.
    After,
    /// Block image after a Pinoybix question.
    PinoybixAfter,
    /// Main figure of an Examveda question.
    ExamvedaMain,
    /// Inline within an explanation.
    Explanation,
}

impl ImageContext {
    /// Name used in image file names.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageContext::Within => "within",
            ImageContext::After => "after",
            ImageContext::PinoybixAfter => "pinoybix_after",
            ImageContext::ExamvedaMain => "examveda_main",
            ImageContext::Explanation => "explanation",
        }
    }

    fn directory(self) -> &'static str {
        match self {
            ImageContext::Within => "Within",
            ImageContext::After => "After",
            ImageContext::PinoybixAfter => "PinoybixAfter",
            ImageContext::ExamvedaMain => "ExamvedaMain",
            ImageContext::Explanation => "Explanation",
        }
    }

    fn asset_root(self) -> &'static str {
        match self {
            ImageContext::Explanation => EXPLANATION_ASSET_ROOT,
            _ => QUESTION_ASSET_ROOT,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ImageContext::ExamvedaMain => "jpg",
            _ => "png",
        }
    }

    fn style(self) -> &'static str {
        match self {
            ImageContext::After | ImageContext::PinoybixAfter => BLOCK_STYLE,
            ImageContext::Explanation => EXPLANATION_STYLE,
            _ => INLINE_STYLE,
        }
    }
}

/// The fields captured from one placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    pub context: ImageContext,
    pub question_number: u64,
    /// Image index within the question; Examveda tokens carry none.
    pub index: Option<u64>,
}

impl ImageRef {
    /// `q<N>_<quizSetId>_<context>_<index>.<ext>`
    pub fn file_name(&self, quiz_set_id: &str) -> String {
        let stem = format!(
            "q{}_{}_{}",
            self.question_number,
            quiz_set_id,
            self.context.as_str()
        );
        match self.index {
            Some(index) => format!("{stem}_{index}.{}", self.context.extension()),
            None => format!("{stem}.{}", self.context.extension()),
        }
    }

    pub fn src(&self, quiz_set_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.context.asset_root(),
            self.context.directory(),
            self.file_name(quiz_set_id)
        )
    }

    pub fn to_html(&self, quiz_set_id: &str) -> String {
        let img = format!(
            r#"<img src="{}" alt="{}" style="{}">"#,
            self.src(quiz_set_id),
            self.file_name(quiz_set_id),
            self.context.style()
        );
        match self.context {
            ImageContext::After | ImageContext::PinoybixAfter => format!("<br>{img}<br>"),
            _ => img,
        }
    }
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u64> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

/// Replace every match of `pattern`, leaving a token as-is when its numbers
/// do not fit the captured types.
fn expand(
    text: &str,
    pattern: &Regex,
    quiz_set_id: &str,
    to_ref: impl Fn(&Captures<'_>) -> Option<ImageRef>,
) -> String {
    pattern
        .replace_all(text, |caps: &Captures<'_>| match to_ref(caps) {
            Some(image) => image.to_html(quiz_set_id),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Expand the placeholders that appear in question text and options.
pub fn expand_question_images(text: &str, quiz_set_id: &str) -> String {
    let text = expand(text, &WITHIN_TOKEN, quiz_set_id, |caps| {
        Some(ImageRef {
            context: ImageContext::Within,
            question_number: number(caps, 1)?,
            index: Some(number(caps, 2)?),
        })
    });

    let text = expand(&text, &AFTER_TOKEN, quiz_set_id, |caps| {
        if caps.get(1).is_some() {
            Some(ImageRef {
                context: ImageContext::After,
                question_number: number(caps, 1)?,
                index: Some(number(caps, 2)?),
            })
        } else {
            Some(ImageRef {
                context: ImageContext::PinoybixAfter,
                question_number: number(caps, 3)?,
                index: Some(number(caps, 4)?),
            })
        }
    });

    expand(&text, &EXAMVEDA_TOKEN, quiz_set_id, |caps| {
        Some(ImageRef {
            context: ImageContext::ExamvedaMain,
            question_number: number(caps, 1)?,
            index: None,
        })
    })
}

/// Expand the placeholders that appear in explanations.
pub fn expand_explanation_images(text: &str, quiz_set_id: &str) -> String {
    expand(text, &EXPLANATION_TOKEN, quiz_set_id, |caps| {
        Some(ImageRef {
            context: ImageContext::Explanation,
            question_number: number(caps, 1)?,
            index: Some(number(caps, 2)?),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_token_uses_caller_quiz_set_id() {
        let out = expand_question_images("See (image)q7_within_2(image) here", "abc123");
        assert_eq!(out.matches("<img").count(), 1);
        assert!(out.contains(
            r#"src="/static/assets/images/background/Within/q7_abc123_within_2.png""#
        ));
        assert!(out.contains(r#"alt="q7_abc123_within_2.png""#));
        assert!(out.starts_with("See <img"));
        assert!(out.ends_with("> here"));
    }

    #[test]
    fn within_token_with_embedded_set_id() {
        let out = expand_question_images("(image)q7_old-set_within_2(image)", "abc123");
        assert!(out.contains("q7_abc123_within_2.png"));
        assert!(!out.contains("old-set"));
    }

    #[test]
    fn tokens_are_case_insensitive() {
        let out = expand_question_images("(IMAGE)Q3_WITHIN_1(IMAGE)", "s");
        assert!(out.contains("q3_s_within_1.png"));
    }

    #[test]
    fn after_token_is_wrapped_in_breaks() {
        let out = expand_question_images("Text<br/>(image)q4_after_1(image)", "s1");
        assert_eq!(
            out,
            format!(
                r#"Text<br><img src="/static/assets/images/background/After/q4_s1_after_1.png" alt="q4_s1_after_1.png" style="{BLOCK_STYLE}"><br>"#
            )
        );
    }

    #[test]
    fn after_token_requires_leading_break() {
        let text = "Text (image)q4_after_1(image)";
        assert_eq!(expand_question_images(text, "s1"), text);
    }

    #[test]
    fn pinoybix_after_token() {
        let out = expand_question_images("<br/>(image)pinoybix_q12_after_1(image)", "set");
        assert!(out.contains("/PinoybixAfter/q12_set_pinoybix_after_1.png"));
    }

    #[test]
    fn examveda_token_is_jpg_without_index() {
        let out = expand_question_images("(image)examveda_q5_main(image)", "set");
        assert!(out.contains("/ExamvedaMain/q5_set_examveda_main.jpg"));
    }

    #[test]
    fn explanation_token_only_in_explanations() {
        let text = "Because (image)q2_xyz_explanation_1(image).";
        assert_eq!(expand_question_images(text, "abc"), text);

        let out = expand_explanation_images(text, "abc");
        assert!(out.contains(
            r#"src="/assets/images/background/Explanation/q2_abc_explanation_1.png""#
        ));
    }

    #[test]
    fn malformed_tokens_pass_through() {
        for text in [
            "(image)q_within_2(image)",
            "(image)q7_within_(image)",
            "(image)q7_within_2",
            "plain text with (parentheses)",
            "",
        ] {
            assert_eq!(expand_question_images(text, "abc"), text);
        }
    }

    #[test]
    fn oversized_numbers_leave_token_unchanged() {
        let text = "(image)q99999999999999999999999_within_1(image)";
        assert_eq!(expand_question_images(text, "abc"), text);
    }
}
