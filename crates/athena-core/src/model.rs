//! Core data model types for athena.
//!
//! Questions and quiz sets as the backend serves them, plus the derived
//! values (option labels, grades, badges) the rest of the crate works with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Backend-assigned question identifier.
pub type QuestionId = i64;

/// Minimum percentage for a quiz set to count as passed.
pub const PASSING_PERCENTAGE: u32 = 70;

/// Identifies an option by position, rendered as `Option A`, `Option B`, ...
///
/// Labels say nothing about option content: after an options shuffle the same
/// label points at a different text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionLabel(u8);

impl OptionLabel {
    /// Number of distinct labels (`A` through `Z`).
    pub const MAX_OPTIONS: usize = 26;

    /// Label for the option at `index`, if one exists.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < Self::MAX_OPTIONS).then_some(Self(index as u8))
    }

    /// Zero-based position this label refers to.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn letter(self) -> char {
        (b'A' + self.0) as char
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Option {}", self.letter())
    }
}

impl FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let letter = s
            .strip_prefix("Option ")
            .filter(|rest| rest.len() == 1)
            .and_then(|rest| rest.chars().next())
            .filter(char::is_ascii_uppercase)
            .ok_or_else(|| format!("invalid option label: {s:?}"))?;
        Ok(Self(letter as u8 - b'A'))
    }
}

impl Serialize for OptionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OptionLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique, stable identifier.
    pub id: QuestionId,
    /// Position within the quiz set as stored by the backend.
    #[serde(default, rename = "order")]
    pub order_index: i64,
    /// Question text; may embed image placeholders, math spans and HTML.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Option texts, labelled by position.
    #[serde(default)]
    pub options: Vec<String>,
    /// Label of the correct option.
    pub answer: OptionLabel,
    /// Source page the question was scraped from.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub explanation: String,
    #[serde(default)]
    pub discussion_link: Option<String>,
    /// Label the user picked, if any.
    #[serde(default, rename = "userSelectedOption", alias = "user_selected_option")]
    pub user_selected_option: Option<OptionLabel>,
    #[serde(default, rename = "hasMathContent")]
    pub has_math_content: bool,
}

impl Question {
    pub fn is_answered(&self) -> bool {
        self.user_selected_option.is_some()
    }

    /// Whether the current selection is the correct one.
    pub fn is_correct(&self) -> bool {
        self.user_selected_option == Some(self.answer)
    }

    /// Option text behind a label.
    pub fn option(&self, label: OptionLabel) -> Option<&str> {
        self.options.get(label.index()).map(String::as_str)
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.option(self.answer)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Pass/fail outcome of a quiz set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    Passed,
    Failed,
}

impl Grade {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= PASSING_PERCENTAGE {
            Grade::Passed
        } else {
            Grade::Failed
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Passed => write!(f, "Passed"),
            Grade::Failed => write!(f, "Failed"),
        }
    }
}

/// Status badge shown next to a quiz set on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    New,
    InProgress,
    Passed,
    Failed,
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Badge::New => write!(f, "New"),
            Badge::InProgress => write!(f, "In Progress"),
            Badge::Passed => write!(f, "Passed"),
            Badge::Failed => write!(f, "Failed"),
        }
    }
}

/// `round(100 * score / total)`, or 0 for an empty quiz set.
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(score) / f64::from(total) * 100.0).round() as u32
}

/// A quiz set as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSet {
    pub id: String,
    pub title: String,
    /// Source URLs of the questions.
    #[serde(default)]
    pub urls: Vec<String>,
    /// Share of answered questions, 0–100.
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub lock_state: bool,
}

impl QuizSet {
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total_questions)
    }

    pub fn grade(&self) -> Grade {
        Grade::from_percentage(self.percentage())
    }

    /// Badge for this set given the global lock.
    pub fn badge(&self, globally_locked: bool) -> Badge {
        if self.progress == 0 {
            Badge::New
        } else if globally_locked {
            Badge::InProgress
        } else {
            match self.grade() {
                Grade::Passed => Badge::Passed,
                Grade::Failed => Badge::Failed,
            }
        }
    }
}

/// Result shown after submitting a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizSummary {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub grade: Grade,
}

impl QuizSummary {
    pub fn new(score: u32, total: u32) -> Self {
        let percentage = percentage(score, total);
        Self {
            score,
            total,
            percentage,
            grade: Grade::from_percentage(percentage),
        }
    }
}

impl fmt::Display for QuizSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}%) - {}",
            self.score, self.total, self.percentage, self.grade
        )
    }
}
