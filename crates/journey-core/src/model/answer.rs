//! Reflection answers.
//!
//! Reflection questions come in three shapes (free text, a numeric scale and
//! a picked option), all stored under one map keyed by
//! `"<categoryOrChapter>_<questionIndex>"`. The value is echoed back for
//! display and never validated.
//!
//! Blobs written before answers were tagged hold bare strings and numbers;
//! those still read back as `Text` and `Scale`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single reflection answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AnswerValue {
    Text(String),
    Scale(i64),
    Choice(String),
}

impl AnswerValue {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Scale(_) => "scale",
            Self::Choice(_) => "choice",
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
enum TaggedAnswer {
    Text(String),
    Scale(i64),
    Choice(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireAnswer {
    Tagged(TaggedAnswer),
    Number(i64),
    Fraction(f64),
    Bare(String),
}

impl<'de> Deserialize<'de> for AnswerValue {
    #[allow(clippy::cast_possible_truncation)]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireAnswer::deserialize(deserializer)? {
            WireAnswer::Tagged(TaggedAnswer::Text(text)) | WireAnswer::Bare(text) => {
                Self::Text(text)
            }
            WireAnswer::Tagged(TaggedAnswer::Scale(n)) | WireAnswer::Number(n) => Self::Scale(n),
            WireAnswer::Fraction(x) => Self::Scale(x.round() as i64),
            WireAnswer::Tagged(TaggedAnswer::Choice(label)) => Self::Choice(label),
        })
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) | Self::Choice(text) => f.write_str(text),
            Self::Scale(n) => write!(f, "{n}"),
        }
    }
}

/// Build the map key for question `question` of `scope` (a category name or
/// a chapter label).
#[must_use]
pub fn answer_key(scope: &str, question: usize) -> String {
    format!("{scope}_{question}")
}
