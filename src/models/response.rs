use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A participant's answer to the live question. The `kind` tag on the
/// wire matches the body kind of the question being answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub submitter: String,
    #[serde(flatten)]
    pub answer: ResponseAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "answer", rename_all = "kebab-case")]
pub enum ResponseAnswer {
    MultipleChoice(i64),
    FillIn(String),
}

impl Response {
    /// Key under which this response is counted in the frequency map.
    /// Multiple-choice counts by choice index, fill-in by lowercased text.
    pub fn frequency_key(&self) -> String {
        match &self.answer {
            ResponseAnswer::MultipleChoice(index) => index.to_string(),
            ResponseAnswer::FillIn(text) => text.to_lowercase(),
        }
    }

    /// Rendering used when relaying the response to the session owner.
    /// Fill-in text is passed through verbatim.
    pub fn as_wire_string(&self) -> String {
        match &self.answer {
            ResponseAnswer::MultipleChoice(index) => index.to_string(),
            ResponseAnswer::FillIn(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("question has not started")]
    NotStarted,
    #[error("question has already ended")]
    Ended,
    #[error("duplicate response")]
    Duplicate,
}
