use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;

use super::feedback::Feedback;
use super::response::{Response, ResponseAnswer, ResponseError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub points: u32,
}

/// The gradable part of a question. Fill-in answers match
/// case-insensitively on their text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum QuestionBody {
    MultipleChoice { choices: Vec<Choice>, answer: usize },
    FillIn { answers: Vec<Choice> },
}

impl QuestionBody {
    pub fn kind(&self) -> &'static str {
        match self {
            QuestionBody::MultipleChoice { .. } => "multiple-choice",
            QuestionBody::FillIn { .. } => "fill-in",
        }
    }

    pub fn total_points(&self) -> u32 {
        match self {
            QuestionBody::MultipleChoice { choices, .. } => {
                choices.iter().map(|c| c.points).sum()
            }
            QuestionBody::FillIn { answers } => answers.iter().map(|a| a.points).sum(),
        }
    }
}

/// A single prompt with its body, time limit, and everything collected
/// while it is live: responses, per-answer counts, the first correct
/// submitter, and feedback. Lifecycle is Created -> Started -> Ended,
/// driven by the owner or by the expiry timer, whichever fires first.
#[derive(Debug)]
pub struct Question {
    pub index: i64,
    pub text: String,
    pub time_limit: u64,
    pub total_points: u32,
    pub body: QuestionBody,
    pub is_started: bool,
    pub has_ended: bool,
    pub responses: HashMap<String, Response>,
    pub frequency: HashMap<String, u32>,
    pub first_correct: Option<String>,
    pub feedback: HashMap<String, Feedback>,
    // Lowercased answer text -> points, built once so grading is a map
    // lookup instead of a scan.
    answer_points: HashMap<String, u32>,
    timer: Option<AbortHandle>,
}

impl Question {
    /// Builds a question from already-validated parts. The frequency
    /// map is seeded with every known answer key at zero so relative
    /// frequencies are defined for canonical answers from the start.
    pub fn new(text: String, body: QuestionBody, time_limit: u64) -> Self {
        let mut frequency = HashMap::new();
        let mut answer_points = HashMap::new();

        match &body {
            QuestionBody::MultipleChoice { choices, .. } => {
                for index in 0..choices.len() {
                    frequency.insert(index.to_string(), 0);
                }
            }
            QuestionBody::FillIn { answers } => {
                for answer in answers {
                    let key = answer.text.to_lowercase();
                    frequency.insert(key.clone(), 0);
                    answer_points.insert(key, answer.points);
                }
            }
        }

        Self {
            index: -1,
            text,
            time_limit,
            total_points: body.total_points(),
            body,
            is_started: false,
            has_ended: false,
            responses: HashMap::new(),
            frequency,
            first_correct: None,
            feedback: HashMap::new(),
            answer_points,
            timer: None,
        }
    }

    pub fn start(&mut self) {
        self.is_started = true;
    }

    /// Ends the question and cancels the pending expiry. Returns
    /// whether this call performed the transition; repeat calls and
    /// calls before start are no-ops.
    pub fn end(&mut self) -> bool {
        if !self.is_started || self.has_ended {
            return false;
        }
        self.has_ended = true;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        true
    }

    pub fn arm_timer(&mut self, handle: AbortHandle) {
        if self.has_ended {
            handle.abort();
            return;
        }
        self.timer = Some(handle);
    }

    /// Records a response, grades it, and updates the statistics.
    /// Returns the points earned.
    pub fn add_response(&mut self, response: Response) -> Result<u32, ResponseError> {
        if !self.is_started {
            return Err(ResponseError::NotStarted);
        }
        if self.has_ended {
            return Err(ResponseError::Ended);
        }
        if self.responses.contains_key(&response.submitter) {
            return Err(ResponseError::Duplicate);
        }

        let points = self.grade(&response);
        *self.frequency.entry(response.frequency_key()).or_insert(0) += 1;
        if points > 0 && self.first_correct.is_none() {
            self.first_correct = Some(response.submitter.clone());
        }
        self.responses.insert(response.submitter.clone(), response);

        Ok(points)
    }

    /// Deterministic in (body, response); zero when the response kind
    /// does not match the body kind.
    pub fn grade(&self, response: &Response) -> u32 {
        match (&self.body, &response.answer) {
            (
                QuestionBody::MultipleChoice { choices, answer },
                ResponseAnswer::MultipleChoice(chosen),
            ) => {
                if *chosen == *answer as i64 {
                    choices.get(*answer).map(|c| c.points).unwrap_or(0)
                } else {
                    0
                }
            }
            (QuestionBody::FillIn { .. }, ResponseAnswer::FillIn(text)) => self
                .answer_points
                .get(&text.to_lowercase())
                .copied()
                .unwrap_or(0),
            _ => 0,
        }
    }

    pub fn frequency_of(&self, response: &Response) -> u32 {
        self.frequency
            .get(&response.frequency_key())
            .copied()
            .unwrap_or(0)
    }

    /// Caller guarantees at least one recorded response.
    pub fn relative_frequency_of(&self, response: &Response) -> f64 {
        self.frequency_of(response) as f64 / self.responses.len() as f64
    }

    /// At most one feedback per participant; returns false on a
    /// duplicate.
    pub fn add_feedback(&mut self, name: &str, feedback: Feedback) -> bool {
        if self.feedback.contains_key(name) {
            return false;
        }
        self.feedback.insert(name.to_string(), feedback);
        true
    }

    /// Deep copy without the live timer handle.
    pub fn snapshot(&self) -> Question {
        Question {
            index: self.index,
            text: self.text.clone(),
            time_limit: self.time_limit,
            total_points: self.total_points,
            body: self.body.clone(),
            is_started: self.is_started,
            has_ended: self.has_ended,
            responses: self.responses.clone(),
            frequency: self.frequency.clone(),
            first_correct: self.first_correct.clone(),
            feedback: self.feedback.clone(),
            answer_points: self.answer_points.clone(),
            timer: None,
        }
    }
}
