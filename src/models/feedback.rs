use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::wire::ErrorDescriptor;

/// A participant's rating of a revealed question. Ratings are five
/// known levels, 0 (worst) through 4 (best).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Feedback {
    #[validate(range(min = 0, max = 4))]
    pub rating: i64,
    #[validate(length(max = 100))]
    pub message: String,
}

/// Raw client-submitted feedback, both fields potentially absent.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackSubmission {
    pub rating: Option<i64>,
    pub message: Option<String>,
}

impl Feedback {
    /// Validates a submission into a `Feedback`, reporting the
    /// rejected fields in wire form.
    pub fn parse(submission: &FeedbackSubmission) -> Result<Feedback, Vec<ErrorDescriptor>> {
        let Some(rating) = submission.rating else {
            return Err(vec![ErrorDescriptor::new("rating", Value::Null)]);
        };

        let feedback = Feedback {
            rating,
            message: submission.message.clone().unwrap_or_default(),
        };

        match feedback.validate() {
            Ok(()) => Ok(feedback),
            Err(validation) => {
                let mut errors = Vec::new();
                for field in validation.field_errors().keys() {
                    match field.as_ref() {
                        "rating" => errors.push(ErrorDescriptor::new("rating", feedback.rating)),
                        "message" => {
                            errors.push(ErrorDescriptor::new(
                                "message",
                                feedback.message.chars().count(),
                            ));
                        }
                        _ => {}
                    }
                }
                Err(errors)
            }
        }
    }
}
