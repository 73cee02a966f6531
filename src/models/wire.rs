use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::feedback::FeedbackSubmission;
use super::question::{Question, QuestionBody};

/// Event names carried in the `event` field of every frame. Requests
/// ack back under their own name (`create session` acks `created
/// session`); broadcasts use a distinct past-tense name.
pub mod events {
    pub const CREATE_SESSION: &str = "create session";
    pub const CREATED_SESSION: &str = "created session";
    pub const JOIN_SESSION: &str = "join session";
    pub const ADD_QUESTION: &str = "add question";
    pub const EDIT_QUESTION: &str = "edit question";
    pub const REMOVE_QUESTION: &str = "remove question";
    pub const KICK_USER: &str = "kick user";
    pub const START_SESSION: &str = "start session";
    pub const END_SESSION: &str = "end session";
    pub const NEXT_QUESTION: &str = "next question";
    pub const QUESTION_RESPONSE: &str = "question response";
    pub const END_QUESTION: &str = "end question";
    pub const SUBMIT_FEEDBACK: &str = "submit feedback";
    pub const SEND_HINT: &str = "send hint";

    pub const USER_JOINED: &str = "user joined";
    pub const USER_KICKED: &str = "user kicked";
    pub const SESSION_STARTED: &str = "session started";
    pub const SESSION_ENDED: &str = "session ended";
    pub const QUESTION_RESPONSE_ADDED: &str = "question response added";
    pub const QUESTION_ENDED: &str = "question ended";
    pub const FEEDBACK_SUBMITTED: &str = "feedback submitted";
    pub const HINT_RECEIVED: &str = "hint received";
    pub const USER_DISCONNECTED: &str = "user disconnected";
}

/// One frame from a client: an event name plus its argument payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub args: Option<Value>,
}

/// The envelope every acknowledgement and broadcast is wrapped in.
/// `data` is present exactly on success (possibly null), `errors`
/// exactly on failure (possibly null).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u16,
    pub event: String,
    pub session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl Envelope {
    pub fn ok(event: &str, session: Option<&str>, data: Value) -> Self {
        Self {
            status: 200,
            event: event.to_string(),
            session: session.map(str::to_string),
            data: Some(data),
            errors: None,
        }
    }

    pub fn fail(event: &str, session: Option<&str>, errors: Vec<ErrorDescriptor>) -> Self {
        Self {
            status: 400,
            event: event.to_string(),
            session: session.map(str::to_string),
            data: None,
            errors: Some(json!(errors)),
        }
    }

    /// Failure with `errors: null`, used when the request's argument
    /// payload is missing entirely.
    pub fn fail_empty(event: &str) -> Self {
        Self {
            status: 400,
            event: event.to_string(),
            session: None,
            data: None,
            errors: Some(Value::Null),
        }
    }
}

/// Names the rejected argument. `value` echoes the offending scalar,
/// or a nested `{index, field, value}` for positional body errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub field: String,
    pub value: Value,
}

impl ErrorDescriptor {
    pub fn new(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Error inside a positional list, e.g. choice 2 has empty text.
    pub fn nested(field: &str, index: usize, inner_field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: json!({
                "index": index,
                "field": inner_field,
                "value": value.into(),
            }),
        }
    }
}

// Request argument shapes. Every field is optional at the decode layer
// so the handlers can report precisely which argument is missing.

#[derive(Debug, Clone, Deserialize)]
pub struct JoinSessionArgs {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionArgs {
    pub session: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddQuestionArgs {
    pub session: Option<String>,
    pub question: Option<QuestionSubmission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditQuestionArgs {
    pub session: Option<String>,
    pub index: Option<i64>,
    pub question: Option<QuestionSubmission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveQuestionArgs {
    pub session: Option<String>,
    pub index: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KickUserArgs {
    pub session: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionResponseArgs {
    pub session: Option<String>,
    pub name: Option<String>,
    pub index: Option<i64>,
    pub response: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndQuestionArgs {
    pub session: Option<String>,
    pub question: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitFeedbackArgs {
    pub session: Option<String>,
    pub name: Option<String>,
    pub question: Option<i64>,
    pub feedback: Option<FeedbackSubmission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendHintArgs {
    pub session: Option<String>,
    pub question: Option<i64>,
    pub hint: Option<String>,
}

/// A client-authored question, every field potentially absent. The
/// submission parser turns this into a `Question` or an error list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSubmission {
    pub text: Option<String>,
    pub body: Option<BodySubmission>,
    pub time_limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodySubmission {
    pub kind: Option<String>,
    pub choices: Option<Vec<ChoiceSubmission>>,
    pub answer: Option<i64>,
    pub answers: Option<Vec<ChoiceSubmission>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceSubmission {
    pub text: Option<String>,
    pub points: Option<i64>,
}

/// Wire view of a question, shared by the next-question ack and the
/// room broadcast (both carry the identical payload).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionData {
    pub index: i64,
    pub text: String,
    pub time_limit: u64,
    pub total_points: u32,
    pub body: QuestionBody,
}

impl QuestionData {
    pub fn of(question: &Question) -> Self {
        Self {
            index: question.index,
            text: question.text.clone(),
            time_limit: question.time_limit,
            total_points: question.total_points,
            body: question.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_carries_data_and_no_errors() {
        let envelope = Envelope::ok(events::CREATED_SESSION, Some("ABCD1234"), json!("ABCD1234"));
        let wire = serde_json::to_value(&envelope).unwrap();

        assert_eq!(wire["status"], 200);
        assert_eq!(wire["event"], "created session");
        assert_eq!(wire["session"], "ABCD1234");
        assert_eq!(wire["data"], "ABCD1234");
        assert!(wire.get("errors").is_none());
    }

    #[test]
    fn failure_envelope_carries_errors_and_no_data() {
        let envelope = Envelope::fail(
            events::ADD_QUESTION,
            None,
            vec![ErrorDescriptor::new("session", Value::Null)],
        );
        let wire = serde_json::to_value(&envelope).unwrap();

        assert_eq!(wire["status"], 400);
        assert_eq!(wire["session"], Value::Null);
        assert_eq!(wire["errors"][0]["field"], "session");
        assert!(wire.get("data").is_none());
    }

    #[test]
    fn missing_args_envelope_has_null_errors() {
        let wire = serde_json::to_value(Envelope::fail_empty(events::JOIN_SESSION)).unwrap();

        assert_eq!(wire["status"], 400);
        assert_eq!(wire["errors"], Value::Null);
    }

    #[test]
    fn nested_descriptor_points_at_the_offending_entry() {
        let descriptor = ErrorDescriptor::nested("choices", 2, "text", "");
        let wire = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(wire["field"], "choices");
        assert_eq!(wire["value"]["index"], 2);
        assert_eq!(wire["value"]["field"], "text");
    }
}
