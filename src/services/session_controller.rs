use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::metrics::{EVENTS_TOTAL, RESPONSES_SUBMITTED_TOTAL, SESSIONS_ACTIVE, SESSIONS_TOTAL};
use crate::models::feedback::Feedback;
use crate::models::response::{Response, ResponseError};
use crate::models::session::Session;
use crate::models::wire::{
    events, AddQuestionArgs, EditQuestionArgs, EndQuestionArgs, Envelope, ErrorDescriptor,
    JoinSessionArgs, KickUserArgs, QuestionData, QuestionResponseArgs, RemoveQuestionArgs,
    SendHintArgs, SessionArgs, SubmitFeedbackArgs,
};
use crate::models::User;
use crate::services::hub::Hub;
use crate::services::submission_parser;

const SESSION_CODE_LEN: usize = 8;
const SESSION_CODE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// One-shot acknowledgement sink handed to each handler. Consuming
/// `self` on every send makes "exactly one ack per request" a
/// compile-time property of the handlers.
pub struct AckSink {
    hub: Arc<Hub>,
    conn_id: String,
    request_event: &'static str,
    ack_event: &'static str,
}

impl AckSink {
    fn new(hub: Arc<Hub>, conn_id: &str, request_event: &'static str) -> Self {
        let ack_event = match request_event {
            events::CREATE_SESSION => events::CREATED_SESSION,
            other => other,
        };
        Self {
            hub,
            conn_id: conn_id.to_string(),
            request_event,
            ack_event,
        }
    }

    fn ok(self, session: &str, data: Value) {
        let envelope = Envelope::ok(self.ack_event, Some(session), data);
        self.finish(envelope);
    }

    fn fail(self, errors: Vec<ErrorDescriptor>) {
        let envelope = Envelope::fail(self.ack_event, None, errors);
        self.finish(envelope);
    }

    /// State rejection: the request was well-formed but the session or
    /// question is not in a state that permits it.
    fn fail_state(self) {
        self.fail(Vec::new());
    }

    fn missing_args(self) {
        let envelope = Envelope::fail_empty(self.ack_event);
        self.finish(envelope);
    }

    fn finish(self, envelope: Envelope) {
        let status = envelope.status.to_string();
        EVENTS_TOTAL
            .with_label_values(&[self.request_event, status.as_str()])
            .inc();
        self.hub.emit_to_one(&self.conn_id, envelope);
    }
}

/// The event-dispatching core: owns the registry of live sessions,
/// authorizes every request against the caller's connection id, drives
/// the session/question state machines, and fans results out through
/// the hub. Handlers run under the registry lock, so operations on a
/// session never interleave; all emits are non-blocking.
pub struct SessionController {
    hub: Arc<Hub>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionController {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self {
            hub,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn live_session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Routes one decoded frame to its handler. Unknown events are
    /// acknowledged with a plain failure so a confused client is never
    /// left waiting.
    pub fn dispatch(self: Arc<Self>, conn_id: &str, event: &str, args: Option<Value>) {
        tracing::debug!(conn = conn_id, event, "dispatching");
        match event {
            events::CREATE_SESSION => {
                let ack = self.ack(conn_id, events::CREATE_SESSION);
                self.create_session(ack, conn_id);
            }
            events::JOIN_SESSION => {
                let ack = self.ack(conn_id, events::JOIN_SESSION);
                with_args(ack, args, |ack, a| self.join_session(ack, conn_id, a));
            }
            events::ADD_QUESTION => {
                let ack = self.ack(conn_id, events::ADD_QUESTION);
                with_args(ack, args, |ack, a| self.add_question(ack, conn_id, a));
            }
            events::EDIT_QUESTION => {
                let ack = self.ack(conn_id, events::EDIT_QUESTION);
                with_args(ack, args, |ack, a| self.edit_question(ack, conn_id, a));
            }
            events::REMOVE_QUESTION => {
                let ack = self.ack(conn_id, events::REMOVE_QUESTION);
                with_args(ack, args, |ack, a| self.remove_question(ack, conn_id, a));
            }
            events::KICK_USER => {
                let ack = self.ack(conn_id, events::KICK_USER);
                with_args(ack, args, |ack, a| self.kick_user(ack, conn_id, a));
            }
            events::START_SESSION => {
                let ack = self.ack(conn_id, events::START_SESSION);
                with_args(ack, args, |ack, a| self.start_session(ack, conn_id, a));
            }
            events::END_SESSION => {
                let ack = self.ack(conn_id, events::END_SESSION);
                with_args(ack, args, |ack, a| self.end_session(ack, conn_id, a));
            }
            events::NEXT_QUESTION => {
                let ack = self.ack(conn_id, events::NEXT_QUESTION);
                with_args(ack, args, |ack, a| {
                    Self::next_question(&self, ack, conn_id, a)
                });
            }
            events::QUESTION_RESPONSE => {
                let ack = self.ack(conn_id, events::QUESTION_RESPONSE);
                with_args(ack, args, |ack, a| self.question_response(ack, conn_id, a));
            }
            events::END_QUESTION => {
                let ack = self.ack(conn_id, events::END_QUESTION);
                with_args(ack, args, |ack, a| self.end_question(ack, conn_id, a));
            }
            events::SUBMIT_FEEDBACK => {
                let ack = self.ack(conn_id, events::SUBMIT_FEEDBACK);
                with_args(ack, args, |ack, a| self.submit_feedback(ack, conn_id, a));
            }
            events::SEND_HINT => {
                let ack = self.ack(conn_id, events::SEND_HINT);
                with_args(ack, args, |ack, a| self.send_hint(ack, conn_id, a));
            }
            other => {
                tracing::warn!(conn = conn_id, event = other, "unknown event");
                self.hub.emit_to_one(conn_id, Envelope::fail_empty(other));
            }
        }
    }

    fn ack(&self, conn_id: &str, event: &'static str) -> AckSink {
        AckSink::new(Arc::clone(&self.hub), conn_id, event)
    }

    fn create_session(&self, ack: AckSink, conn_id: &str) {
        let mut sessions = self.sessions.lock();
        let code = generate_session_code(&sessions);
        sessions.insert(code.clone(), Session::new(code.clone(), conn_id.to_string()));

        self.hub.join_room(conn_id, &code);
        SESSIONS_TOTAL.with_label_values(&["created"]).inc();
        SESSIONS_ACTIVE.inc();
        tracing::info!(session = %code, owner = conn_id, "session created");

        ack.ok(&code, json!(code));
    }

    fn join_session(&self, ack: AckSink, conn_id: &str, args: JoinSessionArgs) {
        let mut sessions = self.sessions.lock();
        let Some(session) = args.id.as_deref().and_then(|id| sessions.get_mut(id)) else {
            return ack.fail(vec![ErrorDescriptor::new("session", opt_str(&args.id))]);
        };
        let Some(name) = args.name else {
            return ack.fail(vec![ErrorDescriptor::new("name", Value::Null)]);
        };

        let user = User {
            name: name.clone(),
            id: conn_id.to_string(),
        };
        if !session.add_user(user) {
            return ack.fail(vec![ErrorDescriptor::new("name", name)]);
        }

        let session_id = session.id.clone();
        self.hub.join_room(conn_id, &session_id);
        tracing::info!(session = %session_id, user = %name, "user joined");

        ack.ok(&session_id, Value::Null);
        self.hub.emit_to_room_except(
            &session_id,
            conn_id,
            Envelope::ok(events::USER_JOINED, Some(&session_id), json!({ "name": name })),
        );
    }

    fn add_question(&self, ack: AckSink, conn_id: &str, args: AddQuestionArgs) {
        let mut sessions = self.sessions.lock();
        let session = match owned_session(&mut sessions, &args.session, conn_id) {
            Ok(session) => session,
            Err(errors) => return ack.fail(errors),
        };
        let Some(submission) = args.question else {
            return ack.fail(vec![ErrorDescriptor::new("question", Value::Null)]);
        };

        let question = match submission_parser::parse_question(&submission) {
            Ok(question) => question,
            Err(errors) => return ack.fail(errors),
        };

        let index = session.quiz.add_question(question);
        let session_id = session.id.clone();
        tracing::info!(session = %session_id, index, "question added");
        ack.ok(&session_id, Value::Null);
    }

    fn edit_question(&self, ack: AckSink, conn_id: &str, args: EditQuestionArgs) {
        let mut sessions = self.sessions.lock();
        let session = match owned_session(&mut sessions, &args.session, conn_id) {
            Ok(session) => session,
            Err(errors) => return ack.fail(errors),
        };
        let Some(index) = args.index else {
            return ack.fail(vec![ErrorDescriptor::new("index", Value::Null)]);
        };
        if session.is_started && index == session.quiz.current_index() {
            return ack.fail(vec![ErrorDescriptor::new("index", index)]);
        }
        let Some(submission) = args.question else {
            return ack.fail(vec![ErrorDescriptor::new("question", Value::Null)]);
        };

        let replacement = match submission_parser::parse_question(&submission) {
            Ok(question) => question,
            Err(errors) => return ack.fail(errors),
        };

        if !session.quiz.replace_question(index, replacement) {
            return ack.fail(vec![ErrorDescriptor::new("index", index)]);
        }
        let session_id = session.id.clone();
        tracing::info!(session = %session_id, index, "question replaced");
        ack.ok(&session_id, Value::Null);
    }

    fn remove_question(&self, ack: AckSink, conn_id: &str, args: RemoveQuestionArgs) {
        let mut sessions = self.sessions.lock();
        let session = match owned_session(&mut sessions, &args.session, conn_id) {
            Ok(session) => session,
            Err(errors) => return ack.fail(errors),
        };
        let Some(index) = args.index else {
            return ack.fail(vec![ErrorDescriptor::new("index", Value::Null)]);
        };
        if session.is_started && index == session.quiz.current_index() {
            return ack.fail(vec![ErrorDescriptor::new("index", index)]);
        }
        if session.quiz.remove_question(index).is_none() {
            return ack.fail(vec![ErrorDescriptor::new("index", index)]);
        }
        let session_id = session.id.clone();
        tracing::info!(session = %session_id, index, "question removed");
        ack.ok(&session_id, Value::Null);
    }

    fn kick_user(&self, ack: AckSink, conn_id: &str, args: KickUserArgs) {
        let mut sessions = self.sessions.lock();
        let session = match owned_session(&mut sessions, &args.session, conn_id) {
            Ok(session) => session,
            Err(errors) => return ack.fail(errors),
        };
        let Some(name) = args.name else {
            return ack.fail(vec![ErrorDescriptor::new("name", Value::Null)]);
        };
        let Some(user) = session.remove_user(&name) else {
            return ack.fail(vec![ErrorDescriptor::new("name", name)]);
        };

        let session_id = session.id.clone();
        tracing::info!(session = %session_id, user = %name, "user kicked");

        ack.ok(&session_id, json!({ "name": name }));
        self.hub.emit_to_room_except(
            &session_id,
            conn_id,
            Envelope::ok(events::USER_KICKED, Some(&session_id), json!({ "name": name })),
        );
        self.hub.force_id_to_leave(&user.id, &session_id);
    }

    fn start_session(&self, ack: AckSink, conn_id: &str, args: SessionArgs) {
        let mut sessions = self.sessions.lock();
        let session = match owned_session(&mut sessions, &args.session, conn_id) {
            Ok(session) => session,
            Err(errors) => return ack.fail(errors),
        };
        if !session.start() {
            return ack.fail_state();
        }

        let session_id = session.id.clone();
        tracing::info!(session = %session_id, "session started");

        ack.ok(&session_id, Value::Null);
        self.hub.emit_to_room_except(
            &session_id,
            conn_id,
            Envelope::ok(events::SESSION_STARTED, Some(&session_id), Value::Null),
        );
    }

    fn end_session(&self, ack: AckSink, conn_id: &str, args: SessionArgs) {
        let mut sessions = self.sessions.lock();
        let session = match owned_session(&mut sessions, &args.session, conn_id) {
            Ok(session) => session,
            Err(errors) => return ack.fail(errors),
        };
        if !session.end() {
            return ack.fail_state();
        }

        SESSIONS_TOTAL.with_label_values(&["ended"]).inc();
        SESSIONS_ACTIVE.dec();

        let terminal = session.quiz.snapshot();
        let session_id = session.id.clone();
        let participants: Vec<String> = session.user_conn_ids().map(str::to_string).collect();
        let age_secs = (chrono::Utc::now() - session.created_at).num_seconds();
        tracing::info!(
            session = %session_id,
            questions = terminal.num_questions(),
            users = participants.len(),
            age_secs,
            "session ended"
        );

        ack.ok(&session_id, Value::Null);
        self.hub.emit_to_room_except(
            &session_id,
            conn_id,
            Envelope::ok(events::SESSION_ENDED, Some(&session_id), Value::Null),
        );
        // The owner stays in the room to read terminal state.
        for participant in participants {
            self.hub.force_id_to_leave(&participant, &session_id);
        }
    }

    fn next_question(
        controller: &Arc<SessionController>,
        ack: AckSink,
        conn_id: &str,
        args: SessionArgs,
    ) {
        let mut sessions = controller.sessions.lock();
        let session = match owned_session(&mut sessions, &args.session, conn_id) {
            Ok(session) => session,
            Err(errors) => return ack.fail(errors),
        };
        if !session.is_started || session.has_ended {
            return ack.fail_state();
        }

        let session_id = session.id.clone();
        let num_questions = session.quiz.num_questions();
        let current = session.quiz.current_index();
        let Some(question) = session.quiz.advance_to_next_question() else {
            return ack.fail(vec![
                ErrorDescriptor::new("numQuestions", num_questions),
                ErrorDescriptor::new("currentQuestion", current),
            ]);
        };

        // Arm the one-shot expiry against the committed index; the
        // fired task re-checks terminal state under the lock.
        let index = question.index;
        let time_limit = question.time_limit;
        let timer_controller = Arc::clone(controller);
        let timer_session = session_id.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(time_limit)).await;
            timer_controller.on_question_expired(&timer_session, index);
        });
        question.arm_timer(task.abort_handle());

        let payload = json!({
            "index": index,
            "question": QuestionData::of(question),
        });
        tracing::info!(session = %session_id, index, "question revealed");

        ack.ok(&session_id, payload.clone());
        controller.hub.emit_to_room_except(
            &session_id,
            conn_id,
            Envelope::ok(events::NEXT_QUESTION, Some(&session_id), payload),
        );
    }

    /// Timer-driven question end. A no-op when the question was already
    /// ended manually or the session is gone.
    fn on_question_expired(&self, session_id: &str, index: i64) {
        let mut sessions = self.sessions.lock();
        let Some(session) = sessions.get_mut(session_id) else {
            return;
        };
        let Some(question) = session.quiz.question_at_mut(index) else {
            return;
        };
        if !question.end() {
            return;
        }

        tracing::info!(session = %session_id, index, "question expired");
        self.hub.emit_to_room(
            session_id,
            Envelope::ok(
                events::QUESTION_ENDED,
                Some(session_id),
                json!({ "question": index }),
            ),
        );
    }

    fn question_response(&self, ack: AckSink, conn_id: &str, args: QuestionResponseArgs) {
        let mut sessions = self.sessions.lock();
        let Some(session) = args.session.as_deref().and_then(|id| sessions.get_mut(id)) else {
            return ack.fail(vec![ErrorDescriptor::new("session", opt_str(&args.session))]);
        };
        let Some(name) = args.name else {
            return ack.fail(vec![ErrorDescriptor::new("name", Value::Null)]);
        };
        match session.find_user_by_name(&name) {
            Some(user) if user.id == conn_id => {}
            _ => return ack.fail(vec![ErrorDescriptor::new("name", name)]),
        }

        let current_index = session.quiz.current_index();
        let session_id = session.id.clone();
        let owner = session.owner.clone();
        let Some(question) = session.quiz.current_question_mut() else {
            return ack.fail_state();
        };
        let Some(index) = args.index else {
            return ack.fail(vec![ErrorDescriptor::new("index", Value::Null)]);
        };
        if index != current_index {
            return ack.fail(vec![ErrorDescriptor::new("index", index)]);
        }

        let Some(raw) = args.response else {
            return ack.fail(vec![ErrorDescriptor::new("response", Value::Null)]);
        };
        let Ok(mut response) = serde_json::from_value::<Response>(raw) else {
            return ack.fail(vec![ErrorDescriptor::new("response", Value::Null)]);
        };
        // The validated identity wins over whatever the payload claims.
        response.submitter = name.clone();
        let probe = response.clone();

        let points = match question.add_response(response) {
            Ok(points) => points,
            Err(reason) => {
                let value = match reason {
                    ResponseError::Duplicate => Value::from("duplicate"),
                    ResponseError::NotStarted | ResponseError::Ended => Value::Null,
                };
                return ack.fail(vec![ErrorDescriptor::new("response", value)]);
            }
        };

        let frequency = question.frequency_of(&probe);
        let relative_frequency = question.relative_frequency_of(&probe);
        let first_correct = question.first_correct.clone();
        RESPONSES_SUBMITTED_TOTAL
            .with_label_values(&[if points > 0 { "true" } else { "false" }])
            .inc();
        tracing::info!(session = %session_id, user = %name, index, points, "response recorded");

        ack.ok(
            &session_id,
            json!({
                "index": index,
                "firstCorrect": first_correct.as_deref() == Some(name.as_str()),
                "points": points,
            }),
        );
        self.hub.emit_to_one(
            &owner,
            Envelope::ok(
                events::QUESTION_RESPONSE_ADDED,
                Some(&session_id),
                json!({
                    "index": index,
                    "user": name,
                    "response": probe.as_wire_string(),
                    "points": points,
                    "firstCorrect": first_correct.unwrap_or_default(),
                    "frequency": frequency,
                    "relativeFrequency": relative_frequency,
                }),
            ),
        );
    }

    fn end_question(&self, ack: AckSink, conn_id: &str, args: EndQuestionArgs) {
        let mut sessions = self.sessions.lock();
        let session = match owned_session(&mut sessions, &args.session, conn_id) {
            Ok(session) => session,
            Err(errors) => return ack.fail(errors),
        };
        if !session.is_started || session.has_ended {
            return ack.fail_state();
        }
        let current_index = session.quiz.current_index();
        let session_id = session.id.clone();
        let Some(question) = session.quiz.current_question_mut() else {
            return ack.fail_state();
        };
        let Some(index) = args.question else {
            return ack.fail(vec![ErrorDescriptor::new("question", Value::Null)]);
        };
        if index != current_index {
            return ack.fail(vec![ErrorDescriptor::new("question", index)]);
        }
        if !question.end() {
            // The timer beat us to it; a second end is a state error.
            return ack.fail_state();
        }

        tracing::info!(session = %session_id, index, "question ended");
        ack.ok(&session_id, Value::Null);
        self.hub.emit_to_room_except(
            &session_id,
            conn_id,
            Envelope::ok(
                events::QUESTION_ENDED,
                Some(&session_id),
                json!({ "question": index }),
            ),
        );
    }

    fn submit_feedback(&self, ack: AckSink, conn_id: &str, args: SubmitFeedbackArgs) {
        let mut sessions = self.sessions.lock();
        let Some(session) = args.session.as_deref().and_then(|id| sessions.get_mut(id)) else {
            return ack.fail(vec![ErrorDescriptor::new("session", opt_str(&args.session))]);
        };
        let Some(name) = args.name else {
            return ack.fail(vec![ErrorDescriptor::new("name", Value::Null)]);
        };
        match session.find_user_by_name(&name) {
            Some(user) if user.id == conn_id => {}
            _ => return ack.fail(vec![ErrorDescriptor::new("name", name)]),
        }

        // Feedback is open for any question already revealed.
        let current_index = session.quiz.current_index();
        let question_index = match args.question {
            Some(index) if index >= 0 && index <= current_index => index,
            Some(index) => return ack.fail(vec![ErrorDescriptor::new("question", index)]),
            None => return ack.fail(vec![ErrorDescriptor::new("question", Value::Null)]),
        };

        let Some(submission) = args.feedback else {
            return ack.fail(vec![ErrorDescriptor::new("feedback", Value::Null)]);
        };
        let feedback = match Feedback::parse(&submission) {
            Ok(feedback) => feedback,
            Err(errors) => return ack.fail(errors),
        };

        let session_id = session.id.clone();
        let owner = session.owner.clone();
        let Some(question) = session.quiz.question_at_mut(question_index) else {
            return ack.fail(vec![ErrorDescriptor::new("question", question_index)]);
        };
        if !question.add_feedback(&name, feedback.clone()) {
            return ack.fail(vec![ErrorDescriptor::new("feedback", "duplicate")]);
        }

        tracing::info!(session = %session_id, user = %name, question = question_index, "feedback submitted");
        ack.ok(&session_id, Value::Null);
        self.hub.emit_to_one(
            &owner,
            Envelope::ok(
                events::FEEDBACK_SUBMITTED,
                Some(&session_id),
                json!({
                    "user": name,
                    "question": question_index,
                    "feedback": feedback,
                }),
            ),
        );
    }

    fn send_hint(&self, ack: AckSink, conn_id: &str, args: SendHintArgs) {
        let mut sessions = self.sessions.lock();
        let session = match owned_session(&mut sessions, &args.session, conn_id) {
            Ok(session) => session,
            Err(errors) => return ack.fail(errors),
        };
        let hint = match args.hint {
            Some(hint) if !hint.is_empty() => hint,
            Some(hint) => return ack.fail(vec![ErrorDescriptor::new("hint", hint)]),
            None => return ack.fail(vec![ErrorDescriptor::new("hint", Value::Null)]),
        };
        if !session.is_started || session.has_ended {
            return ack.fail_state();
        }
        let current_index = session.quiz.current_index();
        let question_index = match args.question {
            Some(index) if index == current_index && index >= 0 => index,
            Some(index) => return ack.fail(vec![ErrorDescriptor::new("question", index)]),
            None => return ack.fail(vec![ErrorDescriptor::new("question", Value::Null)]),
        };

        let session_id = session.id.clone();
        tracing::info!(session = %session_id, question = question_index, "hint sent");

        ack.ok(&session_id, Value::Null);
        self.hub.emit_to_room_except(
            &session_id,
            conn_id,
            Envelope::ok(
                events::HINT_RECEIVED,
                Some(&session_id),
                json!({ "question": question_index, "hint": hint }),
            ),
        );
    }

    /// Transport-reported connection loss. An owner takes their
    /// sessions down with them; a participant is removed from every
    /// session whose room they were in.
    pub fn disconnect(&self, conn_id: &str) {
        let mut sessions = self.sessions.lock();

        let owned: Vec<String> = sessions
            .values()
            .filter(|session| session.owner == conn_id)
            .map(|session| session.id.clone())
            .collect();
        for session_id in owned {
            if let Some(mut session) = sessions.remove(&session_id) {
                let was_ended = session.has_ended;
                session.end();
                if !was_ended {
                    SESSIONS_TOTAL.with_label_values(&["owner_disconnected"]).inc();
                    SESSIONS_ACTIVE.dec();
                }
                tracing::info!(session = %session_id, "owner disconnected, session ended");
                self.hub.emit_to_room_except(
                    &session_id,
                    conn_id,
                    Envelope::ok(events::SESSION_ENDED, Some(&session_id), Value::Null),
                );
                self.hub.force_all_in_room_to_leave(&session_id);
            }
        }

        for room in self.hub.rooms_of(conn_id) {
            let Some(session) = sessions.get_mut(&room) else {
                continue;
            };
            let Some(user) = session.find_user_by_id(conn_id) else {
                continue;
            };
            let name = user.name.clone();
            if session.remove_user(&name).is_some() {
                tracing::info!(session = %room, user = %name, "participant disconnected");
                self.hub.emit_to_room_except(
                    &room,
                    conn_id,
                    Envelope::ok(
                        events::USER_DISCONNECTED,
                        Some(&room),
                        json!({ "name": name }),
                    ),
                );
            }
        }
    }
}

fn with_args<T: DeserializeOwned>(ack: AckSink, args: Option<Value>, run: impl FnOnce(AckSink, T)) {
    match args.and_then(|value| serde_json::from_value::<T>(value).ok()) {
        Some(decoded) => run(ack, decoded),
        None => ack.missing_args(),
    }
}

/// Owner authorization shared by every owner-only operation: the
/// session must exist and be owned by the calling connection. An
/// unknown id is echoed back; a foreign session is not named.
fn owned_session<'a>(
    sessions: &'a mut HashMap<String, Session>,
    session_arg: &Option<String>,
    conn_id: &str,
) -> Result<&'a mut Session, Vec<ErrorDescriptor>> {
    let Some(id) = session_arg.as_deref() else {
        return Err(vec![ErrorDescriptor::new("session", Value::Null)]);
    };
    let Some(session) = sessions.get_mut(id) else {
        return Err(vec![ErrorDescriptor::new("session", id)]);
    };
    if session.owner != conn_id {
        return Err(vec![ErrorDescriptor::new("session", Value::Null)]);
    }
    Ok(session)
}

fn opt_str(value: &Option<String>) -> Value {
    value.as_deref().map(Value::from).unwrap_or(Value::Null)
}

fn generate_session_code(existing: &HashMap<String, Session>) -> String {
    let mut rng = rand::rng();
    loop {
        let code: String = (0..SESSION_CODE_LEN)
            .map(|_| SESSION_CODE_CHARSET[rng.random_range(0..SESSION_CODE_CHARSET.len())] as char)
            .collect();
        if !existing.contains_key(&code) {
            return code;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_codes_are_eight_chars_of_digits_and_uppercase() {
        let existing = HashMap::new();
        for _ in 0..50 {
            let code = generate_session_code(&existing);
            assert_eq!(code.len(), 8);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }
}
