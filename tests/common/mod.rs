#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use quizroom_api::config::Config;
use quizroom_api::models::wire::{events, Envelope};
use quizroom_api::services::AppState;

/// A fake connection registered straight with the hub: what the
/// WebSocket layer would deliver ends up in `rx` as typed envelopes.
pub struct TestClient {
    pub id: String,
    rx: UnboundedReceiver<Envelope>,
}

impl TestClient {
    /// Next queued frame; panics when none arrived.
    pub fn recv(&mut self) -> Envelope {
        self.rx.try_recv().expect("expected a frame for this client")
    }

    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    pub fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();

        Self {
            state: Arc::new(AppState::new(Config::default())),
        }
    }

    pub fn connect(&self, id: &str) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.hub.register(id, tx);
        TestClient {
            id: id.to_string(),
            rx,
        }
    }

    pub fn emit(&self, client: &TestClient, event: &str, args: Value) {
        Arc::clone(&self.state.controller).dispatch(&client.id, event, Some(args));
    }

    pub fn emit_no_args(&self, client: &TestClient, event: &str) {
        Arc::clone(&self.state.controller).dispatch(&client.id, event, None);
    }

    /// Transport-level connection loss, in the order the socket task
    /// performs it.
    pub fn drop_connection(&self, client: &TestClient) {
        self.state.controller.disconnect(&client.id);
        self.state.hub.unregister(&client.id);
    }

    // Flow shortcuts used by most scenarios.

    pub fn create_session(&self, owner: &mut TestClient) -> String {
        self.emit_no_args(owner, events::CREATE_SESSION);
        let ack = owner.recv();
        assert_eq!(ack.status, 200, "create session should succeed");
        ack.data
            .and_then(|data| data.as_str().map(str::to_string))
            .expect("created session ack carries the code")
    }

    pub fn join(&self, client: &mut TestClient, session: &str, name: &str) -> Envelope {
        self.emit(
            client,
            events::JOIN_SESSION,
            json!({ "id": session, "name": name }),
        );
        client.recv()
    }

    pub fn add_choice_question(&self, owner: &mut TestClient, session: &str) -> Envelope {
        self.emit(
            owner,
            events::ADD_QUESTION,
            json!({
                "session": session,
                "question": {
                    "text": "Q",
                    "timeLimit": 60,
                    "body": {
                        "kind": "multiple-choice",
                        "choices": [
                            {"text": "c1", "points": 200},
                            {"text": "c2", "points": 200},
                        ],
                        "answer": 1,
                    },
                },
            }),
        );
        owner.recv()
    }

    pub fn start(&self, owner: &mut TestClient, session: &str) -> Envelope {
        self.emit(owner, events::START_SESSION, json!({ "session": session }));
        owner.recv()
    }

    pub fn next_question(&self, owner: &mut TestClient, session: &str) -> Envelope {
        self.emit(owner, events::NEXT_QUESTION, json!({ "session": session }));
        owner.recv()
    }
}

/// Asserts the standard failure shape: status 400 with a single
/// `{field, value}` descriptor.
pub fn assert_single_error(envelope: &Envelope, field: &str, value: Value) {
    assert_eq!(envelope.status, 400);
    let errors = envelope
        .errors
        .as_ref()
        .expect("failure envelope carries errors");
    assert_eq!(errors, &json!([{ "field": field, "value": value }]));
}
