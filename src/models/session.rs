use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::quiz::Quiz;
use super::User;

/// One live, code-addressed room: an owner connection, a quiz, and the
/// joined participants indexed by name and by connection id. Lifecycle
/// is Created -> Started -> Ended; an ended session only mutates by
/// being dropped from the registry.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub owner: String,
    pub quiz: Quiz,
    pub is_started: bool,
    pub has_ended: bool,
    pub created_at: DateTime<Utc>,
    users_by_name: HashMap<String, User>,
    names_by_conn: HashMap<String, String>,
}

impl Session {
    pub fn new(id: String, owner: String) -> Self {
        Self {
            id,
            owner,
            quiz: Quiz::new(),
            is_started: false,
            has_ended: false,
            created_at: Utc::now(),
            users_by_name: HashMap::new(),
            names_by_conn: HashMap::new(),
        }
    }

    /// Both indices are updated together; the owner can never appear
    /// as a participant, and names/connections are unique within the
    /// session.
    pub fn add_user(&mut self, user: User) -> bool {
        if user.id == self.owner
            || self.is_started
            || self.has_ended
            || self.users_by_name.contains_key(&user.name)
            || self.names_by_conn.contains_key(&user.id)
        {
            return false;
        }
        self.names_by_conn.insert(user.id.clone(), user.name.clone());
        self.users_by_name.insert(user.name.clone(), user);
        true
    }

    /// Removes from both indices, freeing the name for later joins.
    /// Forbidden once the session has ended.
    pub fn remove_user(&mut self, name: &str) -> Option<User> {
        if self.has_ended {
            return None;
        }
        let user = self.users_by_name.remove(name)?;
        self.names_by_conn.remove(&user.id);
        Some(user)
    }

    pub fn find_user_by_name(&self, name: &str) -> Option<&User> {
        self.users_by_name.get(name)
    }

    pub fn find_user_by_id(&self, conn_id: &str) -> Option<&User> {
        self.names_by_conn
            .get(conn_id)
            .and_then(|name| self.users_by_name.get(name))
    }

    pub fn num_users(&self) -> usize {
        self.users_by_name.len()
    }

    pub fn user_conn_ids(&self) -> impl Iterator<Item = &str> {
        self.names_by_conn.keys().map(String::as_str)
    }

    pub fn start(&mut self) -> bool {
        if self.is_started || self.has_ended {
            return false;
        }
        self.is_started = true;
        true
    }

    /// Ends a started session, cascading to the live question so its
    /// timer is cancelled.
    pub fn end(&mut self) -> bool {
        if !self.is_started || self.has_ended {
            return false;
        }
        self.has_ended = true;
        if let Some(question) = self.quiz.current_question_mut() {
            question.end();
        }
        true
    }
}
