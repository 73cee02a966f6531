use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::wire::Envelope;

/// The room-aware side of the transport. Every live connection
/// registers an outbound sender here; sessions address their members
/// through rooms named by session id. All primitives are non-blocking:
/// an envelope dropped on a closed connection is simply discarded.
#[derive(Default)]
pub struct Hub {
    inner: Mutex<HubInner>,
}

#[derive(Default)]
struct HubInner {
    connections: HashMap<String, UnboundedSender<Envelope>>,
    // room -> members, and the reverse index. Updated together.
    rooms: HashMap<String, HashSet<String>>,
    memberships: HashMap<String, HashSet<String>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, conn_id: &str, sender: UnboundedSender<Envelope>) {
        let mut inner = self.inner.lock();
        inner.connections.insert(conn_id.to_string(), sender);
    }

    /// Drops the connection and leaves every room it was in.
    pub fn unregister(&self, conn_id: &str) {
        let mut inner = self.inner.lock();
        inner.connections.remove(conn_id);
        if let Some(rooms) = inner.memberships.remove(conn_id) {
            for room in rooms {
                let emptied = match inner.rooms.get_mut(&room) {
                    Some(members) => {
                        members.remove(conn_id);
                        members.is_empty()
                    }
                    None => false,
                };
                if emptied {
                    inner.rooms.remove(&room);
                }
            }
        }
    }

    pub fn join_room(&self, conn_id: &str, room: &str) {
        let mut inner = self.inner.lock();
        if !inner.connections.contains_key(conn_id) {
            return;
        }
        inner
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn_id.to_string());
        inner
            .memberships
            .entry(conn_id.to_string())
            .or_default()
            .insert(room.to_string());
    }

    pub fn leave_room(&self, conn_id: &str, room: &str) {
        let mut inner = self.inner.lock();
        let emptied = match inner.rooms.get_mut(room) {
            Some(members) => {
                members.remove(conn_id);
                members.is_empty()
            }
            None => false,
        };
        if emptied {
            inner.rooms.remove(room);
        }
        if let Some(rooms) = inner.memberships.get_mut(conn_id) {
            rooms.remove(room);
        }
    }

    pub fn force_id_to_leave(&self, conn_id: &str, room: &str) {
        self.leave_room(conn_id, room);
    }

    pub fn force_all_in_room_to_leave(&self, room: &str) {
        let mut inner = self.inner.lock();
        if let Some(members) = inner.rooms.remove(room) {
            for member in members {
                if let Some(rooms) = inner.memberships.get_mut(&member) {
                    rooms.remove(room);
                }
            }
        }
    }

    pub fn rooms_of(&self, conn_id: &str) -> Vec<String> {
        let inner = self.inner.lock();
        inner
            .memberships
            .get(conn_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.lock().connections.len()
    }

    pub fn emit_to_one(&self, conn_id: &str, envelope: Envelope) {
        let inner = self.inner.lock();
        if let Some(sender) = inner.connections.get(conn_id) {
            if sender.send(envelope).is_err() {
                tracing::debug!("dropped emit to closed connection {}", conn_id);
            }
        }
    }

    pub fn emit_to_room(&self, room: &str, envelope: Envelope) {
        self.emit_internal(room, None, envelope);
    }

    pub fn emit_to_room_except(&self, room: &str, except: &str, envelope: Envelope) {
        self.emit_internal(room, Some(except), envelope);
    }

    fn emit_internal(&self, room: &str, except: Option<&str>, envelope: Envelope) {
        let inner = self.inner.lock();
        let Some(members) = inner.rooms.get(room) else {
            return;
        };
        for member in members {
            if except == Some(member.as_str()) {
                continue;
            }
            if let Some(sender) = inner.connections.get(member) {
                if sender.send(envelope.clone()).is_err() {
                    tracing::debug!("dropped emit to closed connection {}", member);
                }
            }
        }
    }
}
