use serde::{Deserialize, Serialize};

pub mod feedback;
pub mod question;
pub mod quiz;
pub mod response;
pub mod session;
pub mod wire;

/// A joined participant: display name plus the connection it arrived
/// on. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub id: String,
}
