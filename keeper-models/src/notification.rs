use serde::{Deserialize, Serialize};

/// Change signal pushed to the other live connections of a user after a save.
///
/// It carries no secret content; receivers re-fetch the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    pub secret_id: i64,
    pub was_update: bool,
}
