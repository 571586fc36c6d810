use crate::{Author, UserId};

/// Snapshot of the signed-in user, as exposed by the authentication session.
/// Callers re-read this from the session context before every authenticated
/// action rather than caching it across awaits.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Session {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Session {
    pub fn stub() -> Session {
        Session {
            user_id: UserId::stub(),
            display_name: String::from("stub"),
            avatar_url: None,
        }
    }

    /// The denormalized author snapshot stored on comments posted under this
    /// session. An empty display name falls back to "Anonymous".
    pub fn author(&self) -> Author {
        let name = match self.display_name.trim() {
            "" => String::from("Anonymous"),
            name => name.to_string(),
        };
        Author {
            id: self.user_id,
            name,
            avatar_url: self.avatar_url.clone(),
        }
    }
}
