use crate::{CommentId, PostId};

/// Client-observable error taxonomy. Variants carry enough to decide whether
/// the live view retries (`is_transient`) or surfaces the failure as final.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Query requires an index the store does not have")]
    MissingIndex,

    #[error("Transient fetch failure: {0}")]
    Transient(String),

    #[error("Comment content must not be empty")]
    EmptyContent,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Comment {0:?} is not in the local state")]
    UnknownComment(CommentId),

    #[error("Post {0:?} not found")]
    UnknownPost(PostId),

    #[error("Comment {0:?} is not a top-level comment")]
    BadParent(CommentId),
}

impl Error {
    /// Whether the fixed retry policy applies. Everything outside the
    /// explicit taxonomy retries; denials and local validation never do.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Unknown(_) | Error::Transient(_))
    }

    /// The store SDK's error-code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unknown(_) => "unknown",
            Error::Unauthenticated => "unauthenticated",
            Error::PermissionDenied => "permission-denied",
            Error::MissingIndex => "failed-precondition",
            Error::Transient(_) => "unavailable",
            Error::EmptyContent | Error::NullByteInString(_) | Error::BadParent(_) => {
                "invalid-argument"
            }
            Error::UnknownComment(_) | Error::UnknownPost(_) => "not-found",
        }
    }

    /// Classify an error reported by the store SDK. A failed-precondition
    /// only means a missing index when the message says so, matching the
    /// SDK's reporting.
    pub fn from_code(code: &str, message: &str) -> Error {
        match code {
            "unauthenticated" => Error::Unauthenticated,
            "permission-denied" => Error::PermissionDenied,
            "failed-precondition" if message.contains("index") => Error::MissingIndex,
            "unavailable" => Error::Transient(message.to_string()),
            _ => Error::Unknown(format!("{code}: {message}")),
        }
    }
}
