mod comment;
pub use comment::{Author, Comment, CommentId, NewComment, ReactionKind, Reactions};

mod error;
pub use error::Error;

mod feed;
pub use feed::FeedMessage;

mod post;
pub use post::{to_slug, Post, PostId, PostStatus};

mod session;
pub use session::Session;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<chrono::Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

// See comments on the other `validate` functions throughout denki-api
pub fn validate_content(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(s.to_string()));
    }
    if s.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(())
}
