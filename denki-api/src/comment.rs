use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use crate::{Error, PostId, Session, Time, UserId, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

/// Which of a comment's two reaction sets an action targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ReactionKind {
    Likes,
    Hearts,
}

/// Per-comment reaction state. Membership implies "this user reacted";
/// the set type keeps each user in a set at most once.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Reactions {
    pub likes: HashSet<UserId>,
    pub hearts: HashSet<UserId>,
}

impl Reactions {
    pub fn new() -> Reactions {
        Reactions::default()
    }

    pub fn set(&self, kind: ReactionKind) -> &HashSet<UserId> {
        match kind {
            ReactionKind::Likes => &self.likes,
            ReactionKind::Hearts => &self.hearts,
        }
    }

    fn set_mut(&mut self, kind: ReactionKind) -> &mut HashSet<UserId> {
        match kind {
            ReactionKind::Likes => &mut self.likes,
            ReactionKind::Hearts => &mut self.hearts,
        }
    }

    pub fn contains(&self, kind: ReactionKind, user: &UserId) -> bool {
        self.set(kind).contains(user)
    }

    pub fn count(&self, kind: ReactionKind) -> usize {
        self.set(kind).len()
    }

    /// The state after flipping `user`'s membership in one set. The result is
    /// written back to the store whole, so concurrent togglers race and the
    /// last write wins.
    pub fn toggled(&self, kind: ReactionKind, user: UserId) -> Reactions {
        let mut res = self.clone();
        let set = res.set_mut(kind);
        if !set.remove(&user) {
            set.insert(user);
        }
        res
    }
}

/// Denormalized author snapshot taken at posting time. Later profile edits do
/// not rewrite existing comments.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// One document in the `comments` collection.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,

    /// `None` for a top-level comment. A reply's parent always names a
    /// top-level comment; replies are exactly one level deep.
    pub parent_id: Option<CommentId>,

    pub author: Author,
    pub content: String,

    pub created_at: Time,
    pub edited_at: Option<Time>,

    pub reactions: Reactions,
}

/// Comment shape before the store has assigned an id.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub author: Author,
    pub content: String,
    pub created_at: Time,
    pub reactions: Reactions,
}

impl NewComment {
    /// Stamps the creation time and takes the author snapshot from the
    /// current session. Reactions start out empty.
    pub fn now(
        session: &Session,
        post_id: PostId,
        parent_id: Option<CommentId>,
        content: String,
    ) -> NewComment {
        NewComment {
            post_id,
            parent_id,
            author: session.author(),
            content,
            created_at: Utc::now(),
            reactions: Reactions::new(),
        }
    }

    // See comments on the other `validate` functions throughout denki-api
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.content)
    }

    /// Attach the store-assigned id, yielding the persisted document shape.
    pub fn into_comment(self, id: CommentId) -> Comment {
        Comment {
            id,
            post_id: self.post_id,
            parent_id: self.parent_id,
            author: self.author,
            content: self.content,
            created_at: self.created_at,
            edited_at: None,
            reactions: self.reactions,
        }
    }
}
