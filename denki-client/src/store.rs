use std::cmp::Reverse;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::api::{
    Comment, CommentId, Error, FeedMessage, NewComment, Post, PostId, Reactions, Time,
};

/// Sort direction for the `created_at` ordering.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query against the `comments` collection: equality on `post_id`, plus an
/// optional `created_at` ordering. The ordered form needs a compound index on
/// the store side; the unordered form never does.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommentQuery {
    pub post_id: PostId,
    pub order_by_created: Option<SortOrder>,
}

impl CommentQuery {
    pub fn newest_first(post_id: PostId) -> CommentQuery {
        CommentQuery {
            post_id,
            order_by_created: Some(SortOrder::Desc),
        }
    }

    pub fn unordered(post_id: PostId) -> CommentQuery {
        CommentQuery {
            post_id,
            order_by_created: None,
        }
    }
}

/// Live feed handle; messages keep arriving until the receiver is dropped.
pub type CommentFeed = mpsc::UnboundedReceiver<FeedMessage>;

/// The `comments` collection as exposed by the store SDK.
#[async_trait]
pub trait CommentStore {
    async fn query_comments(&self, q: &CommentQuery) -> Result<Vec<Comment>, Error>;

    /// Opens a live query. The store pushes an initial snapshot right away,
    /// then a fresh snapshot on every change to the matching set.
    async fn subscribe_comments(&self, q: &CommentQuery) -> Result<CommentFeed, Error>;

    /// The store assigns the id.
    async fn create_comment(&self, c: NewComment) -> Result<CommentId, Error>;

    /// Content-only update; no other field is rewritten after creation.
    async fn edit_comment(
        &self,
        id: CommentId,
        content: String,
        edited_at: Time,
    ) -> Result<(), Error>;

    /// No cascade: replies to a deleted comment stay in the collection and
    /// drop out of the reconstructed forest.
    async fn delete_comment(&self, id: CommentId) -> Result<(), Error>;

    /// Whole-set write, not an atomic membership update. See the race note
    /// on `toggle_reaction`.
    async fn set_reactions(&self, id: CommentId, reactions: Reactions) -> Result<(), Error>;
}

/// The `blogs` collection, read by the core for display context next to a
/// comment thread. The counter writes come from the public pages.
#[async_trait]
pub trait PostStore {
    async fn fetch_post(&self, id: PostId) -> Result<Post, Error>;

    async fn record_view(&self, id: PostId) -> Result<(), Error>;

    /// Moves the like counter one step in either direction. The caller keeps
    /// one browser from counting twice; see `SessionContext::toggle_post_liked`.
    async fn set_post_liked(&self, id: PostId, liked: bool) -> Result<(), Error>;
}

/// Newest-first comment fetch. When the store lacks the compound index for
/// the ordered query it reports `MissingIndex`; this falls back to the
/// unindexed query and sorts in memory, invisibly to the caller.
pub async fn query_ordered<S>(store: &S, post_id: PostId) -> Result<Vec<Comment>, Error>
where
    S: CommentStore + ?Sized,
{
    match store
        .query_comments(&CommentQuery::newest_first(post_id))
        .await
    {
        Err(Error::MissingIndex) => {
            tracing::debug!(?post_id, "ordered comment query has no index, sorting in memory");
            let mut comments = store
                .query_comments(&CommentQuery::unordered(post_id))
                .await?;
            comments.sort_unstable_by_key(|c| (Reverse(c.created_at), c.id));
            Ok(comments)
        }
        res => res,
    }
}
