use chrono::Utc;

use crate::api::{validate_content, CommentId, Error, NewComment, PostId, Session, Time};
use crate::{find_comment, CommentStore, Thread};

/// Posts a top-level comment. Content is validated locally; an empty draft
/// never leaves the client.
pub async fn submit_comment<S>(
    store: &S,
    session: Option<&Session>,
    post_id: PostId,
    content: &str,
) -> Result<CommentId, Error>
where
    S: CommentStore + ?Sized,
{
    let session = session.ok_or(Error::Unauthenticated)?;
    let content = content.trim();
    validate_content(content)?;
    store
        .create_comment(NewComment::now(session, post_id, None, content.to_string()))
        .await
}

/// Posts a reply under `parent`, which must be a known top-level comment:
/// threads are at most two levels deep, so replying to a reply is rejected
/// before any store call.
pub async fn submit_reply<S>(
    store: &S,
    session: Option<&Session>,
    threads: &[Thread],
    parent: CommentId,
    content: &str,
) -> Result<CommentId, Error>
where
    S: CommentStore + ?Sized,
{
    let session = session.ok_or(Error::Unauthenticated)?;
    let content = content.trim();
    validate_content(content)?;
    let parent_comment = find_comment(threads, parent).ok_or(Error::BadParent(parent))?;
    if parent_comment.parent_id.is_some() {
        return Err(Error::BadParent(parent));
    }
    store
        .create_comment(NewComment::now(
            session,
            parent_comment.post_id,
            Some(parent),
            content.to_string(),
        ))
        .await
}

/// Content-only edit by the comment's author; stamps `edited_at` and returns
/// the stamp for the caller's mutation ledger.
pub async fn edit_comment<S>(
    store: &S,
    session: Option<&Session>,
    threads: &[Thread],
    comment: CommentId,
    content: &str,
) -> Result<Time, Error>
where
    S: CommentStore + ?Sized,
{
    let session = session.ok_or(Error::Unauthenticated)?;
    let content = content.trim();
    validate_content(content)?;
    let current = find_comment(threads, comment).ok_or(Error::UnknownComment(comment))?;
    if current.author.id != session.user_id {
        return Err(Error::PermissionDenied);
    }
    let edited_at = Utc::now();
    store
        .edit_comment(comment, content.to_string(), edited_at)
        .await?;
    Ok(edited_at)
}

/// Deletes the author's own comment. No cascade: replies stay in the
/// collection and drop out of reconstruction as orphans.
pub async fn delete_comment<S>(
    store: &S,
    session: Option<&Session>,
    threads: &[Thread],
    comment: CommentId,
) -> Result<(), Error>
where
    S: CommentStore + ?Sized,
{
    let session = session.ok_or(Error::Unauthenticated)?;
    let current = find_comment(threads, comment).ok_or(Error::UnknownComment(comment))?;
    if current.author.id != session.user_id {
        return Err(Error::PermissionDenied);
    }
    store.delete_comment(comment).await
}
