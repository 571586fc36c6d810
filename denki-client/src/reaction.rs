use crate::api::{CommentId, Error, ReactionKind, Reactions, Session};
use crate::{find_comment, CommentStore, Thread};

/// Flips the acting user's membership in one reaction set of one comment.
///
/// Read-then-write: the current sets come from the last rendered snapshot and
/// the toggled sets are written back whole, so two users toggling the same
/// comment concurrently race and the later write can drop the earlier toggle.
/// The store's write order is the only arbiter.
pub async fn toggle_reaction<S>(
    store: &S,
    session: Option<&Session>,
    threads: &[Thread],
    comment: CommentId,
    kind: ReactionKind,
) -> Result<Reactions, Error>
where
    S: CommentStore + ?Sized,
{
    let session = session.ok_or(Error::Unauthenticated)?;
    let current = find_comment(threads, comment).ok_or(Error::UnknownComment(comment))?;
    let next = current.reactions.toggled(kind, session.user_id);
    store.set_reactions(comment, next.clone()).await?;
    Ok(next)
}
