use std::cmp::Reverse;
use std::collections::HashMap;

use crate::api::{Comment, CommentId};

/// A top-level comment with its replies, newest first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Thread {
    pub root: Comment,
    pub replies: Vec<Comment>,
}

// Slot being assembled for one top-level id. `root` stays `None` while only
// replies have been seen for it.
#[derive(Default)]
struct Slot {
    root: Option<Comment>,
    replies: Vec<Comment>,
}

/// Rebuilds the thread forest from one flat snapshot.
///
/// Runs in full on every delivery: the feed gives no ordering guarantee, so a
/// reply can be observed before its top-level parent within the same snapshot.
/// Replies are held in a placeholder slot until the root record arrives; a
/// slot that never receives its root (the orphan case, e.g. after a parent
/// deletion) is filtered out. Re-deriving from the complete set keeps the
/// reconstruction idempotent.
pub fn build_threads(comments: &[Comment]) -> Vec<Thread> {
    let mut slots: HashMap<CommentId, Slot> = HashMap::new();
    for c in comments {
        match c.parent_id {
            None => {
                let slot = slots.entry(c.id).or_default();
                if slot.root.is_some() {
                    tracing::warn!(id = ?c.id, "snapshot contains a duplicate top-level comment");
                }
                slot.root = Some(c.clone());
            }
            Some(parent) => slots.entry(parent).or_default().replies.push(c.clone()),
        }
    }

    let mut threads: Vec<Thread> = slots
        .into_values()
        .filter_map(|slot| {
            slot.root.map(|root| Thread {
                root,
                replies: slot.replies,
            })
        })
        .collect();
    for t in &mut threads {
        t.replies
            .sort_unstable_by_key(|c| (Reverse(c.created_at), c.id));
    }
    threads.sort_unstable_by_key(|t| (Reverse(t.root.created_at), t.root.id));
    threads
}

/// Finds a comment anywhere in the forest, roots and replies alike.
pub fn find_comment(threads: &[Thread], id: CommentId) -> Option<&Comment> {
    for t in threads {
        if t.root.id == id {
            return Some(&t.root);
        }
        if let Some(c) = t.replies.iter().find(|c| c.id == id) {
            return Some(c);
        }
    }
    None
}
