use std::collections::VecDeque;

use uuid::Uuid;

use crate::api::{CommentId, Error, Reactions, Time};
use crate::Thread;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MutationId(pub Uuid);

/// A local write shown to the user before the store confirms it. There is no
/// creation variant: a new comment is awaited and arrives through the live
/// snapshot, id already assigned.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Mutation {
    React {
        comment: CommentId,
        reactions: Reactions,
    },
    Edit {
        comment: CommentId,
        content: String,
        edited_at: Time,
    },
    Delete {
        comment: CommentId,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MutationState {
    Pending,
    Confirmed,
    Failed(Error),
}

#[derive(Clone, Debug)]
struct Entry {
    id: MutationId,
    mutation: Mutation,
    state: MutationState,
}

/// Ledger of in-flight optimistic writes.
///
/// Every mutation is recorded before its store write starts and overlays the
/// reconstructed forest until a snapshot reflects it. A failed write's
/// overlay stops applying, which rolls the rendered view back to store truth
/// instead of letting it silently diverge.
#[derive(Clone, Debug, Default)]
pub struct MutationLedger {
    // push_back on begin, drained by prune/take_failures
    entries: VecDeque<Entry>,
}

impl MutationLedger {
    pub fn new() -> MutationLedger {
        MutationLedger::default()
    }

    /// Records a mutation as pending and returns its handle.
    pub fn begin(&mut self, mutation: Mutation) -> MutationId {
        let id = MutationId(Uuid::new_v4());
        self.entries.push_back(Entry {
            id,
            mutation,
            state: MutationState::Pending,
        });
        id
    }

    /// The store write came back ok. The overlay keeps applying until a
    /// snapshot shows the change, so the view never flickers backwards.
    pub fn confirm(&mut self, id: MutationId) {
        self.transition(id, MutationState::Confirmed);
    }

    /// The store write failed; the overlay stops applying.
    pub fn fail(&mut self, id: MutationId, error: Error) {
        self.transition(id, MutationState::Failed(error));
    }

    fn transition(&mut self, id: MutationId, state: MutationState) {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(e) if e.state == MutationState::Pending => e.state = state,
            Some(e) => {
                tracing::warn!(?id, from = ?e.state, to = ?state, "mutation transition out of pending ignored")
            }
            None => tracing::warn!(?id, "transition for a mutation no longer in the ledger"),
        }
    }

    pub fn state(&self, id: MutationId) -> Option<&MutationState> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.state)
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == MutationState::Pending)
            .count()
    }

    /// Removes failed entries and hands them to the caller for surfacing.
    pub fn take_failures(&mut self) -> Vec<(Mutation, Error)> {
        let mut failures = Vec::new();
        self.entries.retain(|e| match &e.state {
            MutationState::Failed(error) => {
                failures.push((e.mutation.clone(), error.clone()));
                false
            }
            _ => true,
        });
        failures
    }

    /// Drops entries the given forest already reflects. Called with each
    /// freshly reconstructed snapshot. Failed entries stay until
    /// `take_failures` collects them.
    pub fn prune(&mut self, threads: &[Thread]) {
        self.entries.retain(|e| {
            matches!(e.state, MutationState::Failed(_)) || !reflected(&e.mutation, threads)
        });
    }

    /// The forest with every live (pending or confirmed) mutation applied.
    pub fn overlay(&self, threads: &[Thread]) -> Vec<Thread> {
        let mut threads = threads.to_vec();
        for e in &self.entries {
            if matches!(e.state, MutationState::Failed(_)) {
                continue;
            }
            apply(&e.mutation, &mut threads);
        }
        threads
    }
}

fn reflected(m: &Mutation, threads: &[Thread]) -> bool {
    match m {
        Mutation::React { comment, reactions } => {
            crate::find_comment(threads, *comment).map(|c| &c.reactions) == Some(reactions)
        }
        Mutation::Edit {
            comment,
            content,
            edited_at,
        } => crate::find_comment(threads, *comment)
            .map(|c| c.content == *content && c.edited_at == Some(*edited_at))
            .unwrap_or(false),
        Mutation::Delete { comment } => crate::find_comment(threads, *comment).is_none(),
    }
}

fn apply(m: &Mutation, threads: &mut Vec<Thread>) {
    match m {
        Mutation::React { comment, reactions } => {
            if let Some(c) = find_comment_mut(threads, *comment) {
                c.reactions = reactions.clone();
            }
        }
        Mutation::Edit {
            comment,
            content,
            edited_at,
        } => {
            if let Some(c) = find_comment_mut(threads, *comment) {
                c.content = content.clone();
                c.edited_at = Some(*edited_at);
            }
        }
        Mutation::Delete { comment } => {
            // deleting a root drops the whole thread, matching what the next
            // snapshot reconstructs once the replies are orphaned
            threads.retain(|t| t.root.id != *comment);
            for t in threads {
                t.replies.retain(|c| c.id != *comment);
            }
        }
    }
}

fn find_comment_mut(threads: &mut [Thread], id: CommentId) -> Option<&mut crate::api::Comment> {
    for t in threads {
        if t.root.id == id {
            return Some(&mut t.root);
        }
        if let Some(c) = t.replies.iter_mut().find(|c| c.id == id) {
            return Some(c);
        }
    }
    None
}
