mod live;
pub use live::{LiveComments, SyncState, ThreadView, MAX_RETRIES, RETRY_DELAY};

mod markup;
pub use markup::render_markup;

mod mutation;
pub use mutation::{Mutation, MutationId, MutationLedger, MutationState};

mod reaction;
pub use reaction::toggle_reaction;

mod session;
pub use session::{toggle_post_like, MemoryCache, SessionCache, SessionContext};

mod store;
pub use store::{query_ordered, CommentFeed, CommentQuery, CommentStore, PostStore, SortOrder};

mod submit;
pub use submit::{delete_comment, edit_comment, submit_comment, submit_reply};

mod thread;
pub use thread::{build_threads, find_comment, Thread};

pub mod api {
    pub use denki_api::*;
}
