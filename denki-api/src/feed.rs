use crate::{Comment, Error};

/// One delivery from a live query. The store pushes a full snapshot of every
/// matching document on each change; there is no incremental patch format.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub enum FeedMessage {
    Snapshot(Vec<Comment>),
    Error(Error),
}
