use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use denki_client::api::{
    Comment, CommentId, Error, FeedMessage, NewComment, Post, PostId, Reactions, Time,
};
use denki_client::{CommentFeed, CommentQuery, CommentStore, PostStore, SortOrder};

/// In-memory stand-in for the hosted document store. Tests drive the client
/// against it; the `test_` helpers inject the failure modes the client has to
/// handle.
pub struct MockStore(Mutex<Inner>);

struct Inner {
    comments: HashMap<CommentId, Comment>,
    posts: HashMap<PostId, Post>,
    feeds: Vec<Feed>,

    // Ordered queries need this "index"; without it they fail the way the
    // real store reports an unindexed compound sort.
    comment_index: bool,

    // Scripted failures, consumed one per comment query/subscribe call.
    fail_next: VecDeque<Error>,

    deny_writes: bool,
}

struct Feed {
    query: CommentQuery,
    sender: mpsc::UnboundedSender<FeedMessage>,
}

impl MockStore {
    pub fn new() -> MockStore {
        MockStore(Mutex::new(Inner {
            comments: HashMap::new(),
            posts: HashMap::new(),
            feeds: Vec::new(),
            comment_index: true,
            fail_next: VecDeque::new(),
            deny_writes: false,
        }))
    }

    /// A store whose `comments` collection lacks the compound index, so every
    /// ordered query reports `MissingIndex`.
    pub fn without_comment_index() -> MockStore {
        let store = MockStore::new();
        store.lock().comment_index = false;
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.0.lock().expect("store lock poisoned")
    }

    pub fn add_post(&self, post: Post) {
        self.lock().posts.insert(post.id, post);
    }

    /// Inserts a document exactly as given, bypassing the write path. Used to
    /// seed states the client cannot produce, such as orphaned replies.
    pub fn insert_raw_comment(&self, c: Comment) {
        let mut inner = self.lock();
        let post = c.post_id;
        inner.comments.insert(c.id, c);
        notify(&mut inner, post);
    }

    pub fn comment(&self, id: CommentId) -> Option<Comment> {
        self.lock().comments.get(&id).cloned()
    }

    /// Scripts the next comment query or subscribe call to fail.
    pub fn test_fail_next(&self, e: Error) {
        self.lock().fail_next.push_back(e);
    }

    /// Makes every write come back `PermissionDenied`, as the store's access
    /// rules would.
    pub fn test_deny_writes(&self, deny: bool) {
        self.lock().deny_writes = deny;
    }

    /// Pushes an error into every open feed for `post`, the way a failing
    /// subscription callback reports one.
    pub fn test_emit_feed_error(&self, post: PostId, e: Error) {
        let inner = self.lock();
        for f in inner.feeds.iter().filter(|f| f.query.post_id == post) {
            let _ = f.sender.send(FeedMessage::Error(e.clone()));
        }
    }

    /// Drops the store side of every feed for `post`, closing the
    /// subscribers' receivers.
    pub fn test_close_feeds(&self, post: PostId) {
        self.lock().feeds.retain(|f| f.query.post_id != post);
    }

    /// Scripted failures not yet consumed by a query or subscribe call.
    pub fn test_pending_failures(&self) -> usize {
        self.lock().fail_next.len()
    }

    /// Open feeds for `post`, dead senders included until the next notify.
    pub fn test_feed_count(&self, post: PostId) -> usize {
        self.lock()
            .feeds
            .iter()
            .filter(|f| f.query.post_id == post)
            .count()
    }
}

impl Default for MockStore {
    fn default() -> MockStore {
        MockStore::new()
    }
}

fn snapshot(inner: &Inner, q: &CommentQuery) -> Vec<Comment> {
    let mut comments: Vec<Comment> = inner
        .comments
        .values()
        .filter(|c| c.post_id == q.post_id)
        .cloned()
        .collect();
    match q.order_by_created {
        Some(SortOrder::Desc) => comments.sort_unstable_by_key(|c| (Reverse(c.created_at), c.id)),
        Some(SortOrder::Asc) => comments.sort_unstable_by_key(|c| (c.created_at, c.id)),
        // hash-map iteration order, as unordered as an unindexed query
        None => (),
    }
    comments
}

fn notify(inner: &mut Inner, post: PostId) {
    let mut feeds = std::mem::take(&mut inner.feeds);
    feeds.retain(|f| {
        if f.query.post_id != post {
            return true;
        }
        let snap = snapshot(inner, &f.query);
        f.sender.send(FeedMessage::Snapshot(snap)).is_ok()
    });
    inner.feeds = feeds;
}

#[async_trait]
impl CommentStore for MockStore {
    async fn query_comments(&self, q: &CommentQuery) -> Result<Vec<Comment>, Error> {
        let mut inner = self.lock();
        if let Some(e) = inner.fail_next.pop_front() {
            return Err(e);
        }
        if q.order_by_created.is_some() && !inner.comment_index {
            return Err(Error::MissingIndex);
        }
        Ok(snapshot(&inner, q))
    }

    async fn subscribe_comments(&self, q: &CommentQuery) -> Result<CommentFeed, Error> {
        let mut inner = self.lock();
        if let Some(e) = inner.fail_next.pop_front() {
            return Err(e);
        }
        if q.order_by_created.is_some() && !inner.comment_index {
            return Err(Error::MissingIndex);
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        sender
            .send(FeedMessage::Snapshot(snapshot(&inner, q)))
            .expect("receiver alive");
        inner.feeds.push(Feed { query: *q, sender });
        Ok(receiver)
    }

    async fn create_comment(&self, c: NewComment) -> Result<CommentId, Error> {
        let mut inner = self.lock();
        if inner.deny_writes {
            return Err(Error::PermissionDenied);
        }
        // persisted comments are never empty; the client checks first, the
        // store's rules back it up
        c.validate()?;
        let id = CommentId(Uuid::new_v4());
        let post = c.post_id;
        inner.comments.insert(id, c.into_comment(id));
        notify(&mut inner, post);
        Ok(id)
    }

    async fn edit_comment(
        &self,
        id: CommentId,
        content: String,
        edited_at: Time,
    ) -> Result<(), Error> {
        let mut inner = self.lock();
        if inner.deny_writes {
            return Err(Error::PermissionDenied);
        }
        let post = {
            let c = inner
                .comments
                .get_mut(&id)
                .ok_or(Error::UnknownComment(id))?;
            c.content = content;
            c.edited_at = Some(edited_at);
            c.post_id
        };
        notify(&mut inner, post);
        Ok(())
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        let mut inner = self.lock();
        if inner.deny_writes {
            return Err(Error::PermissionDenied);
        }
        // deleting an absent document is a no-op, like the real store
        if let Some(c) = inner.comments.remove(&id) {
            notify(&mut inner, c.post_id);
        }
        Ok(())
    }

    async fn set_reactions(&self, id: CommentId, reactions: Reactions) -> Result<(), Error> {
        let mut inner = self.lock();
        if inner.deny_writes {
            return Err(Error::PermissionDenied);
        }
        let post = {
            let c = inner
                .comments
                .get_mut(&id)
                .ok_or(Error::UnknownComment(id))?;
            c.reactions = reactions;
            c.post_id
        };
        notify(&mut inner, post);
        Ok(())
    }
}

#[async_trait]
impl PostStore for MockStore {
    async fn fetch_post(&self, id: PostId) -> Result<Post, Error> {
        self.lock()
            .posts
            .get(&id)
            .cloned()
            .ok_or(Error::UnknownPost(id))
    }

    async fn record_view(&self, id: PostId) -> Result<(), Error> {
        let mut inner = self.lock();
        if inner.deny_writes {
            return Err(Error::PermissionDenied);
        }
        let post = inner.posts.get_mut(&id).ok_or(Error::UnknownPost(id))?;
        post.view_count += 1;
        Ok(())
    }

    async fn set_post_liked(&self, id: PostId, liked: bool) -> Result<(), Error> {
        let mut inner = self.lock();
        if inner.deny_writes {
            return Err(Error::PermissionDenied);
        }
        let post = inner.posts.get_mut(&id).ok_or(Error::UnknownPost(id))?;
        post.like_count += if liked { 1 } else { -1 };
        Ok(())
    }
}
