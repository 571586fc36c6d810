use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::api::{Error, PostId, Session};
use crate::PostStore;

const KEY_SESSION: &str = "session";
const KEY_LIKED_POSTS: &str = "liked-posts";

/// Client-side persistence boundary (the browser's local storage in the real
/// application). Values are opaque strings; serialization happens above it.
pub trait SessionCache: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory cache for tests and headless use.
#[derive(Default)]
pub struct MemoryCache(Mutex<HashMap<String, String>>);

impl MemoryCache {
    pub fn new() -> MemoryCache {
        MemoryCache::default()
    }
}

impl SessionCache for MemoryCache {
    fn load(&self, key: &str) -> Option<String> {
        self.0.lock().expect("cache lock poisoned").get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) {
        self.0
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.0.lock().expect("cache lock poisoned").remove(key);
    }
}

/// Owns the state the application keeps across page loads: the signed-in
/// session and the set of posts this browser already counted a like for.
/// Loaded from the cache once at construction; every change writes through.
pub struct SessionContext {
    cache: Box<dyn SessionCache>,
    session: Option<Session>,
    liked_posts: HashSet<PostId>,
}

impl SessionContext {
    pub fn load(cache: Box<dyn SessionCache>) -> SessionContext {
        let session = cache.load(KEY_SESSION).and_then(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| tracing::warn!(?e, "discarding unreadable cached session"))
                .ok()
        });
        let liked_posts = cache
            .load(KEY_LIKED_POSTS)
            .and_then(|raw| {
                serde_json::from_str(&raw)
                    .map_err(|e| tracing::warn!(?e, "discarding unreadable liked-post set"))
                    .ok()
            })
            .unwrap_or_default();
        SessionContext {
            cache,
            session,
            liked_posts,
        }
    }

    /// The signed-in session, if any. Re-read before every action; never
    /// cache the returned value across an await.
    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn sign_in(&mut self, session: Session) {
        self.cache.store(
            KEY_SESSION,
            &serde_json::to_string(&session).expect("serializing session"),
        );
        self.session = Some(session);
    }

    pub fn sign_out(&mut self) {
        self.cache.remove(KEY_SESSION);
        self.session = None;
    }

    pub fn has_liked(&self, post: PostId) -> bool {
        self.liked_posts.contains(&post)
    }

    /// Flips the local liked marker, persists it, and reports the new value.
    /// The caller mirrors the flip onto the store's like counter.
    pub fn toggle_post_liked(&mut self, post: PostId) -> bool {
        let liked = if self.liked_posts.remove(&post) {
            false
        } else {
            self.liked_posts.insert(post);
            true
        };
        self.cache.store(
            KEY_LIKED_POSTS,
            &serde_json::to_string(&self.liked_posts).expect("serializing liked posts"),
        );
        liked
    }
}

/// Likes (or un-likes) a post: flips the local marker, then moves the store
/// counter. A failed counter write undoes the local flip so the marker and
/// the counter cannot drift apart.
pub async fn toggle_post_like<S>(
    store: &S,
    ctx: &mut SessionContext,
    post: PostId,
) -> Result<bool, Error>
where
    S: PostStore + ?Sized,
{
    if ctx.current().is_none() {
        return Err(Error::Unauthenticated);
    }
    let liked = ctx.toggle_post_liked(post);
    if let Err(e) = store.set_post_liked(post, liked).await {
        ctx.toggle_post_liked(post);
        return Err(e);
    }
    Ok(liked)
}
