use std::sync::Arc;
use std::time::Duration;

use futures::channel::oneshot;
use tokio::sync::{mpsc, watch};

use crate::api::{Error, FeedMessage, PostId};
use crate::{build_threads, CommentFeed, CommentQuery, CommentStore, Thread};

// Space each automatic retry by RETRY_DELAY; no backoff, no jitter
pub const RETRY_DELAY: Duration = Duration::from_secs(2);
// Give up once MAX_RETRIES consecutive failures accumulate; a manual retry starts over
pub const MAX_RETRIES: u32 = 3;

/// Lifecycle of the live comment view.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SyncState {
    Idle,
    Subscribing,
    Synced,
    /// Waiting out the fixed delay after consecutive failure `attempt`.
    Retrying { attempt: u32 },
    /// Terminal: no further automatic attempts. `LiveComments::retry`
    /// resets the counter and subscribes again.
    Failed(Error),
}

/// What the comment view renders: the lifecycle state plus the last
/// reconstructed forest (kept across disconnections).
#[derive(Clone, Debug)]
pub struct ThreadView {
    pub state: SyncState,
    pub threads: Vec<Thread>,
}

/// Handle to the feed task for one post. Dropping it unsubscribes and cancels
/// any in-flight retry timer; switching posts is drop-and-respawn.
pub struct LiveComments {
    view: watch::Receiver<ThreadView>,
    retry: mpsc::UnboundedSender<()>,
    // Dropping this cancels the task, which selects on our end going away.
    _feed_canceller: oneshot::Receiver<()>,
}

impl LiveComments {
    pub fn spawn<S>(store: Arc<S>, post_id: PostId) -> LiveComments
    where
        S: CommentStore + Send + Sync + 'static,
    {
        let (view_tx, view_rx) = watch::channel(ThreadView {
            state: SyncState::Idle,
            threads: Vec::new(),
        });
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        tokio::spawn(run_feed(store, post_id, view_tx, retry_rx, cancel_tx));
        LiveComments {
            view: view_rx,
            retry: retry_tx,
            _feed_canceller: cancel_rx,
        }
    }

    /// The rendered state; `changed()` on the receiver observes updates.
    pub fn view(&self) -> watch::Receiver<ThreadView> {
        self.view.clone()
    }

    /// User-triggered retry from the terminal `Failed` state. Resets the
    /// attempt counter; presses in any other state do nothing.
    pub fn retry(&self) {
        let _ = self.retry.send(());
    }
}

async fn run_feed<S>(
    store: Arc<S>,
    post_id: PostId,
    view: watch::Sender<ThreadView>,
    mut retry: mpsc::UnboundedReceiver<()>,
    mut cancel: oneshot::Sender<()>,
) where
    S: CommentStore + Send + Sync + 'static,
{
    let cancelled = cancel.cancellation();
    tokio::pin!(cancelled);

    let mut attempts: u32 = 0;
    let mut threads: Vec<Thread> = Vec::new();

    'resubscribe: loop {
        // Taken on every failure, from subscribing and from an open feed
        // alike: transient errors wait out the fixed delay up to the attempt
        // bound, everything else (and an exhausted bound) parks in Failed
        // until the user asks again.
        macro_rules! lost {
            ($e:expr) => {{
                let e: Error = $e;
                attempts += 1;
                if e.is_transient() && attempts < MAX_RETRIES {
                    tracing::warn!(?e, attempt = attempts, "comment feed lost, retrying");
                    publish(&view, &threads, SyncState::Retrying { attempt: attempts });
                    tokio::select! {
                        _ = &mut cancelled => return,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                } else {
                    tracing::error!(?e, "comment feed failed, waiting for a manual retry");
                    publish(&view, &threads, SyncState::Failed(e));
                    // presses from before the failure don't count
                    while retry.try_recv().is_ok() {}
                    tokio::select! {
                        _ = &mut cancelled => return,
                        msg = retry.recv() => match msg {
                            None => return,
                            Some(()) => attempts = 0,
                        }
                    }
                }
                continue 'resubscribe;
            }};
        }

        publish(&view, &threads, SyncState::Subscribing);

        let mut feed = match subscribe_with_fallback(&*store, post_id).await {
            Ok(feed) => feed,
            Err(e) => lost!(e),
        };

        loop {
            tokio::select! {
                _ = &mut cancelled => return,
                msg = feed.recv() => match msg {
                    None => lost!(Error::Transient(String::from("subscription closed"))),
                    Some(FeedMessage::Snapshot(comments)) => {
                        // a live subscription counts as healthy again once it
                        // delivers, not when it merely opens
                        attempts = 0;
                        threads = build_threads(&comments);
                        publish(&view, &threads, SyncState::Synced);
                    }
                    Some(FeedMessage::Error(e)) => lost!(e),
                },
            }
        }
    }
}

/// Opens the newest-first live query; when the compound sort has no index,
/// transparently subscribes unordered instead. Reconstruction orders in
/// memory, so the two feeds render identically.
async fn subscribe_with_fallback<S>(store: &S, post_id: PostId) -> Result<CommentFeed, Error>
where
    S: CommentStore + ?Sized,
{
    match store
        .subscribe_comments(&CommentQuery::newest_first(post_id))
        .await
    {
        Err(Error::MissingIndex) => {
            tracing::debug!(?post_id, "ordered subscription has no index, falling back");
            store
                .subscribe_comments(&CommentQuery::unordered(post_id))
                .await
        }
        res => res,
    }
}

fn publish(view: &watch::Sender<ThreadView>, threads: &[Thread], state: SyncState) {
    let _ = view.send(ThreadView {
        state,
        threads: threads.to_vec(),
    });
}
