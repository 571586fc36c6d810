//! Shared fixtures for the integration tests and the data generator.

use chrono::TimeZone;
use denki_api::{
    Author, Comment, CommentId, Post, PostId, PostStatus, Reactions, Session, Time, UserId, Uuid,
};
use denki_client::ThreadView;
use tokio::sync::watch;

pub fn at(secs: i64) -> Time {
    chrono::Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn user(n: u128) -> UserId {
    UserId(Uuid::from_u128(n))
}

pub fn session(n: u128, name: &str) -> Session {
    Session {
        user_id: user(n),
        display_name: name.to_string(),
        avatar_url: None,
    }
}

pub fn author(n: u128, name: &str) -> Author {
    Author {
        id: user(n),
        name: name.to_string(),
        avatar_url: None,
    }
}

pub fn post(n: u128, title: &str) -> Post {
    Post {
        id: PostId(Uuid::from_u128(n)),
        title: title.to_string(),
        slug: denki_api::to_slug(title),
        category: String::from("electronics"),
        tags: vec![String::from("esp32")],
        status: PostStatus::Public,
        author: author(1, "ann"),
        created_at: at(0),
        updated_at: None,
        view_count: 0,
        like_count: 0,
    }
}

pub fn comment(n: u128, post: PostId, parent: Option<CommentId>, secs: i64) -> Comment {
    Comment {
        id: CommentId(Uuid::from_u128(n)),
        post_id: post,
        parent_id: parent,
        author: author(1, "ann"),
        content: format!("comment {n}"),
        created_at: at(secs),
        edited_at: None,
        reactions: Reactions::new(),
    }
}

/// Waits until the live view publishes a value matching `pred`, then returns
/// that value. Intermediate values may be collapsed by the watch channel.
pub async fn wait_for(
    view: &mut watch::Receiver<ThreadView>,
    pred: impl Fn(&ThreadView) -> bool,
) -> ThreadView {
    loop {
        {
            let v = view.borrow_and_update();
            if pred(&v) {
                return v.clone();
            }
        }
        view.changed().await.expect("live feed task went away");
    }
}
