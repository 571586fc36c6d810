use uuid::Uuid;

use crate::{Author, Time, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn stub() -> PostId {
        PostId(STUB_UUID)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Public,
    Draft,
    Private,
}

/// One document in the `blogs` collection. The comment core reads these for
/// display context only; the admin dashboard owns their lifecycle.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub author: Author,

    pub created_at: Time,
    pub updated_at: Option<Time>,

    pub view_count: i64,
    pub like_count: i64,
}

/// Url slug for a post title: ascii-folded, lowercased, hyphen-separated.
pub fn to_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        match c {
            'đ' => slug.push('d'),
            'a'..='z' | '0'..='9' | '-' => slug.push(c),
            c if c.is_whitespace() => slug.push(' '),
            _ => (),
        }
    }
    let words: Vec<&str> = slug.split_whitespace().collect();
    words.join("-")
}
