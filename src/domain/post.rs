//! Posts and comments.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::access::Owned;

/// Blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
}

/// Title/content edit. The author is not editable.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
}
