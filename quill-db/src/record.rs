use quill_common::model::{
    comment::Comment,
    post::{Author, Post, PostView},
    user::User,
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostViewRecord {
    #[sqlx(flatten)]
    pub post: PostRecord,
    pub name: String,
    pub email: String,
    pub comments: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub reply_to: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRecord> for User {
    fn from(value: UserRecord) -> Self {
        Self {
            id: value.id.into(),
            name: value.name,
            email: value.email,
        }
    }
}

impl From<PostRecord> for Post {
    fn from(value: PostRecord) -> Self {
        Self {
            id: value.id.into(),
            title: value.title,
            content: value.content,
            user_id: value.user_id.into(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<PostViewRecord> for PostView {
    fn from(value: PostViewRecord) -> Self {
        Self {
            post: value.post.into(),
            author: Author {
                name: value.name,
                email: value.email,
            },
            comments: value.comments,
        }
    }
}

impl From<CommentRecord> for Comment {
    fn from(value: CommentRecord) -> Self {
        Self {
            id: value.id.into(),
            post_id: value.post_id.into(),
            user_id: value.user_id.into(),
            content: value.content,
            reply_to: value.reply_to.map(Into::into),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
