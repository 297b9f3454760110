use crate::{
    client::{DbClient, Reference, Result},
    record::{PostRecord, PostViewRecord},
};
use quill_common::model::{
    Id,
    post::{CreatePost, Post, PostContent, PostMarker, PostView},
};
use sqlx::{query, query_as, query_scalar};

impl DbClient {
    pub async fn create_post(&self, post: &CreatePost) -> Result<Id<PostMarker>> {
        self.require(Reference::User(post.user_id)).await?;

        let id: i64 = query_scalar(
            "
            INSERT INTO posts (title, content, user_id)
            VALUES ($1, $2, $3)
            RETURNING posts.id
            ",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.user_id.get())
        .fetch_one(self.pool())
        .await?;

        Ok(id.into())
    }

    pub async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let records: Vec<PostRecord> = query_as(
            "
            SELECT
                posts.id,
                posts.title,
                posts.content,
                posts.user_id,
                posts.created_at,
                posts.updated_at
            FROM
                posts
            ORDER BY
                posts.id
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(records.into_iter().map(Post::from).collect())
    }

    /// Fetches a post together with its author and the current number of
    /// comments on it. Posts whose author no longer exists are not found.
    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<PostView>> {
        let record: Option<PostViewRecord> = query_as(
            "
            SELECT
                posts.id,
                posts.title,
                posts.content,
                posts.user_id,
                posts.created_at,
                posts.updated_at,
                users.name,
                users.email,
                (
                    SELECT COUNT(*)
                    FROM comments
                    WHERE comments.post_id = posts.id
                ) AS comments
            FROM
                posts INNER JOIN users ON posts.user_id = users.id
            WHERE
                posts.id = $1
            ",
        )
        .bind(post_id.get())
        .fetch_optional(self.pool())
        .await?;

        Ok(record.map(PostView::from))
    }

    /// Replaces title and content. Returns `false` if no post has this id.
    pub async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        post: &PostContent,
    ) -> Result<bool> {
        let result = query(
            "
            UPDATE posts
            SET title = $1, content = $2, updated_at = now()
            WHERE posts.id = $3
            ",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post_id.get())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deleting an id that does not exist is not an error. Comments on the
    /// post are kept unless the reference policy is enforced.
    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<()> {
        self.guard_delete(Reference::Post(post_id)).await?;

        query("DELETE FROM posts WHERE posts.id = $1")
            .bind(post_id.get())
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
