use crate::{
    client::{DbClient, DbError, Reference, Result},
    record::CommentRecord,
};
use quill_common::model::{
    Id,
    comment::{Comment, CommentContent, CommentMarker, CreateComment},
    post::PostMarker,
};
use sqlx::{query, query_as, query_scalar};

impl DbClient {
    pub async fn create_comment(&self, comment: &CreateComment) -> Result<Id<CommentMarker>> {
        self.require(Reference::Post(comment.post_id)).await?;
        self.require(Reference::User(comment.user_id)).await?;
        if let Some(reply_to) = comment.reply_to {
            self.require_reply_target(comment.post_id, reply_to).await?;
        }

        let id: i64 = query_scalar(
            "
            INSERT INTO comments (post_id, user_id, content, reply_to)
            VALUES ($1, $2, $3, $4)
            RETURNING comments.id
            ",
        )
        .bind(comment.post_id.get())
        .bind(comment.user_id.get())
        .bind(&comment.content)
        .bind(comment.reply_to.map(Id::get))
        .fetch_one(self.pool())
        .await?;

        Ok(id.into())
    }

    // A reply must point at a comment on the same post.
    async fn require_reply_target(
        &self,
        post_id: Id<PostMarker>,
        reply_to: Id<CommentMarker>,
    ) -> Result<()> {
        if !self.enforces_references() {
            return Ok(());
        }

        let exists: bool = query_scalar(
            "
            SELECT EXISTS (
                SELECT 1
                FROM comments
                WHERE comments.id = $1 AND comments.post_id = $2
            )
            ",
        )
        .bind(reply_to.get())
        .bind(post_id.get())
        .fetch_one(self.pool())
        .await?;

        if exists {
            Ok(())
        } else {
            Err(DbError::MissingReference(Reference::Comment(reply_to)))
        }
    }

    /// All comments on a post as a flat list in creation order. An unknown
    /// post yields an empty list.
    pub async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records: Vec<CommentRecord> = query_as(
            "
            SELECT
                comments.id,
                comments.post_id,
                comments.user_id,
                comments.content,
                comments.reply_to,
                comments.created_at,
                comments.updated_at
            FROM
                comments
            WHERE
                comments.post_id = $1
            ORDER BY
                comments.id
            ",
        )
        .bind(post_id.get())
        .fetch_all(self.pool())
        .await?;

        Ok(records.into_iter().map(Comment::from).collect())
    }

    pub async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>> {
        let record: Option<CommentRecord> = query_as(
            "
            SELECT
                comments.id,
                comments.post_id,
                comments.user_id,
                comments.content,
                comments.reply_to,
                comments.created_at,
                comments.updated_at
            FROM
                comments
            WHERE
                comments.id = $1
            ",
        )
        .bind(comment_id.get())
        .fetch_optional(self.pool())
        .await?;

        Ok(record.map(Comment::from))
    }

    /// Replaces the content. Returns `false` if no comment has this id.
    pub async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        comment: &CommentContent,
    ) -> Result<bool> {
        let result = query(
            "
            UPDATE comments
            SET content = $1, updated_at = now()
            WHERE comments.id = $2
            ",
        )
        .bind(&comment.content)
        .bind(comment_id.get())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deleting an id that does not exist is not an error. Replies keep
    /// pointing at the deleted id unless the reference policy is enforced.
    pub async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<()> {
        self.guard_delete(Reference::Comment(comment_id)).await?;

        query("DELETE FROM comments WHERE comments.id = $1")
            .bind(comment_id.get())
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
