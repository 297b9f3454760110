use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use quill_common::model::{
    Id,
    comment::{Comment, CommentContent, CommentMarker, CreateComment},
    post::PostMarker,
};
use quill_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_post_comments)
        .typed_post(create_comment)
        .typed_get(get_comment)
        .typed_put(update_comment)
        .typed_delete(delete_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/post/{id}/comment", rejection(ServerError))]
struct PostCommentsPath {
    id: Id<PostMarker>,
}

#[derive(TypedPath)]
#[typed_path("/api/comment")]
struct CommentsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/comment/{id}", rejection(ServerError))]
struct CommentPath {
    id: Id<CommentMarker>,
}

async fn get_post_comments(
    PostCommentsPath { id }: PostCommentsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<Comment>>> {
    let comments = db.fetch_post_comments(id).await?;

    Ok(Json(comments))
}

async fn create_comment(
    CommentsPath: CommentsPath,
    State(db): State<Arc<DbClient>>,
    Json(comment): Json<CreateComment>,
) -> Result<(StatusCode, &'static str)> {
    let id = db.create_comment(&comment).await?;
    info!(%id, post_id = %comment.post_id, "Created comment");

    Ok((StatusCode::CREATED, "Comment created successfully"))
}

async fn get_comment(
    CommentPath { id }: CommentPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Comment>> {
    let comment = db
        .fetch_comment(id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;

    Ok(Json(comment))
}

async fn update_comment(
    CommentPath { id }: CommentPath,
    State(db): State<Arc<DbClient>>,
    Json(comment): Json<CommentContent>,
) -> Result<&'static str> {
    if !db.update_comment(id, &comment).await? {
        return Err(ServerError::CommentByIdNotFound(id));
    }

    Ok("Comment updated successfully")
}

async fn delete_comment(
    CommentPath { id }: CommentPath,
    State(db): State<Arc<DbClient>>,
) -> Result<&'static str> {
    db.delete_comment(id).await?;

    Ok("Comment deleted successfully")
}
