use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use quill_common::model::{
    Id,
    post::{CreatePost, Post, PostContent, PostMarker, PostView},
};
use quill_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_posts)
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath)]
#[typed_path("/api/post")]
struct PostsPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/post/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn get_posts(
    PostsPath: PostsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<Post>>> {
    let posts = db.fetch_posts().await?;

    Ok(Json(posts))
}

async fn create_post(
    PostsPath: PostsPath,
    State(db): State<Arc<DbClient>>,
    Json(post): Json<CreatePost>,
) -> Result<(StatusCode, &'static str)> {
    let id = db.create_post(&post).await?;
    info!(%id, user_id = %post.user_id, "Created post");

    Ok((StatusCode::CREATED, "Post created successfully"))
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<PostView>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    Json(post): Json<PostContent>,
) -> Result<&'static str> {
    if !db.update_post(id, &post).await? {
        return Err(ServerError::PostByIdNotFound(id));
    }

    Ok("Post updated successfully")
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<&'static str> {
    db.delete_post(id).await?;

    Ok("Post deleted successfully")
}
