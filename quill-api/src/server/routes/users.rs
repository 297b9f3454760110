use crate::server::{Result, ServerError, ServerRouter, json::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use quill_common::model::{
    Id,
    user::{User, UserDetails, UserMarker},
};
use quill_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_users)
        .typed_post(create_user)
        .typed_get(get_user)
        .typed_put(update_user)
        .typed_delete(delete_user)
}

#[derive(TypedPath)]
#[typed_path("/api/user")]
struct UsersPath;

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/user/{id}", rejection(ServerError))]
struct UserPath {
    id: Id<UserMarker>,
}

async fn get_users(
    UsersPath: UsersPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<User>>> {
    let users = db.fetch_users().await?;

    Ok(Json(users))
}

async fn create_user(
    UsersPath: UsersPath,
    State(db): State<Arc<DbClient>>,
    Json(user): Json<UserDetails>,
) -> Result<(StatusCode, &'static str)> {
    let id = db.create_user(&user).await?;
    info!(%id, "Created user");

    Ok((StatusCode::CREATED, "User created successfully"))
}

async fn get_user(
    UserPath { id }: UserPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<User>> {
    let user = db
        .fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Json(user))
}

async fn update_user(
    UserPath { id }: UserPath,
    State(db): State<Arc<DbClient>>,
    Json(user): Json<UserDetails>,
) -> Result<&'static str> {
    if !db.update_user(id, &user).await? {
        return Err(ServerError::UserByIdNotFound(id));
    }

    Ok("User updated successfully")
}

async fn delete_user(
    UserPath { id }: UserPath,
    State(db): State<Arc<DbClient>>,
) -> Result<&'static str> {
    db.delete_user(id).await?;

    Ok("User deleted successfully")
}
