use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use quill_common::model::{Id, comment::CommentMarker, post::PostMarker, user::UserMarker};
use quill_db::client::{DbClient, DbError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

mod json;
mod routes;
#[cfg(test)]
mod tests;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("User with id {0} was not found.")]
    UserByIdNotFound(Id<UserMarker>),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Comment with id {0} was not found.")]
    CommentByIdNotFound(Id<CommentMarker>),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::UserByIdNotFound(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::CommentByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::PathRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::Database(DbError::MissingReference(_)) => StatusCode::BAD_REQUEST,
            ServerError::Database(DbError::HasDependents(_)) => StatusCode::CONFLICT,
            ServerError::JsonResponse(_)
            | ServerError::Database(DbError::DuplicateEmail(_) | DbError::Sqlx(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The text sent to the client. Internal details only go to the log.
    pub fn message(&self) -> &'static str {
        match self {
            ServerError::UnknownRoute(_) => "Not found",
            ServerError::PathRejection(_) => "Invalid 'id' parameter",
            ServerError::JsonRejection(_) => "Invalid request body",
            ServerError::JsonResponse(_) | ServerError::Database(DbError::Sqlx(_)) => {
                "Internal server error"
            }
            ServerError::Database(DbError::DuplicateEmail(_)) => "Email already in use",
            ServerError::Database(DbError::MissingReference(_)) => {
                "Referenced resource does not exist"
            }
            ServerError::Database(DbError::HasDependents(_)) => {
                "Resource is still referenced by other resources"
            }
            ServerError::UserByIdNotFound(_) => "User not found",
            ServerError::PostByIdNotFound(_) => "Post not found",
            ServerError::CommentByIdNotFound(_) => "Comment not found",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            debug!(error = %self, %status, "Replying with error");
        }

        (status, self.message()).into_response()
    }
}
