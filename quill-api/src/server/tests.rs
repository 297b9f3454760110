use crate::server::{ServerError, ServerState, routes};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use quill_common::model::Id;
use quill_db::client::{DbClient, DbError, Reference, ReferencePolicy};
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::sync::Arc;
use tower::ServiceExt;

fn app(pool: PgPool, reference_policy: ReferencePolicy) -> Router {
    let state = ServerState {
        db_client: Arc::new(DbClient::new(pool, reference_policy)),
    };

    routes().with_state(state)
}

// Requests rejected during extraction never touch the pool, so it is never
// connected.
fn offline_app() -> Router {
    let pool = PgPoolOptions::new().connect_lazy_with(PgConnectOptions::new());

    app(pool, ReferencePolicy::Unchecked)
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    (status, body_text(response).await)
}

#[test]
fn not_found_errors_map_to_404() {
    assert_eq!(
        ServerError::UserByIdNotFound(Id::new(1)).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ServerError::PostByIdNotFound(Id::new(1)).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ServerError::CommentByIdNotFound(Id::new(1)).status(),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn database_errors_map_to_status() {
    let duplicate = ServerError::Database(DbError::DuplicateEmail("a@x.com".to_owned()));
    let storage = ServerError::Database(DbError::Sqlx(sqlx::Error::PoolTimedOut));
    let missing = ServerError::Database(DbError::MissingReference(Reference::User(Id::new(1))));
    let dependents = ServerError::Database(DbError::HasDependents(Reference::Post(Id::new(1))));

    assert_eq!(duplicate.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(duplicate.message(), "Email already in use");
    assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(storage.message(), "Internal server error");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(dependents.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn error_response_hides_internal_detail() {
    let error = ServerError::Database(DbError::Sqlx(sqlx::Error::Protocol(
        "secret connection detail".to_owned(),
    )));

    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_text(response).await;
    assert_eq!(body, "Internal server error");
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let app = offline_app();

    for (method, uri) in [
        ("GET", "/api/user/abc"),
        ("DELETE", "/api/user/abc"),
        ("GET", "/api/post/1.5"),
        ("DELETE", "/api/post/abc"),
        ("GET", "/api/post/abc/comment"),
        ("DELETE", "/api/comment/abc"),
    ] {
        let (status, body) = send(&app, empty_request(method, uri)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body, "Invalid 'id' parameter");
    }
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = offline_app();

    for (method, uri, body) in [
        ("POST", "/api/user", "{not json"),
        ("POST", "/api/user", r#"{"name":"A"}"#),
        ("PUT", "/api/user/1", r#"{"name":"A","email":42}"#),
        ("POST", "/api/post", r#"{"title":"t","content":"c"}"#),
        ("PUT", "/api/post/1", "[]"),
        ("POST", "/api/comment", r#"{"post_id":1,"user_id":1}"#),
        ("PUT", "/api/comment/1", ""),
    ] {
        let (status, text) = send(&app, json_request(method, uri, body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri} {body}");
        assert_eq!(text, "Invalid request body");
    }
}

#[tokio::test]
async fn body_without_json_content_type_is_bad_request() {
    let app = offline_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/user")
        .body(Body::from(r#"{"name":"A","email":"a@x.com"}"#))
        .unwrap();

    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = offline_app();

    let (status, body) = send(&app, empty_request("GET", "/api/tags")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not found");
}

#[sqlx::test(migrator = "quill_db::MIGRATOR")]
#[ignore = "requires database"]
async fn user_lifecycle(pool: PgPool) {
    let app = app(pool, ReferencePolicy::Unchecked);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/user", r#"{"name":"A","email":"a@x.com"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, "User created successfully");

    let (status, body) = send(&app, empty_request("GET", "/api/user/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"id":1,"name":"A","email":"a@x.com"}"#);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/user", r#"{"name":"B","email":"a@x.com"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Email already in use");

    let (status, body) = send(&app, empty_request("DELETE", "/api/user/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "User deleted successfully");

    let (status, _) = send(&app, empty_request("GET", "/api/user/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, empty_request("DELETE", "/api/user/1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrator = "quill_db::MIGRATOR")]
#[ignore = "requires database"]
async fn update_of_missing_entities_is_not_found(pool: PgPool) {
    let app = app(pool, ReferencePolicy::Unchecked);

    for (uri, body) in [
        ("/api/user/7", r#"{"name":"A","email":"a@x.com"}"#),
        ("/api/post/7", r#"{"title":"t","content":"c"}"#),
        ("/api/comment/7", r#"{"content":"c"}"#),
    ] {
        let (status, _) = send(&app, json_request("PUT", uri, body)).await;

        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[sqlx::test(migrator = "quill_db::MIGRATOR")]
#[ignore = "requires database"]
async fn post_for_deleted_user_is_accepted(pool: PgPool) {
    let app = app(pool, ReferencePolicy::Unchecked);

    send(
        &app,
        json_request("POST", "/api/user", r#"{"name":"A","email":"a@x.com"}"#),
    )
    .await;
    send(&app, empty_request("DELETE", "/api/user/1")).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/post",
            r#"{"title":"t","content":"c","user_id":1}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, "Post created successfully");

    let (status, body) = send(&app, empty_request("GET", "/api/post")).await;
    let posts: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posts[0]["user_id"], 1);
}

#[sqlx::test(migrator = "quill_db::MIGRATOR")]
#[ignore = "requires database"]
async fn post_view_and_comment_thread(pool: PgPool) {
    let app = app(pool, ReferencePolicy::Unchecked);

    send(
        &app,
        json_request("POST", "/api/user", r#"{"name":"A","email":"a@x.com"}"#),
    )
    .await;
    send(
        &app,
        json_request(
            "POST",
            "/api/post",
            r#"{"title":"t","content":"c","user_id":1}"#,
        ),
    )
    .await;
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/comment",
            r#"{"post_id":1,"user_id":1,"content":"root","reply_to":null}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    send(
        &app,
        json_request(
            "POST",
            "/api/comment",
            r#"{"post_id":1,"user_id":1,"content":"reply","reply_to":1}"#,
        ),
    )
    .await;

    let (status, body) = send(&app, empty_request("GET", "/api/post/1")).await;
    let view: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["title"], "t");
    assert_eq!(view["author"]["email"], "a@x.com");
    assert_eq!(view["comments"], 2);

    let (status, body) = send(&app, empty_request("GET", "/api/post/1/comment")).await;
    let comments: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(comments[0]["reply_to"].is_null());
    assert_eq!(comments[1]["reply_to"], 1);

    let (status, body) = send(&app, empty_request("GET", "/api/post/2/comment")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[sqlx::test(migrator = "quill_db::MIGRATOR")]
#[ignore = "requires database"]
async fn enforced_policy_maps_to_client_errors(pool: PgPool) {
    let app = app(pool, ReferencePolicy::Enforced);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/post",
            r#"{"title":"t","content":"c","user_id":1}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        &app,
        json_request("POST", "/api/user", r#"{"name":"A","email":"a@x.com"}"#),
    )
    .await;
    send(
        &app,
        json_request(
            "POST",
            "/api/post",
            r#"{"title":"t","content":"c","user_id":1}"#,
        ),
    )
    .await;

    let (status, _) = send(&app, empty_request("DELETE", "/api/user/1")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
