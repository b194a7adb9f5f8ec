use axum::{
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mock_server::{app, basic_auth, Tag, DEFAULT_API_KEY, DEFAULT_APP_ID};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn auth() -> String {
    basic_auth(DEFAULT_APP_ID, DEFAULT_API_KEY)
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, auth())
        .body(body.to_string())
        .unwrap()
}

fn bare_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth())
        .body(String::new())
        .unwrap()
}

/// Routers share their state across clones, so one app serves a whole scenario.
async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_return_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/users/?user_id=u1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!({"error": "unauthorized"}));
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/users/")
                .header(http::header::AUTHORIZATION, basic_auth(DEFAULT_APP_ID, "nope"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- users ---

#[tokio::test]
async fn list_users_empty() {
    let resp = app().oneshot(bare_request("GET", "/v1/users/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["users"], json!([]));
    assert_eq!(body["total_count"], 0);
}

#[tokio::test]
async fn get_user_not_found_returns_json_error() {
    let resp = app()
        .oneshot(bare_request("GET", "/v1/users/?email=a%40b.com"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "user not found");
}

#[tokio::test]
async fn create_user_without_identifier_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/users", r#"{"name":"Nobody"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_unknown_user_returns_404() {
    let resp = app()
        .oneshot(json_request("PUT", "/v1/users", r#"{"user_id":"ghost"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_users_paginates() {
    let app = app();
    for i in 0..5 {
        let body = format!(r#"{{"user_id":"u{i}"}}"#);
        let resp = send(&app, json_request("POST", "/v1/users", &body)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = send(&app, bare_request("GET", "/v1/users/?page=2&per_page=2")).await;
    let body: Value = body_json(resp).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["total_count"], 5);
    assert_eq!(body["total_pages"], 3);
    let ids: Vec<_> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["user_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["u2", "u3"]);
}

#[tokio::test]
async fn user_lifecycle() {
    let app = app();

    // create
    let resp = send(
        &app,
        json_request("POST", "/v1/users", r#"{"user_id":"u1","email":"x@y.com"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = body_json(resp).await;
    assert_eq!(created["email"], "x@y.com");
    assert!(created["intercom_id"].is_string());

    // get by email and by id
    let resp = send(&app, bare_request("GET", "/v1/users/?email=x%40y.com")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let by_email: Value = body_json(resp).await;
    let resp = send(&app, bare_request("GET", "/v1/users/?user_id=u1")).await;
    let by_id: Value = body_json(resp).await;
    assert_eq!(by_email, by_id);

    // update merges fields
    let resp = send(
        &app,
        json_request("PUT", "/v1/users", r#"{"user_id":"u1","name":"Ada"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = body_json(resp).await;
    assert_eq!(updated["name"], "Ada");
    assert_eq!(updated["email"], "x@y.com");

    // delete
    let resp = send(&app, bare_request("DELETE", "/v1/users/?user_id=u1")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // get after delete is 404
    let resp = send(&app, bare_request("GET", "/v1/users/?user_id=u1")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- threads and impressions ---

#[tokio::test]
async fn threads_are_listed_per_user() {
    let app = app();
    let resp = send(
        &app,
        json_request(
            "POST",
            "/v1/users/message_threads",
            r#"{"user_id":"u1","body":"Hi"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let thread: Value = body_json(resp).await;
    assert_eq!(thread["messages"][0]["html"], "Hi");

    let resp = send(&app, bare_request("GET", "/v1/users/message_threads?user_id=u1")).await;
    let threads: Vec<Value> = body_json(resp).await;
    assert_eq!(threads.len(), 1);

    let resp = send(&app, bare_request("GET", "/v1/users/message_threads?user_id=u2")).await;
    let threads: Vec<Value> = body_json(resp).await;
    assert!(threads.is_empty());

    let resp = send(
        &app,
        json_request("POST", "/v1/users/impressions", r#"{"user_id":"u1"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["unread_messages"], 1);
}

#[tokio::test]
async fn create_thread_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/v1/users/message_threads",
            r#"{"body":"no user"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- events ---

#[tokio::test]
async fn events_are_accepted_with_empty_body() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/events/",
            r#"{"user_id":"u1","event_name":"signed-up","created":1700000000}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn versioned_events_path_does_not_exist() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/v1/events/",
            r#"{"user_id":"u1","event_name":"x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- tags ---

#[tokio::test]
async fn update_unknown_tag_returns_404() {
    let resp = app()
        .oneshot(json_request("PUT", "/v1/tags", r#"{"name":"vip"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tag_lifecycle() {
    let app = app();

    let resp = send(
        &app,
        json_request(
            "POST",
            "/v1/tags",
            r#"{"name":"vip","user_ids":["u1","u2"],"color":"green"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let tag: Tag = body_json(resp).await;
    assert_eq!(tag.tagged_user_count, 2);

    let resp = send(
        &app,
        json_request(
            "PUT",
            "/v1/tags",
            r#"{"name":"vip","user_ids":["u2"],"tag_or_untag":"untag"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, bare_request("GET", "/v1/tags/?name=vip")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Tag = body_json(resp).await;
    assert_eq!(fetched.id, tag.id);
    assert_eq!(fetched.tagged_user_count, 1);
    assert_eq!(fetched.color.as_deref(), Some("green"));

    let resp = send(&app, bare_request("GET", "/v1/tags/?name=missing")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
