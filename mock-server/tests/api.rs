use std::collections::BTreeMap;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Options, Post};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn seeded() -> Vec<Post> {
    (1..=3)
        .map(|id| Post {
            id,
            title: format!("title {id}"),
            body: format!("body {id}"),
            user_id: 1,
        })
        .collect()
}

// --- list ---

#[tokio::test]
async fn list_posts_empty() {
    let resp = app().oneshot(get("/posts")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let posts: Vec<Post> = body_json(resp).await;
    assert!(posts.is_empty());
}

#[tokio::test]
async fn list_posts_keeps_seed_order() {
    let resp = app_with(seeded(), Options::default())
        .oneshot(get("/posts"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let posts: Vec<Post> = body_json(resp).await;
    assert_eq!(posts, seeded());
}

// --- create ---

#[tokio::test]
async fn create_post_returns_201_with_next_id() {
    let resp = app_with(seeded(), Options::default())
        .oneshot(json_request(
            "POST",
            "/posts",
            r#"{"title":"foo","body":"bar","userId":1}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: Post = body_json(resp).await;
    assert_eq!(post.id, 4);
    assert_eq!(post.title, "foo");
    assert_eq!(post.body, "bar");
}

#[tokio::test]
async fn create_post_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/posts", r#"{"title":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- get ---

#[tokio::test]
async fn get_post_not_found() {
    let resp = app().oneshot(get("/posts/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_post_bad_id_returns_400() {
    let resp = app().oneshot(get("/posts/not-a-number")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- status / headers ---

#[tokio::test]
async fn status_route_answers_with_requested_code() {
    let resp = app().oneshot(get("/status/503")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_bytes(resp).await, "{}");
}

#[tokio::test]
async fn headers_route_echoes_request_headers() {
    let request = Request::builder()
        .uri("/headers")
        .header("x-auth", "secret")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echoed: BTreeMap<String, String> = body_json(resp).await;
    assert_eq!(echoed["x-auth"], "secret");
}

// --- cross-origin grant ---

#[tokio::test]
async fn no_grant_header_by_default() {
    let resp = app().oneshot(get("/posts")).await.unwrap();
    assert!(resp
        .headers()
        .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn configured_grant_is_sent_on_every_response() {
    let options = Options {
        allow_origin: Some("*".to_string()),
    };
    let resp = app_with(Vec::new(), options)
        .oneshot(get("/posts/9"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers()[http::header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

// --- full lifecycle ---

#[tokio::test]
async fn create_then_read_back() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/posts",
            r#"{"title":"Walk dog","body":"at noon","userId":2}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Post = body_json(resp).await;
    assert_eq!(created.id, 1);
    let id = created.id;

    // list — should contain the one post
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/posts"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let posts: Vec<Post> = body_json(resp).await;
    assert_eq!(posts, vec![created.clone()]);

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/posts/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Post = body_json(resp).await;
    assert_eq!(fetched, created);

    // second create gets the next id
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/posts",
            r#"{"title":"Walk cat","body":"never","userId":2}"#,
        ))
        .await
        .unwrap();
    let second: Post = body_json(resp).await;
    assert_eq!(second.id, 2);
}
