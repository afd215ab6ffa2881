use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    #[serde(rename = "userId")]
    pub user_id: u64,
}

#[derive(Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub body: String,
    #[serde(rename = "userId")]
    pub user_id: u64,
}

#[derive(Default)]
pub struct Store {
    posts: Vec<Post>,
}

impl Store {
    fn next_id(&self) -> u64 {
        self.posts.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Server options. `allow_origin`, when set, is sent back as
/// `Access-Control-Allow-Origin` on every response.
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub allow_origin: Option<String>,
}

pub fn app() -> Router {
    app_with(Vec::new(), Options::default())
}

/// Router preloaded with `posts`. New posts get ids after the largest
/// existing one.
pub fn app_with(posts: Vec<Post>, options: Options) -> Router {
    let db: Db = Arc::new(RwLock::new(Store { posts }));
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post))
        .route("/status/{code}", get(status))
        .route("/headers", get(echo_headers))
        .with_state(db)
        .layer(middleware::map_response_with_state(options, allow_origin))
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app).await
}

async fn allow_origin(State(options): State<Options>, mut response: Response) -> Response {
    if let Some(value) = options
        .allow_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    response
}

async fn list_posts(State(db): State<Db>) -> Json<Vec<Post>> {
    let store = db.read().await;
    Json(store.posts.clone())
}

async fn create_post(
    State(db): State<Db>,
    Json(input): Json<CreatePost>,
) -> (StatusCode, Json<Post>) {
    let mut store = db.write().await;
    let post = Post {
        id: store.next_id(),
        title: input.title,
        body: input.body,
        user_id: input.user_id,
    };
    store.posts.push(post.clone());
    tracing::debug!(id = post.id, "post created");
    (StatusCode::CREATED, Json(post))
}

async fn get_post(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Post>, StatusCode> {
    let store = db.read().await;
    store
        .posts
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Answer with whatever status the path names, and an empty JSON object.
async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(serde_json::json!({}))))
}

/// Echo request headers as a JSON object. Repeated headers keep the last value.
async fn echo_headers(headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    Json(
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_serializes_with_camel_case_user_id() {
        let post = Post {
            id: 1,
            title: "Test".to_string(),
            body: "Body".to_string(),
            user_id: 7,
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Test");
        assert_eq!(json["userId"], 7);
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn create_post_ignores_client_id() {
        let input: CreatePost =
            serde_json::from_str(r#"{"id":55,"title":"foo","body":"bar","userId":1}"#).unwrap();
        assert_eq!(input.title, "foo");
        assert_eq!(input.user_id, 1);
    }

    #[test]
    fn create_post_rejects_missing_body() {
        let result: Result<CreatePost, _> = serde_json::from_str(r#"{"title":"foo","userId":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn next_id_follows_largest_existing() {
        let store = Store {
            posts: vec![Post {
                id: 100,
                title: String::new(),
                body: String::new(),
                user_id: 1,
            }],
        };
        assert_eq!(store.next_id(), 101);
        assert_eq!(Store::default().next_id(), 1);
    }
}
