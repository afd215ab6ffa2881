//! Domain DTOs for the posts API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates.

use serde::{Deserialize, Serialize};

/// A single post, either received from the API or built locally for
/// submission.
///
/// `id` is assigned by the server on creation. A locally built post leaves it
/// as `None`, and it is then omitted from the serialized JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    pub body: String,
    #[serde(rename = "userId")]
    pub user_id: u64,
}

impl Post {
    /// A post that has not been submitted yet.
    pub fn new(title: impl Into<String>, body: impl Into<String>, user_id: u64) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
            user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsubmitted_post_omits_id() {
        let json = serde_json::to_value(Post::new("foo", "bar", 1)).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["title"], "foo");
        assert_eq!(json["body"], "bar");
        assert_eq!(json["userId"], 1);
    }

    #[test]
    fn server_post_keeps_id() {
        let post: Post =
            serde_json::from_str(r#"{"id":101,"title":"foo","body":"bar","userId":1}"#).unwrap();
        assert_eq!(post.id, Some(101));
        assert_eq!(post.user_id, 1);
    }

    #[test]
    fn missing_user_id_is_rejected() {
        let result: Result<Post, _> = serde_json::from_str(r#"{"title":"t","body":"b"}"#);
        assert!(result.is_err());
    }
}
